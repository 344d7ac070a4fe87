//! Generates missing thumbnails for already-stored image originals.

use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use backend::{backfill, media_storage::MediaStorage, types::Environment};

#[derive(Debug, Parser)]
#[command(about = "Generate missing thumbnails for stored image assets")]
struct Args {
    /// Restrict the sweep to keys under this prefix
    #[arg(long, default_value = "")]
    prefix: String,

    /// Report what would be generated without writing anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args = Args::parse();
    let environment = Environment::from_env();

    let bucket = environment.s3_bucket();
    let s3_client = Arc::new(S3Client::from_conf(environment.s3_client_config().await));
    let store = Arc::new(MediaStorage::new(s3_client, bucket));

    let report = backfill::run(store, &args.prefix, args.dry_run).await?;
    tracing::info!(
        scanned = report.scanned,
        generated = report.generated,
        skipped = report.skipped,
        failed = report.failed,
        dry_run = args.dry_run,
        "backfill sweep finished"
    );

    anyhow::ensure!(
        report.failed == 0,
        "{} keys failed during the sweep",
        report.failed
    );
    Ok(())
}
