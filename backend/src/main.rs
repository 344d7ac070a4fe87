use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;

use backend::{media_storage::MediaStorage, server, state::AppState, types::Environment};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let environment = Environment::from_env();

    // JSON logs for staging/production, regular format for development
    match environment {
        Environment::Production | Environment::Staging => {
            fmt()
                .json()
                .with_env_filter(EnvFilter::from_default_env())
                .init();
        }
        Environment::Development { .. } => {
            fmt().with_env_filter(EnvFilter::from_default_env()).init();
        }
    }

    let bucket = environment.s3_bucket();
    let s3_client = Arc::new(S3Client::from_conf(environment.s3_client_config().await));
    let media_storage = Arc::new(MediaStorage::new(s3_client, bucket.clone()));

    server::start(AppState::new(
        media_storage,
        bucket,
        environment.signed_url_ttl_secs(),
    ))
    .await
}
