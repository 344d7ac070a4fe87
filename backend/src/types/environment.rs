//! Environment configuration for different deployment stages

use std::env;
use std::time::Duration;

use aws_config::{retry::RetryConfig, timeout::TimeoutConfig, BehaviorVersion};

/// Default TTL for signed URLs, one hour.
const DEFAULT_SIGNED_URL_TTL_SECS: u64 = 3600;

/// Application environment configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    /// Production environment
    Production,
    /// Staging environment
    Staging,
    /// Development environment (uses `LocalStack`)
    Development {
        /// Optional override for signed URL expiry in seconds
        signed_url_ttl_override: Option<u64>,
    },
}

impl Environment {
    /// Creates an Environment from the `APP_ENV` environment variable
    ///
    /// # Panics
    ///
    /// Panics if `APP_ENV` contains an invalid value
    #[must_use]
    pub fn from_env() -> Self {
        let env = env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .trim()
            .to_lowercase();

        match env.as_str() {
            "production" => Self::Production,
            "staging" => Self::Staging,
            "development" => {
                let signed_url_ttl_override = env::var("SIGNED_URL_TTL_SECS")
                    .ok()
                    .and_then(|val| val.parse::<u64>().ok());

                Self::Development {
                    signed_url_ttl_override,
                }
            }
            _ => panic!("Invalid environment: {env}"),
        }
    }

    /// Returns the S3 bucket name for the environment
    ///
    /// # Panics
    ///
    /// Panics if the `S3_BUCKET_NAME` environment variable is not set
    /// outside development
    #[must_use]
    pub fn s3_bucket(&self) -> String {
        match self {
            Self::Production | Self::Staging => {
                env::var("S3_BUCKET_NAME").expect("S3_BUCKET_NAME environment variable is not set")
            }
            Self::Development { .. } => env::var("S3_BUCKET_NAME")
                .unwrap_or_else(|_| "campus-directory-media".to_string()),
        }
    }

    /// Returns the endpoint URL to use for AWS services
    #[must_use]
    pub fn override_aws_endpoint_url(&self) -> Option<String> {
        match self {
            // Regular AWS endpoints for production and staging
            Self::Production | Self::Staging => None,
            // LocalStack endpoint for development
            Self::Development { .. } => Some(
                env::var("S3_ENDPOINT_URL")
                    .unwrap_or_else(|_| "http://localhost:4566".to_string()),
            ),
        }
    }

    /// AWS configuration with retry and timeout settings
    pub async fn aws_config(&self) -> aws_config::SdkConfig {
        let retry_config = RetryConfig::standard()
            .with_max_attempts(3)
            .with_initial_backoff(Duration::from_millis(50));

        let timeout_config = TimeoutConfig::builder()
            .operation_timeout(Duration::from_secs(30))
            .build();

        let mut config_builder = aws_config::load_defaults(BehaviorVersion::latest())
            .await
            .to_builder()
            .retry_config(retry_config)
            .timeout_config(timeout_config);

        if let Some(endpoint_url) = self.override_aws_endpoint_url() {
            config_builder = config_builder.endpoint_url(endpoint_url);
        }

        config_builder.build()
    }

    /// AWS S3 service configuration
    pub async fn s3_client_config(&self) -> aws_sdk_s3::Config {
        let aws_config = self.aws_config().await;
        let s3_config: aws_sdk_s3::Config = (&aws_config).into();
        let mut builder = s3_config.to_builder();

        // Override "force path style" to true for compatibility with LocalStack
        // https://github.com/awslabs/aws-sdk-rust/discussions/874
        if matches!(self, Self::Development { .. }) {
            builder.set_force_path_style(Some(true));
        }

        builder.build()
    }

    /// Signed URL expiry time in seconds
    #[must_use]
    pub fn signed_url_ttl_secs(&self) -> u64 {
        match self {
            Self::Production | Self::Staging => DEFAULT_SIGNED_URL_TTL_SECS,
            Self::Development {
                signed_url_ttl_override,
            } => signed_url_ttl_override.unwrap_or(DEFAULT_SIGNED_URL_TTL_SECS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_environment_from_env() {
        // Test development (default)
        env::remove_var("APP_ENV");
        env::remove_var("SIGNED_URL_TTL_SECS");
        assert_eq!(
            Environment::from_env(),
            Environment::Development {
                signed_url_ttl_override: None
            }
        );

        // Test explicit development
        env::set_var("APP_ENV", "development");
        assert_eq!(
            Environment::from_env(),
            Environment::Development {
                signed_url_ttl_override: None
            }
        );

        // Test staging
        env::set_var("APP_ENV", "staging");
        assert_eq!(Environment::from_env(), Environment::Staging);

        // Test production
        env::set_var("APP_ENV", "production");
        assert_eq!(Environment::from_env(), Environment::Production);

        env::remove_var("APP_ENV");
    }

    #[test]
    #[serial]
    #[should_panic(expected = "Invalid environment: invalid")]
    fn test_invalid_environment() {
        env::set_var("APP_ENV", "invalid");
        let _ = Environment::from_env();
    }

    #[test]
    #[serial]
    fn test_signed_url_ttl_secs() {
        env::set_var("APP_ENV", "development");
        env::set_var("SIGNED_URL_TTL_SECS", "120");
        assert_eq!(Environment::from_env().signed_url_ttl_secs(), 120);

        env::remove_var("SIGNED_URL_TTL_SECS");
        assert_eq!(Environment::from_env().signed_url_ttl_secs(), 3600);

        env::set_var("APP_ENV", "production");
        env::set_var("S3_BUCKET_NAME", "prod-media");
        assert_eq!(Environment::from_env().signed_url_ttl_secs(), 3600);

        env::remove_var("APP_ENV");
        env::remove_var("S3_BUCKET_NAME");
    }

    #[test]
    #[serial]
    fn test_s3_bucket_defaults_in_development() {
        env::set_var("APP_ENV", "development");
        env::remove_var("S3_BUCKET_NAME");
        assert_eq!(Environment::from_env().s3_bucket(), "campus-directory-media");

        env::set_var("S3_BUCKET_NAME", "custom-media");
        assert_eq!(Environment::from_env().s3_bucket(), "custom-media");

        env::remove_var("APP_ENV");
        env::remove_var("S3_BUCKET_NAME");
    }
}
