//! AWS SDK integration: KMS and IAM client wrappers, ARN helpers.

pub mod arn;
pub(crate) mod iam_client;
pub(crate) mod kms_client;

use std::env;
use std::sync::Arc;

use aws_config::retry::RetryConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_kms::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use tokio::sync::OnceCell;

use crate::error::GrantError;

pub use iam_client::AwsIamClient;
pub use kms_client::AwsKmsClient;

const KMS_ENDPOINT_ENV: &str = "KMS_GRANTS_KMS_ENDPOINT";
const IAM_ENDPOINT_ENV: &str = "KMS_GRANTS_IAM_ENDPOINT";
const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Settings used to build the AWS SDK configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwsSettings {
    pub region: Option<String>,
    pub profile: Option<String>,
    /// Total attempts per request under the SDK's standard retry strategy
    pub max_attempts: u32,
    pub kms_endpoint: Option<String>,
    pub iam_endpoint: Option<String>,
}

impl Default for AwsSettings {
    fn default() -> Self {
        Self {
            region: None,
            profile: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            kms_endpoint: None,
            iam_endpoint: None,
        }
    }
}

impl AwsSettings {
    /// Pick up endpoint overrides (e.g. local emulators) from the environment.
    pub fn with_endpoints_from_env(mut self) -> Self {
        let endpoint = |name: &str| env::var(name).ok().filter(|s| !s.trim().is_empty());
        self.kms_endpoint = self.kms_endpoint.or_else(|| endpoint(KMS_ENDPOINT_ENV));
        self.iam_endpoint = self.iam_endpoint.or_else(|| endpoint(IAM_ENDPOINT_ENV));
        self
    }
}

/// SDK configuration shared by the KMS and IAM clients, loaded on first use.
pub(crate) struct SharedConfig {
    settings: AwsSettings,
    config: OnceCell<SdkConfig>,
}

impl SharedConfig {
    pub(crate) fn new(settings: AwsSettings) -> Self {
        Self {
            settings,
            config: OnceCell::new(),
        }
    }

    pub(crate) fn settings(&self) -> &AwsSettings {
        &self.settings
    }

    pub(crate) async fn get(&self) -> &SdkConfig {
        self.config
            .get_or_init(|| load_sdk_config(&self.settings))
            .await
    }
}

async fn load_sdk_config(settings: &AwsSettings) -> SdkConfig {
    log::debug!(
        "Loading AWS configuration (region: {:?}, profile: {:?}, max attempts: {})",
        settings.region,
        settings.profile,
        settings.max_attempts
    );

    // Standard retry mode backs off on throttling and transient errors. Retries
    // re-send the same request, so find-before-act stays idempotent.
    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .retry_config(RetryConfig::standard().with_max_attempts(settings.max_attempts.max(1)));

    if let Some(region) = settings.region.clone() {
        loader = loader.region(Region::new(region));
    }
    if let Some(profile) = settings.profile.as_deref() {
        loader = loader.profile_name(profile);
    }

    loader.load().await
}

/// Build lazily-initialized KMS and IAM clients over one shared configuration.
pub fn aws_services(settings: AwsSettings) -> (Arc<AwsKmsClient>, Arc<AwsIamClient>) {
    let shared = Arc::new(SharedConfig::new(settings));
    (
        Arc::new(AwsKmsClient::new(Arc::clone(&shared))),
        Arc::new(AwsIamClient::new(shared)),
    )
}

/// Map an SDK error onto the crate's error kinds.
///
/// Service errors whose code is one of `not_found_codes` become
/// [`GrantError::NotFound`]; everything else is a [`GrantError::Service`].
pub(crate) fn classify_sdk_error<E, R>(
    operation: &'static str,
    target: &str,
    not_found_codes: &[&str],
    err: SdkError<E, R>,
) -> GrantError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    if let SdkError::ServiceError(context) = &err {
        if let Some(code) = context.err().code() {
            if not_found_codes.contains(&code) {
                return GrantError::not_found(target.to_string());
            }
        }
    }
    GrantError::service(operation, DisplayErrorContext(&err).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_use_three_attempts() {
        let settings = AwsSettings::default();
        assert_eq!(settings.max_attempts, 3);
        assert!(settings.region.is_none());
        assert!(settings.kms_endpoint.is_none());
    }

    #[test]
    fn test_explicit_endpoint_wins_over_environment() {
        let settings = AwsSettings {
            kms_endpoint: Some("http://localhost:4566".into()),
            ..AwsSettings::default()
        }
        .with_endpoints_from_env();
        assert_eq!(
            settings.kms_endpoint.as_deref(),
            Some("http://localhost:4566")
        );
    }

    #[test]
    fn test_aws_services_share_settings() {
        let settings = AwsSettings {
            region: Some("eu-west-1".into()),
            ..AwsSettings::default()
        };
        let (kms, iam) = aws_services(settings.clone());
        assert_eq!(kms.settings(), &settings);
        assert_eq!(iam.settings(), &settings);
    }

    #[test]
    fn test_missing_key_is_classified_as_not_found() {
        use aws_sdk_kms::error::ErrorMetadata;
        use aws_sdk_kms::operation::describe_key::DescribeKeyError;
        use aws_sdk_kms::types::error::NotFoundException;

        let err = DescribeKeyError::NotFoundException(
            NotFoundException::builder()
                .message("Alias alias/missing is not found.")
                .meta(ErrorMetadata::builder().code("NotFoundException").build())
                .build(),
        );
        let classified = classify_sdk_error(
            "DescribeKey",
            "KMS key 'alias/missing'",
            &["NotFoundException"],
            SdkError::service_error(err, ()),
        );

        match classified {
            GrantError::NotFound(target) => assert_eq!(target, "KMS key 'alias/missing'"),
            other => panic!("expected not found, got {other:?}"),
        }
    }

    #[test]
    fn test_throttling_is_classified_as_service_error() {
        use aws_sdk_kms::error::ErrorMetadata;
        use aws_sdk_kms::operation::describe_key::DescribeKeyError;

        let err = DescribeKeyError::generic(
            ErrorMetadata::builder()
                .code("ThrottlingException")
                .message("Rate exceeded")
                .build(),
        );
        let classified = classify_sdk_error(
            "DescribeKey",
            "KMS key 'alias/app'",
            &["NotFoundException"],
            SdkError::service_error(err, ()),
        );

        match classified {
            GrantError::Service { operation, message } => {
                assert_eq!(operation, "DescribeKey");
                assert!(message.contains("ThrottlingException"), "message was: {message}");
            }
            other => panic!("expected service error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_role_is_classified_as_not_found() {
        use aws_sdk_iam::error::ErrorMetadata;
        use aws_sdk_iam::operation::get_role::GetRoleError;
        use aws_sdk_iam::types::error::NoSuchEntityException;

        let err = GetRoleError::NoSuchEntityException(
            NoSuchEntityException::builder()
                .message("The role with name worker cannot be found.")
                .meta(ErrorMetadata::builder().code("NoSuchEntity").build())
                .build(),
        );
        let classified = classify_sdk_error(
            "GetRole",
            "IAM role 'worker'",
            &["NoSuchEntity"],
            SdkError::service_error(err, ()),
        );

        assert!(matches!(classified, GrantError::NotFound(_)));
    }
}
