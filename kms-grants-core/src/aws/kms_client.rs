//! AWS KMS client wrapper for grant operations

use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_kms::types::{GrantListEntry, GrantOperation as KmsGrantOperation};
use aws_sdk_kms::Client as KmsClient;
use tokio::sync::OnceCell;

use super::{classify_sdk_error, AwsSettings, SharedConfig};
use crate::error::{GrantError, GrantResult};
use crate::services::KeyManagementService;
use crate::types::{Grant, GrantOperation, GrantPage};

const KMS_NOT_FOUND: &[&str] = &["NotFoundException"];

pub struct AwsKmsClient {
    shared: Arc<SharedConfig>,
    client: OnceCell<KmsClient>,
}

impl AwsKmsClient {
    pub(crate) fn new(shared: Arc<SharedConfig>) -> Self {
        Self {
            shared,
            client: OnceCell::new(),
        }
    }

    pub fn settings(&self) -> &AwsSettings {
        self.shared.settings()
    }

    async fn client(&self) -> &KmsClient {
        self.client
            .get_or_init(|| async {
                let mut builder = aws_sdk_kms::config::Builder::from(self.shared.get().await);
                if let Some(endpoint) = self.shared.settings().kms_endpoint.as_deref() {
                    builder = builder.endpoint_url(endpoint);
                }
                KmsClient::from_conf(builder.build())
            })
            .await
    }
}

fn to_sdk_operation(op: GrantOperation) -> KmsGrantOperation {
    match op {
        GrantOperation::Encrypt => KmsGrantOperation::Encrypt,
        GrantOperation::Decrypt => KmsGrantOperation::Decrypt,
    }
}

fn to_grant(key_arn: &str, entry: &GrantListEntry) -> Grant {
    Grant {
        key_arn: entry.key_id().unwrap_or(key_arn).to_string(),
        grantee_principal: entry.grantee_principal().unwrap_or_default().to_string(),
        grant_id: entry.grant_id().unwrap_or_default().to_string(),
        operations: entry
            .operations()
            .iter()
            .map(|op| op.as_str().to_string())
            .collect(),
    }
}

#[async_trait]
impl KeyManagementService for AwsKmsClient {
    async fn describe_key(&self, key_id: &str) -> GrantResult<String> {
        let response = self
            .client()
            .await
            .describe_key()
            .key_id(key_id)
            .send()
            .await
            .map_err(|e| classify_sdk_error("DescribeKey", &format!("KMS key '{key_id}'"), KMS_NOT_FOUND, e))?;

        response
            .key_metadata()
            .and_then(|metadata| metadata.arn())
            .map(str::to_string)
            .ok_or_else(|| {
                GrantError::service("DescribeKey", format!("no key ARN returned for '{key_id}'"))
            })
    }

    async fn list_grants_page(
        &self,
        key_arn: &str,
        marker: Option<&str>,
    ) -> GrantResult<GrantPage> {
        let response = self
            .client()
            .await
            .list_grants()
            .key_id(key_arn)
            .set_marker(marker.map(str::to_string))
            .send()
            .await
            .map_err(|e| classify_sdk_error("ListGrants", &format!("KMS key '{key_arn}'"), KMS_NOT_FOUND, e))?;

        let grants = response
            .grants()
            .iter()
            .map(|entry| to_grant(key_arn, entry))
            .collect();

        let next_marker = if response.truncated() {
            response.next_marker().map(str::to_string)
        } else {
            None
        };

        Ok(GrantPage {
            grants,
            next_marker,
        })
    }

    async fn create_grant(
        &self,
        key_arn: &str,
        grantee_principal: &str,
        operations: &[GrantOperation],
    ) -> GrantResult<String> {
        let request = operations.iter().fold(
            self.client()
                .await
                .create_grant()
                .key_id(key_arn)
                .grantee_principal(grantee_principal),
            |request, op| request.operations(to_sdk_operation(*op)),
        );

        let response = request
            .send()
            .await
            .map_err(|e| classify_sdk_error("CreateGrant", &format!("KMS key '{key_arn}'"), KMS_NOT_FOUND, e))?;

        response
            .grant_id()
            .map(str::to_string)
            .ok_or_else(|| GrantError::service("CreateGrant", "response contained no grant id"))
    }

    async fn revoke_grant(&self, key_arn: &str, grant_id: &str) -> GrantResult<()> {
        self.client()
            .await
            .revoke_grant()
            .key_id(key_arn)
            .grant_id(grant_id)
            .send()
            .await
            .map_err(|e| {
                classify_sdk_error(
                    "RevokeGrant",
                    &format!("grant '{grant_id}' on KMS key '{key_arn}'"),
                    KMS_NOT_FOUND,
                    e,
                )
            })?;
        Ok(())
    }
}
