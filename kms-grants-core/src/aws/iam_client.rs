//! AWS IAM client wrapper for role lookups

use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_iam::Client as IamClient;
use tokio::sync::OnceCell;

use super::{classify_sdk_error, AwsSettings, SharedConfig};
use crate::error::{GrantError, GrantResult};
use crate::services::IdentityService;

const IAM_NOT_FOUND: &[&str] = &["NoSuchEntity"];

pub struct AwsIamClient {
    shared: Arc<SharedConfig>,
    client: OnceCell<IamClient>,
}

impl AwsIamClient {
    pub(crate) fn new(shared: Arc<SharedConfig>) -> Self {
        Self {
            shared,
            client: OnceCell::new(),
        }
    }

    pub fn settings(&self) -> &AwsSettings {
        self.shared.settings()
    }

    async fn client(&self) -> &IamClient {
        self.client
            .get_or_init(|| async {
                let mut builder = aws_sdk_iam::config::Builder::from(self.shared.get().await);
                if let Some(endpoint) = self.shared.settings().iam_endpoint.as_deref() {
                    builder = builder.endpoint_url(endpoint);
                }
                IamClient::from_conf(builder.build())
            })
            .await
    }
}

#[async_trait]
impl IdentityService for AwsIamClient {
    async fn get_role_arn(&self, role_name: &str) -> GrantResult<String> {
        let response = self
            .client()
            .await
            .get_role()
            .role_name(role_name)
            .send()
            .await
            .map_err(|e| {
                classify_sdk_error("GetRole", &format!("IAM role '{role_name}'"), IAM_NOT_FOUND, e)
            })?;

        response
            .role()
            .map(|role| role.arn().to_string())
            .ok_or_else(|| GrantError::not_found(format!("IAM role '{role_name}'")))
    }
}
