//! Boundaries to the external key-management and identity services.
//!
//! The reconciler only talks to these traits. The AWS-backed implementations
//! live in [`crate::aws`]; tests substitute in-memory fakes.

use async_trait::async_trait;

use crate::error::GrantResult;
use crate::types::{GrantOperation, GrantPage};

#[async_trait]
pub trait KeyManagementService: Send + Sync {
    /// Resolve a key id, alias or ARN to the key's canonical ARN.
    ///
    /// Fails with [`GrantError::NotFound`](crate::GrantError::NotFound) for an unknown key.
    async fn describe_key(&self, key_id: &str) -> GrantResult<String>;

    /// Fetch one page of grants on a key, starting at `marker`.
    async fn list_grants_page(&self, key_arn: &str, marker: Option<&str>)
        -> GrantResult<GrantPage>;

    /// Create a grant and return its id.
    async fn create_grant(
        &self,
        key_arn: &str,
        grantee_principal: &str,
        operations: &[GrantOperation],
    ) -> GrantResult<String>;

    async fn revoke_grant(&self, key_arn: &str, grant_id: &str) -> GrantResult<()>;
}

#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Look up a role by name and return its ARN.
    ///
    /// Fails with [`GrantError::NotFound`](crate::GrantError::NotFound) for an unknown role.
    async fn get_role_arn(&self, role_name: &str) -> GrantResult<String>;
}
