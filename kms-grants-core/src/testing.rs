//! In-memory service fakes for unit tests

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{GrantError, GrantResult};
use crate::services::{IdentityService, KeyManagementService};
use crate::types::{Grant, GrantOperation, GrantPage};

/// A recorded call against a fake service.
// Fields are only inspected through PartialEq in assertions.
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    DescribeKey(String),
    ListGrants {
        key_arn: String,
        marker: Option<String>,
    },
    CreateGrant {
        key_arn: String,
        grantee_principal: String,
        operations: Vec<GrantOperation>,
    },
    RevokeGrant {
        key_arn: String,
        grant_id: String,
    },
}

#[derive(Default)]
struct KmsState {
    /// key id or alias -> key ARN
    keys: HashMap<String, String>,
    /// key ARN -> grants in listing order
    grants: HashMap<String, Vec<Grant>>,
    next_grant: usize,
    calls: Vec<Call>,
}

/// Fake key-management service with paginated listings.
pub struct FakeKms {
    page_size: usize,
    /// Key ARNs whose `CreateGrant` fails with a service error
    failing_keys: Vec<String>,
    state: Mutex<KmsState>,
}

impl FakeKms {
    pub fn new() -> Self {
        Self {
            page_size: 100,
            failing_keys: Vec::new(),
            state: Mutex::new(KmsState::default()),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Register a key reachable by its ARN and by each alias.
    pub fn with_key(self, key_arn: &str, aliases: &[&str]) -> Self {
        {
            let mut state = self.state.lock().expect("fake state poisoned");
            state.keys.insert(key_arn.to_string(), key_arn.to_string());
            for alias in aliases {
                state.keys.insert((*alias).to_string(), key_arn.to_string());
            }
            state.grants.entry(key_arn.to_string()).or_default();
        }
        self
    }

    pub fn with_grant(self, key_arn: &str, grantee_principal: &str, grant_id: &str) -> Self {
        {
            let mut state = self.state.lock().expect("fake state poisoned");
            state.grants.entry(key_arn.to_string()).or_default().push(Grant {
                key_arn: key_arn.to_string(),
                grantee_principal: grantee_principal.to_string(),
                grant_id: grant_id.to_string(),
                operations: vec!["Encrypt".into(), "Decrypt".into()],
            });
        }
        self
    }

    pub fn failing_create_on(mut self, key_arn: &str) -> Self {
        self.failing_keys.push(key_arn.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().expect("fake state poisoned").calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().expect("fake state poisoned").calls.clear();
    }

    pub fn grants(&self, key_arn: &str) -> Vec<Grant> {
        self.state
            .lock()
            .expect("fake state poisoned")
            .grants
            .get(key_arn)
            .cloned()
            .unwrap_or_default()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }
}

#[async_trait]
impl KeyManagementService for FakeKms {
    async fn describe_key(&self, key_id: &str) -> GrantResult<String> {
        let mut state = self.state.lock().expect("fake state poisoned");
        state.calls.push(Call::DescribeKey(key_id.to_string()));
        state
            .keys
            .get(key_id)
            .cloned()
            .ok_or_else(|| GrantError::not_found(format!("KMS key '{key_id}'")))
    }

    async fn list_grants_page(
        &self,
        key_arn: &str,
        marker: Option<&str>,
    ) -> GrantResult<GrantPage> {
        let mut state = self.state.lock().expect("fake state poisoned");
        state.calls.push(Call::ListGrants {
            key_arn: key_arn.to_string(),
            marker: marker.map(str::to_string),
        });
        let all = state.grants.get(key_arn).cloned().unwrap_or_default();
        let start = marker.and_then(|m| m.parse::<usize>().ok()).unwrap_or(0);
        let end = (start + self.page_size).min(all.len());
        Ok(GrantPage {
            grants: all[start.min(end)..end].to_vec(),
            next_marker: (end < all.len()).then(|| end.to_string()),
        })
    }

    async fn create_grant(
        &self,
        key_arn: &str,
        grantee_principal: &str,
        operations: &[GrantOperation],
    ) -> GrantResult<String> {
        let mut state = self.state.lock().expect("fake state poisoned");
        state.calls.push(Call::CreateGrant {
            key_arn: key_arn.to_string(),
            grantee_principal: grantee_principal.to_string(),
            operations: operations.to_vec(),
        });
        if self.failing_keys.iter().any(|k| k == key_arn) {
            return Err(GrantError::service("CreateGrant", "AccessDeniedException"));
        }
        state.next_grant += 1;
        let grant_id = format!("grant-{}", state.next_grant);
        state.grants.entry(key_arn.to_string()).or_default().push(Grant {
            key_arn: key_arn.to_string(),
            grantee_principal: grantee_principal.to_string(),
            grant_id: grant_id.clone(),
            operations: operations.iter().map(|op| op.as_str().to_string()).collect(),
        });
        Ok(grant_id)
    }

    async fn revoke_grant(&self, key_arn: &str, grant_id: &str) -> GrantResult<()> {
        let mut state = self.state.lock().expect("fake state poisoned");
        state.calls.push(Call::RevokeGrant {
            key_arn: key_arn.to_string(),
            grant_id: grant_id.to_string(),
        });
        let grants = state.grants.entry(key_arn.to_string()).or_default();
        let before = grants.len();
        grants.retain(|g| g.grant_id != grant_id);
        if grants.len() == before {
            return Err(GrantError::not_found(format!("grant '{grant_id}'")));
        }
        Ok(())
    }
}

/// Fake identity service mapping role names to ARNs.
#[derive(Default)]
pub struct FakeIam {
    roles: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl FakeIam {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_role(mut self, role_name: &str, role_arn: &str) -> Self {
        self.roles.insert(role_name.to_string(), role_arn.to_string());
        self
    }

    pub fn lookups(&self) -> Vec<String> {
        self.calls.lock().expect("fake state poisoned").clone()
    }
}

#[async_trait]
impl IdentityService for FakeIam {
    async fn get_role_arn(&self, role_name: &str) -> GrantResult<String> {
        self.calls
            .lock()
            .expect("fake state poisoned")
            .push(role_name.to_string());
        self.roles
            .get(role_name)
            .cloned()
            .ok_or_else(|| GrantError::not_found(format!("IAM role '{role_name}'")))
    }
}
