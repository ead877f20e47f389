//! Grant lookup shared by apply, revoke and plan

use std::collections::HashSet;

use crate::error::{GrantError, GrantResult};
use crate::resolver::resolve_principal;
use crate::services::KeyManagementService;
use crate::types::{Grant, GrantDeclaration, ReconciliationResult};

impl super::service::GrantReconciler {
    /// Find the grant authorizing a declaration's principal on its key.
    ///
    /// Resolves the principal, canonicalizes the key to its ARN, drains the
    /// key's grant listing and returns the first grant whose grantee matches.
    pub async fn find_grant(
        &self,
        declaration: &GrantDeclaration,
    ) -> GrantResult<ReconciliationResult> {
        let key_id = declaration.key_id.trim();
        if key_id.is_empty() {
            return Err(GrantError::configuration("No kms key id given."));
        }

        let principal_arn =
            resolve_principal(self.identity.as_ref(), declaration, &self.context).await?;

        let key_arn = self.kms.describe_key(key_id).await?;
        let grant_id = first_grant_for(self.kms.as_ref(), &key_arn, &principal_arn).await?;

        Ok(ReconciliationResult {
            key_arn,
            principal_arn,
            grant_id,
        })
    }
}

/// Id of the first grant on `key_arn` whose grantee is `principal_arn`.
pub(crate) async fn first_grant_for(
    kms: &dyn KeyManagementService,
    key_arn: &str,
    principal_arn: &str,
) -> GrantResult<Option<String>> {
    let grants = list_all_grants(kms, key_arn).await?;
    Ok(grants
        .into_iter()
        .find(|grant| grant.grantee_principal == principal_arn)
        .map(|grant| grant.grant_id))
}

/// Follow the listing's markers until every page has been read.
pub(crate) async fn list_all_grants(
    kms: &dyn KeyManagementService,
    key_arn: &str,
) -> GrantResult<Vec<Grant>> {
    let mut grants = Vec::new();
    let mut marker: Option<String> = None;
    let mut seen = HashSet::new();

    loop {
        let page = kms.list_grants_page(key_arn, marker.as_deref()).await?;
        grants.extend(page.grants);

        match page.next_marker {
            // A marker seen before would cycle forever.
            Some(next) if !seen.insert(next.clone()) => {
                return Err(GrantError::service(
                    "ListGrants",
                    format!("pagination marker '{next}' repeated for key '{key_arn}'"),
                ));
            }
            Some(next) => marker = Some(next),
            None => break,
        }
    }

    log::debug!("Found {} grant(s) on {key_arn}", grants.len());
    Ok(grants)
}
