//! Revoke logic: remove declared grants

use super::find::first_grant_for;
use crate::error::{GrantError, GrantResult};
use crate::types::{DeclarationReport, GrantDeclaration, GrantOutcome, ReconcileReport};

impl super::service::GrantReconciler {
    /// Revoke every grant matching each declaration.
    ///
    /// A principal can hold more than one grant on a key (e.g. after a
    /// concurrent apply), so revocation repeats until no match is left.
    /// Declarations without a matching grant are skipped, which makes revoke
    /// safe on partially applied or already removed deployments.
    pub async fn revoke(&self, declarations: &[GrantDeclaration]) -> GrantResult<ReconcileReport> {
        if declarations.is_empty() {
            log::info!("No KMS grants declared under custom.kmsGrants; nothing to revoke");
            return Ok(ReconcileReport::default());
        }

        self.run_batch(declarations, move |index, declaration| {
            self.revoke_one(index, declaration)
        })
        .await
    }

    async fn revoke_one(
        &self,
        index: usize,
        declaration: &GrantDeclaration,
    ) -> GrantResult<DeclarationReport> {
        let result = self.find_grant(declaration).await?;

        let outcome = match &result.grant_id {
            Some(first) => {
                let mut grant_ids: Vec<String> = Vec::new();
                let mut next = Some(first.clone());

                while let Some(grant_id) = next {
                    if grant_ids.contains(&grant_id) {
                        return Err(GrantError::service(
                            "RevokeGrant",
                            format!("grant '{grant_id}' still listed after revocation"),
                        ));
                    }
                    log::info!("Revoking KMS grant for {}", result.principal_arn);
                    self.kms.revoke_grant(&result.key_arn, &grant_id).await?;
                    grant_ids.push(grant_id);
                    next = first_grant_for(self.kms.as_ref(), &result.key_arn, &result.principal_arn)
                        .await?;
                }

                GrantOutcome::Revoked { grant_ids }
            }
            None => {
                log::info!("No KMS grant found for {}.", result.principal_arn);
                GrantOutcome::AlreadyAbsent
            }
        };

        Ok(DeclarationReport {
            index,
            result,
            outcome,
        })
    }
}
