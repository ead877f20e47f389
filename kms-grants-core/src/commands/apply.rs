//! Apply logic: create missing grants

use crate::error::GrantResult;
use crate::types::{
    DeclarationReport, GrantDeclaration, GrantOutcome, ReconcileReport, GRANT_OPERATIONS,
};

impl super::service::GrantReconciler {
    /// Ensure every declared principal holds an Encrypt/Decrypt grant on its key.
    ///
    /// Declarations that are already satisfied cause no mutating call, so
    /// running `apply` twice creates each grant at most once.
    pub async fn apply(&self, declarations: &[GrantDeclaration]) -> GrantResult<ReconcileReport> {
        if declarations.is_empty() {
            log::info!("No KMS grants declared under custom.kmsGrants; nothing to apply");
            return Ok(ReconcileReport::default());
        }

        self.run_batch(declarations, move |index, declaration| {
            self.apply_one(index, declaration)
        })
        .await
    }

    async fn apply_one(
        &self,
        index: usize,
        declaration: &GrantDeclaration,
    ) -> GrantResult<DeclarationReport> {
        let result = self.find_grant(declaration).await?;

        let outcome = match &result.grant_id {
            Some(grant_id) => {
                log::info!("KMS grant already exists for {}", result.principal_arn);
                GrantOutcome::AlreadyPresent {
                    grant_id: grant_id.clone(),
                }
            }
            None => {
                log::info!("Creating KMS grant for {}", result.principal_arn);
                let grant_id = self
                    .kms
                    .create_grant(&result.key_arn, &result.principal_arn, &GRANT_OPERATIONS)
                    .await?;
                log::debug!("Created grant {grant_id} on {}", result.key_arn);
                GrantOutcome::Created { grant_id }
            }
        };

        Ok(DeclarationReport {
            index,
            result,
            outcome,
        })
    }
}
