//! Read-only planning: report what apply/revoke would act on

use crate::error::GrantResult;
use crate::types::{GrantDeclaration, ReconciliationResult};

impl super::service::GrantReconciler {
    /// Look up every declaration without changing any grant.
    ///
    /// Stops at the first failing declaration regardless of the failure policy.
    pub async fn plan(
        &self,
        declarations: &[GrantDeclaration],
    ) -> GrantResult<Vec<ReconciliationResult>> {
        let mut results = Vec::with_capacity(declarations.len());
        for declaration in declarations {
            results.push(self.find_grant(declaration).await?);
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::commands::GrantReconciler;
    use crate::testing::{Call, FakeIam, FakeKms};
    use crate::types::{DeploymentContext, GrantDeclaration, PrincipalRef};

    const K1: &str = "arn:aws:kms:us-east-1:123456789012:key/k1";
    const P2: &str = "arn:aws:iam::123456789012:role/p2";
    const P9: &str = "arn:aws:iam::123456789012:role/p9";

    #[tokio::test]
    async fn test_plan_reports_without_mutating() {
        let kms = Arc::new(FakeKms::new().with_key(K1, &[]).with_grant(K1, P9, "G1"));
        let service =
            GrantReconciler::new(kms.clone(), Arc::new(FakeIam::new()), DeploymentContext::default());

        let results = service
            .plan(&[
                GrantDeclaration::new(K1, PrincipalRef::Arn(P9.into())),
                GrantDeclaration::new(K1, PrincipalRef::Arn(P2.into())),
            ])
            .await
            .expect("plan should succeed");

        assert_eq!(results[0].grant_id.as_deref(), Some("G1"));
        assert_eq!(results[1].grant_id, None);
        assert_eq!(
            kms.count(|c| matches!(c, Call::CreateGrant { .. } | Call::RevokeGrant { .. })),
            0
        );
    }
}
