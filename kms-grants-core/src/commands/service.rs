//! Grant Reconciler Service Layer
//!
//! This module provides the main service interface for grant reconciliation.
//! The service holds the key-management and identity service handles plus the
//! deployment context, and provides the high-level operations (plan, apply,
//! revoke) that host adapters bind to their own triggers.

use std::future::Future;
use std::sync::Arc;

use crate::aws::{aws_services, AwsSettings};
use crate::error::{DeclarationFailure, GrantError, GrantResult};
use crate::services::{IdentityService, KeyManagementService};
use crate::types::{
    DeclarationReport, DeploymentContext, FailurePolicy, GrantDeclaration, ReconcileReport,
};

/// Main service struct that reconciles declared grants against KMS.
///
/// Declarations are processed one at a time, in order. Nothing here guards
/// against another writer changing the same key's grants between the lookup
/// and the create/revoke call: KMS has no conditional grant operations.
pub struct GrantReconciler {
    pub(crate) kms: Arc<dyn KeyManagementService>,
    pub(crate) identity: Arc<dyn IdentityService>,
    pub(crate) context: DeploymentContext,
    pub(crate) failure_policy: FailurePolicy,
}

impl GrantReconciler {
    pub fn new(
        kms: Arc<dyn KeyManagementService>,
        identity: Arc<dyn IdentityService>,
        context: DeploymentContext,
    ) -> Self {
        Self {
            kms,
            identity,
            context,
            failure_policy: FailurePolicy::default(),
        }
    }

    /// Create a service backed by AWS KMS and IAM.
    ///
    /// The SDK configuration and clients are built on first use, so operations
    /// that turn out to have nothing to do never touch AWS.
    pub fn from_aws(settings: AwsSettings, context: DeploymentContext) -> Self {
        let (kms, iam) = aws_services(settings);
        Self::new(kms, iam, context)
    }

    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    pub fn context(&self) -> &DeploymentContext {
        &self.context
    }

    /// Run `reconcile_one` over every declaration under the configured failure policy.
    pub(crate) async fn run_batch<'a, F, Fut>(
        &'a self,
        declarations: &'a [GrantDeclaration],
        mut reconcile_one: F,
    ) -> GrantResult<ReconcileReport>
    where
        F: FnMut(usize, &'a GrantDeclaration) -> Fut,
        Fut: Future<Output = GrantResult<DeclarationReport>>,
    {
        let mut report = ReconcileReport::default();
        let mut failures = Vec::new();

        for (index, declaration) in declarations.iter().enumerate() {
            match reconcile_one(index, declaration).await {
                Ok(entry) => report.entries.push(entry),
                Err(error) => match self.failure_policy {
                    FailurePolicy::HaltOnError => return Err(error),
                    FailurePolicy::ContinueOnError => {
                        log::warn!(
                            "Grant declaration {index} (key '{}') failed: {error}",
                            declaration.key_id
                        );
                        failures.push(DeclarationFailure {
                            index,
                            key_id: declaration.key_id.clone(),
                            error,
                        });
                    }
                },
            }
        }

        if failures.is_empty() {
            Ok(report)
        } else {
            Err(GrantError::Batch {
                total: declarations.len(),
                failures,
                completed: report,
            })
        }
    }
}
