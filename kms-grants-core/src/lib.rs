//! This crate provides the core business logic for KMS grant reconciliation:
//! - Principal ARN resolution (explicit ARN, role name, or derived default role)
//! - Grant lookup over a key's full grant listing
//! - Idempotent apply (create missing grants) and revoke (remove matching grants)
//! - Deployment descriptor loading (`custom.kmsGrants`)
//!

pub mod aws;
pub mod commands;
pub mod config;
mod error;
pub mod resolver;
mod services;
#[cfg(test)]
mod testing;
mod types;

// Re-exports for a small, focused public API
pub use aws::{AwsIamClient, AwsKmsClient, AwsSettings};
pub use commands::GrantReconciler;
pub use config::{ContextOverrides, ServerlessDescriptor};
pub use error::{DeclarationFailure, GrantError, GrantResult};
pub use resolver::{default_role_name, resolve_principal};
pub use services::{IdentityService, KeyManagementService};
pub use types::{
    DeclarationReport, DeploymentContext, FailurePolicy, Grant, GrantDeclaration, GrantOperation,
    GrantOutcome, GrantPage, Operation, PrincipalRef, ReconcileReport, ReconciliationResult,
    GRANT_OPERATIONS,
};
