//! Error types for grant reconciliation

use std::path::PathBuf;

use thiserror::Error;

use crate::types::ReconcileReport;

/// Result alias used throughout the crate
pub type GrantResult<T> = Result<T, GrantError>;

/// Errors raised while resolving principals or reconciling grants.
#[derive(Debug, Error)]
pub enum GrantError {
    /// A required declaration or deployment context field is missing.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The referenced key or role does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Transport, throttling or permission failure from an external service.
    #[error("{operation} failed: {message}")]
    Service {
        operation: &'static str,
        message: String,
    },

    #[error("Failed to read deployment descriptor {}: {source}", .path.display())]
    DescriptorRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid deployment descriptor: {0}")]
    DescriptorParse(#[from] serde_yaml::Error),

    /// One or more declarations failed while the batch continued past errors.
    #[error("{} of {total} grant declarations failed: {}", .failures.len(), summarize(.failures))]
    Batch {
        total: usize,
        failures: Vec<DeclarationFailure>,
        /// Declarations that were reconciled successfully before and after the failures.
        completed: ReconcileReport,
    },
}

/// A single failed declaration inside a [`GrantError::Batch`].
#[derive(Debug)]
pub struct DeclarationFailure {
    pub index: usize,
    pub key_id: String,
    pub error: GrantError,
}

fn summarize(failures: &[DeclarationFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("[{}] key '{}': {}", f.index, f.key_id, f.error))
        .collect::<Vec<_>>()
        .join("; ")
}

impl GrantError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn service(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Service {
            operation,
            message: message.into(),
        }
    }
}
