//! Lifecycle hook table: maps deployment framework events onto grant operations.

use kms_grants_core::Operation;

/// Host commands and the lifecycle event each one fires.
pub const COMMANDS: [(&str, &str, &str); 2] = [
    (
        "createKmsGrant",
        "Creates a KMS grant for a lambda",
        "createGrant",
    ),
    (
        "revokeKmsGrant",
        "Revokes a KMS grant for a lambda",
        "revokeGrant",
    ),
];

/// Event name to operation bindings.
pub const HOOKS: [(&str, Operation); 4] = [
    ("createKmsGrant:createGrant", Operation::Apply),
    ("revokeKmsGrant:revokeGrant", Operation::Revoke),
    ("after:deploy:deploy", Operation::Apply),
    ("before:remove:remove", Operation::Revoke),
];

pub fn operation_for_event(event: &str) -> Option<Operation> {
    HOOKS
        .iter()
        .find(|(name, _)| *name == event.trim())
        .map(|(_, op)| *op)
}

pub fn describe(op: Operation) -> &'static str {
    match op {
        Operation::Apply => "apply",
        Operation::Revoke => "revoke",
    }
}
