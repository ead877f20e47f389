//! Core data types: declarations, deployment context, grants and reconciliation outcomes

use serde::Serialize;

/// How a declaration names the principal to authorize.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PrincipalRef {
    /// A fully qualified role ARN, used as-is
    Arn(String),
    /// A role name looked up through the identity service
    RoleName(String),
    /// Nothing declared: derive `{service}-{stage}-{region}-lambdaRole`
    #[default]
    Default,
}

/// One desired (key, principal) authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantDeclaration {
    /// Key id, alias or ARN. Empty means the declaration is misconfigured.
    pub key_id: String,
    pub principal: PrincipalRef,
}

impl GrantDeclaration {
    pub fn new(key_id: impl Into<String>, principal: PrincipalRef) -> Self {
        Self {
            key_id: key_id.into(),
            principal,
        }
    }

    /// Build a declaration from the optional descriptor fields.
    ///
    /// An ARN takes precedence over a role name when both are present. Blank
    /// values are treated as absent.
    pub fn from_fields(
        key_id: Option<String>,
        role_arn: Option<String>,
        role_name: Option<String>,
    ) -> Self {
        let non_blank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        let principal = match (non_blank(role_arn), non_blank(role_name)) {
            (Some(arn), _) => PrincipalRef::Arn(arn),
            (None, Some(name)) => PrincipalRef::RoleName(name),
            (None, None) => PrincipalRef::Default,
        };

        Self {
            key_id: key_id.unwrap_or_default(),
            principal,
        }
    }
}

/// Deployment values used to derive the default role name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentContext {
    pub service: Option<String>,
    pub stage: Option<String>,
    pub region: Option<String>,
}

/// Operations a grant authorizes. Grants created here always carry
/// [`GRANT_OPERATIONS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GrantOperation {
    Encrypt,
    Decrypt,
}

impl GrantOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Encrypt => "Encrypt",
            Self::Decrypt => "Decrypt",
        }
    }
}

pub const GRANT_OPERATIONS: [GrantOperation; 2] = [GrantOperation::Encrypt, GrantOperation::Decrypt];

/// A grant as reported by the key-management service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    pub key_arn: String,
    pub grantee_principal: String,
    pub grant_id: String,
    pub operations: Vec<String>,
}

/// One page of a grant listing.
#[derive(Debug, Clone, Default)]
pub struct GrantPage {
    pub grants: Vec<Grant>,
    /// Marker for the next page, `None` once the listing is exhausted
    pub next_marker: Option<String>,
}

/// The lookup both `apply` and `revoke` act on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationResult {
    pub key_arn: String,
    pub principal_arn: String,
    pub grant_id: Option<String>,
}

/// The two reconciling operations exposed to hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Apply,
    Revoke,
}

/// What a reconciling operation did for one declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantOutcome {
    Created { grant_id: String },
    AlreadyPresent { grant_id: String },
    /// Every grant revoked for the principal, in revocation order
    Revoked { grant_ids: Vec<String> },
    AlreadyAbsent,
}

impl GrantOutcome {
    /// Whether the outcome required a mutating call.
    pub fn changed(&self) -> bool {
        matches!(self, Self::Created { .. } | Self::Revoked { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationReport {
    pub index: usize,
    pub result: ReconciliationResult,
    pub outcome: GrantOutcome,
}

/// Per-declaration outcomes of an `apply` or `revoke` call, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub entries: Vec<DeclarationReport>,
}

impl ReconcileReport {
    pub fn changed_count(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.changed()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// What to do with the rest of a batch once a declaration fails.
///
/// Neither policy rolls back declarations that already succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop at the first failing declaration and return its error.
    #[default]
    HaltOnError,
    /// Attempt every declaration, then report all failures together.
    ContinueOnError,
}
