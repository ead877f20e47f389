//! Principal ARN resolution for grant declarations
//!
//! Resolution order, first applicable wins:
//! 1. an explicit role ARN is returned unchanged without any lookup
//! 2. an explicit role name is looked up through the identity service
//! 3. otherwise the default role name `{service}-{stage}-{region}-lambdaRole`
//!    is derived from the deployment context and looked up the same way

use crate::aws::arn::is_arn;
use crate::error::{GrantError, GrantResult};
use crate::services::IdentityService;
use crate::types::{DeploymentContext, GrantDeclaration, PrincipalRef};

pub const DEFAULT_ROLE_SUFFIX: &str = "lambdaRole";

fn required<'a>(value: Option<&'a str>, what: &str) -> GrantResult<&'a str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| GrantError::configuration(format!("{what} is undefined in serverless.yaml")))
}

/// Derive the default role name from the deployment context.
pub fn default_role_name(context: &DeploymentContext) -> GrantResult<String> {
    let service = required(context.service.as_deref(), "Service")?;
    let stage = required(context.stage.as_deref(), "Stage")?;
    let region = required(context.region.as_deref(), "Region")?;
    Ok(format!("{service}-{stage}-{region}-{DEFAULT_ROLE_SUFFIX}"))
}

/// Resolve the principal ARN a declaration should be granted to.
///
/// Never cached: every call reflects the identity service's current state.
pub async fn resolve_principal(
    identity: &dyn IdentityService,
    declaration: &GrantDeclaration,
    context: &DeploymentContext,
) -> GrantResult<String> {
    match &declaration.principal {
        PrincipalRef::Arn(arn) => {
            if !is_arn(arn) {
                log::warn!("Declared role ARN '{arn}' does not look like an ARN; using it as-is");
            }
            Ok(arn.clone())
        }
        PrincipalRef::RoleName(name) => identity.get_role_arn(name).await,
        PrincipalRef::Default => {
            let role_name = default_role_name(context)?;
            log::info!(
                "Neither 'lambdaRoleArn' nor 'lambdaRoleName' defined, using default format for role name: <service>-<stage>-<region>-lambdaRole ({role_name})"
            );
            identity.get_role_arn(&role_name).await
        }
    }
}
