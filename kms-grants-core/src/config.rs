//! Deployment descriptor loading
//!
//! Reads the parts of a `serverless.yml` that grant reconciliation needs:
//! `service`, `provider.stage`, `provider.region` and `custom.kmsGrants`.
//! Everything else in the file is ignored.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{GrantError, GrantResult};
use crate::types::{DeploymentContext, GrantDeclaration};

pub const DEFAULT_STAGE: &str = "dev";
pub const DEFAULT_REGION: &str = "us-east-1";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerlessDescriptor {
    #[serde(default)]
    service: Option<ServiceName>,
    #[serde(default)]
    provider: ProviderSection,
    #[serde(default)]
    custom: CustomSection,
}

/// `service` is either a plain name or a map carrying `name`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ServiceName {
    Name(String),
    Map { name: String },
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ProviderSection {
    #[serde(default)]
    stage: Option<String>,
    #[serde(default)]
    region: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CustomSection {
    #[serde(default, rename = "kmsGrants")]
    kms_grants: Option<KmsGrantsSection>,
}

/// `custom.kmsGrants` is a list of entries, or a single entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum KmsGrantsSection {
    Many(Vec<GrantEntry>),
    One(GrantEntry),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GrantEntry {
    #[serde(default)]
    kms_key_id: Option<String>,
    #[serde(default)]
    lambda_role_arn: Option<String>,
    #[serde(default)]
    lambda_role_name: Option<String>,
}

/// Command-line values that take precedence over the descriptor.
#[derive(Debug, Clone, Default)]
pub struct ContextOverrides {
    pub stage: Option<String>,
    pub region: Option<String>,
}

impl ServerlessDescriptor {
    pub fn from_path(path: &Path) -> GrantResult<Self> {
        let contents = fs::read_to_string(path).map_err(|source| GrantError::DescriptorRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> GrantResult<Self> {
        // An empty file deserializes as YAML null
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(contents)?)
    }

    /// The declared grants, in file order. A missing section yields none.
    pub fn declarations(&self) -> Vec<GrantDeclaration> {
        let entries = match &self.custom.kms_grants {
            None => return Vec::new(),
            Some(KmsGrantsSection::Many(entries)) => entries.clone(),
            Some(KmsGrantsSection::One(entry)) => vec![entry.clone()],
        };

        entries
            .into_iter()
            .map(|entry| {
                GrantDeclaration::from_fields(
                    entry.kms_key_id,
                    entry.lambda_role_arn,
                    entry.lambda_role_name,
                )
            })
            .collect()
    }

    /// Build the deployment context, applying overrides and the host's
    /// default stage and region.
    pub fn context(&self, overrides: &ContextOverrides) -> DeploymentContext {
        let service = self.service.as_ref().map(|s| match s {
            ServiceName::Name(name) | ServiceName::Map { name } => name.clone(),
        });

        let non_blank = |v: &Option<String>| v.clone().filter(|v| !v.trim().is_empty());
        let pick = |over: &Option<String>, file: &Option<String>, default: &str| {
            non_blank(over)
                .or_else(|| non_blank(file))
                .unwrap_or_else(|| default.to_string())
        };

        DeploymentContext {
            service,
            stage: Some(pick(&overrides.stage, &self.provider.stage, DEFAULT_STAGE)),
            region: Some(pick(&overrides.region, &self.provider.region, DEFAULT_REGION)),
        }
    }
}
