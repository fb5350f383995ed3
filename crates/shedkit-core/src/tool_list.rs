use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::flatten::flatten_repo_info;
use crate::repository::{InstallDefaults, RepositorySpec, ToolEntry};

/// A tool list document: the repositories to install plus optional
/// file-wide defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolList {
    #[serde(default)]
    pub tools: Vec<ToolEntry>,
    pub tool_shed_url: Option<String>,
    pub install_tool_dependencies: Option<bool>,
    pub install_repository_dependencies: Option<bool>,
    pub install_resolver_dependencies: Option<bool>,
}

impl ToolList {
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read tool list: {}", path.display()))?;
        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        let parsed = if is_toml {
            Self::from_toml_str(&content)
        } else {
            Self::from_yaml_str(&content)
        };
        parsed.with_context(|| format!("invalid tool list: {}", path.display()))
    }

    pub fn from_yaml_str(input: &str) -> Result<Self> {
        serde_yaml::from_str(input).context("failed to parse YAML tool list")
    }

    pub fn from_toml_str(input: &str) -> Result<Self> {
        toml::from_str(input).context("failed to parse TOML tool list")
    }

    /// Overlays the values set in this file on top of `defaults`.
    pub fn apply_defaults(&self, mut defaults: InstallDefaults) -> InstallDefaults {
        if let Some(url) = &self.tool_shed_url {
            defaults.tool_shed_url = url.clone();
        }
        if let Some(value) = self.install_tool_dependencies {
            defaults.install_tool_dependencies = value;
        }
        if let Some(value) = self.install_repository_dependencies {
            defaults.install_repository_dependencies = value;
        }
        if let Some(value) = self.install_resolver_dependencies {
            defaults.install_resolver_dependencies = value;
        }
        defaults
    }

    pub fn flattened(&self) -> Vec<RepositorySpec> {
        flatten_repo_info(&self.tools)
    }
}
