use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use shedkit_core::InstallDefaults;
use shedkit_toolshed::DEFAULT_REQUEST_TIMEOUT;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ShedkitConfig {
    #[serde(default)]
    pub(crate) install: InstallConfig,
    pub(crate) request_timeout_secs: Option<u64>,
}

/// The `[install]` table. Only the keys that are present override the
/// built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct InstallConfig {
    pub(crate) tool_shed_url: Option<String>,
    pub(crate) require_tool_panel_info: Option<bool>,
    pub(crate) install_tool_dependencies: Option<bool>,
    pub(crate) install_repository_dependencies: Option<bool>,
    pub(crate) install_resolver_dependencies: Option<bool>,
}

impl ShedkitConfig {
    pub(crate) fn from_toml_str(input: &str) -> Result<Self> {
        toml::from_str(input).context("failed to parse shedkit config")
    }

    pub(crate) fn install_defaults(&self) -> InstallDefaults {
        let mut defaults = InstallDefaults::default();
        let install = &self.install;
        if let Some(url) = &install.tool_shed_url {
            defaults.tool_shed_url = url.clone();
        }
        if let Some(value) = install.require_tool_panel_info {
            defaults.require_tool_panel_info = value;
        }
        if let Some(value) = install.install_tool_dependencies {
            defaults.install_tool_dependencies = value;
        }
        if let Some(value) = install.install_repository_dependencies {
            defaults.install_repository_dependencies = value;
        }
        if let Some(value) = install.install_resolver_dependencies {
            defaults.install_resolver_dependencies = value;
        }
        defaults
    }

    pub(crate) fn request_timeout(&self) -> Duration {
        self.request_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT)
    }
}

/// An explicit path must exist; the default location is optional.
pub(crate) fn load_config(explicit: Option<&Path>) -> Result<ShedkitConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(ShedkitConfig::default()),
        },
    };

    tracing::debug!(path = %path.display(), "loading config");
    let content = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    ShedkitConfig::from_toml_str(&content)
        .with_context(|| format!("invalid config: {}", path.display()))
}

fn default_config_path() -> Option<PathBuf> {
    config_path_from_env(
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

pub(crate) fn config_path_from_env(
    xdg_config_home: Option<PathBuf>,
    home: Option<PathBuf>,
) -> Option<PathBuf> {
    let base = xdg_config_home
        .filter(|dir| !dir.as_os_str().is_empty())
        .or_else(|| home.map(|home| home.join(".config")))?;
    Some(base.join("shedkit").join("config.toml"))
}
