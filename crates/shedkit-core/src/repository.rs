use serde::{Deserialize, Serialize};

pub const DEFAULT_TOOL_SHED_URL: &str = "https://toolshed.g2.bx.psu.edu/";

/// One entry of a tool list as written by a user. A single entry may pin
/// several revisions of the same repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolEntry {
    pub name: Option<String>,
    pub owner: Option<String>,
    pub changeset_revision: Option<String>,
    pub revisions: Option<Vec<String>>,
    pub tool_panel_section_id: Option<String>,
    pub tool_panel_section_label: Option<String>,
    pub tool_shed_url: Option<String>,
    pub install_repository_dependencies: Option<bool>,
    pub install_resolver_dependencies: Option<bool>,
    pub install_tool_dependencies: Option<bool>,
}

/// A single install request: at most one revision, nothing resolved yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changeset_revision: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_panel_section_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_panel_section_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_shed_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_repository_dependencies: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_resolver_dependencies: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_tool_dependencies: Option<bool>,
}

/// A repository ready to be handed to an installer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub owner: String,
    pub changeset_revision: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_panel_section_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_panel_section_label: Option<String>,
    pub tool_shed_url: String,
    pub install_repository_dependencies: bool,
    pub install_resolver_dependencies: bool,
    pub install_tool_dependencies: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallDefaults {
    pub tool_shed_url: String,
    pub require_tool_panel_info: bool,
    pub install_tool_dependencies: bool,
    pub install_repository_dependencies: bool,
    pub install_resolver_dependencies: bool,
    pub force_latest_revision: bool,
}

impl Default for InstallDefaults {
    fn default() -> Self {
        Self {
            tool_shed_url: DEFAULT_TOOL_SHED_URL.to_string(),
            require_tool_panel_info: true,
            install_tool_dependencies: false,
            install_repository_dependencies: true,
            install_resolver_dependencies: true,
            force_latest_revision: false,
        }
    }
}

impl RepositorySpec {
    pub fn display_name(&self) -> String {
        let owner = self.owner.as_deref().unwrap_or("<missing owner>");
        let name = self.name.as_deref().unwrap_or("<missing name>");
        match &self.changeset_revision {
            Some(revision) => format!("{owner}/{name}@{revision}"),
            None => format!("{owner}/{name}"),
        }
    }
}
