use anyhow::{anyhow, Context, Result};

use crate::repository::{InstallDefaults, Repository, RepositorySpec};
use crate::resolve::{resolve_changeset_revision, RevisionCatalog};

/// Fills every field an installer needs, validating panel placement and
/// resolving the changeset revision through `catalog` when required.
pub fn complete_repo_information<C>(
    spec: &RepositorySpec,
    defaults: &InstallDefaults,
    catalog: &C,
) -> Result<Repository>
where
    C: RevisionCatalog + ?Sized,
{
    let name = required_field(spec.name.as_deref(), "name", spec)?;
    let owner = required_field(spec.owner.as_deref(), "owner", spec)?;

    if defaults.require_tool_panel_info
        && spec.tool_panel_section_id.is_none()
        && spec.tool_panel_section_label.is_none()
        && !name.contains("data_manager")
    {
        return Err(anyhow!(
            "Either tool_panel_section_id or tool_panel_section_label must be defined for tool '{name}'"
        ));
    }

    let tool_shed_url = format_tool_shed_url(
        spec.tool_shed_url
            .as_deref()
            .unwrap_or(&defaults.tool_shed_url),
    );

    let changeset_revision = resolve_changeset_revision(
        &tool_shed_url,
        name,
        owner,
        spec.changeset_revision.as_deref(),
        defaults.force_latest_revision,
        catalog,
    )
    .with_context(|| format!("failed to resolve changeset revision for {owner}/{name}"))?;

    Ok(Repository {
        name: name.to_string(),
        owner: owner.to_string(),
        changeset_revision,
        tool_panel_section_id: spec.tool_panel_section_id.clone(),
        tool_panel_section_label: spec.tool_panel_section_label.clone(),
        tool_shed_url,
        install_repository_dependencies: spec
            .install_repository_dependencies
            .unwrap_or(defaults.install_repository_dependencies),
        install_resolver_dependencies: spec
            .install_resolver_dependencies
            .unwrap_or(defaults.install_resolver_dependencies),
        install_tool_dependencies: spec
            .install_tool_dependencies
            .unwrap_or(defaults.install_tool_dependencies),
    })
}

pub fn format_tool_shed_url(tool_shed_url: &str) -> String {
    let mut formatted = tool_shed_url.to_string();
    if !formatted.ends_with('/') {
        formatted.push('/');
    }
    if !formatted.starts_with("http") {
        formatted.insert_str(0, "https://");
    }
    formatted
}

fn required_field<'a>(
    value: Option<&'a str>,
    field: &str,
    spec: &RepositorySpec,
) -> Result<&'a str> {
    value.ok_or_else(|| {
        anyhow!(
            "repository entry is missing required field '{field}': {}",
            spec.display_name()
        )
    })
}
