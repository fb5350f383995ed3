use crate::repository::{RepositorySpec, ToolEntry};

/// Expands every entry that lists several `revisions` into one spec per
/// revision. Entries without revisions (absent, null or empty) pass through
/// with whatever single `changeset_revision` they carried.
pub fn flatten_repo_info(entries: &[ToolEntry]) -> Vec<RepositorySpec> {
    let mut flattened = Vec::with_capacity(entries.len());
    for entry in entries {
        let base = base_spec(entry);
        match entry.revisions.as_deref() {
            Some(revisions) if !revisions.is_empty() => {
                for revision in revisions {
                    flattened.push(RepositorySpec {
                        changeset_revision: Some(revision.clone()),
                        ..base.clone()
                    });
                }
            }
            _ => flattened.push(base),
        }
    }
    flattened
}

fn base_spec(entry: &ToolEntry) -> RepositorySpec {
    RepositorySpec {
        name: entry.name.clone(),
        owner: entry.owner.clone(),
        changeset_revision: entry.changeset_revision.clone(),
        tool_panel_section_id: entry.tool_panel_section_id.clone(),
        tool_panel_section_label: entry.tool_panel_section_label.clone(),
        tool_shed_url: entry.tool_shed_url.clone(),
        install_repository_dependencies: entry.install_repository_dependencies,
        install_resolver_dependencies: entry.install_resolver_dependencies,
        install_tool_dependencies: entry.install_tool_dependencies,
    }
}
