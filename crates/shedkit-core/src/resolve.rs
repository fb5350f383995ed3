use anyhow::{anyhow, Result};

/// Source of installable revisions for repositories hosted on a tool shed.
pub trait RevisionCatalog {
    /// Installable changeset revisions of `owner/name`, oldest first.
    fn ordered_installable_revisions(
        &self,
        tool_shed_url: &str,
        name: &str,
        owner: &str,
    ) -> Result<Vec<String>>;
}

/// Returns the pinned revision untouched unless `force_latest` is set or
/// nothing is pinned, in which case the newest installable revision is
/// looked up. The catalog is only contacted in that second case.
pub fn resolve_changeset_revision<C>(
    tool_shed_url: &str,
    name: &str,
    owner: &str,
    pinned: Option<&str>,
    force_latest: bool,
    catalog: &C,
) -> Result<String>
where
    C: RevisionCatalog + ?Sized,
{
    if let Some(revision) = pinned {
        if !force_latest {
            return Ok(revision.to_string());
        }
    }

    let revisions = catalog.ordered_installable_revisions(tool_shed_url, name, owner)?;
    let Some(latest) = revisions.last() else {
        return Err(anyhow!(
            "repository does not exist in tool shed: {owner}/{name} ({tool_shed_url})"
        ));
    };

    tracing::debug!(
        name,
        owner,
        revision = latest.as_str(),
        candidates = revisions.len(),
        "resolved latest installable revision"
    );
    Ok(latest.clone())
}
