use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::blocking::Client;
use shedkit_core::{format_tool_shed_url, RevisionCatalog};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Blocking client for the tool shed repository API.
#[derive(Debug, Clone)]
pub struct ToolShedClient {
    http: Client,
}

impl ToolShedClient {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("shedkit/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build tool shed HTTP client")?;
        Ok(Self { http })
    }
}

impl RevisionCatalog for ToolShedClient {
    fn ordered_installable_revisions(
        &self,
        tool_shed_url: &str,
        name: &str,
        owner: &str,
    ) -> Result<Vec<String>> {
        let url = installable_revisions_url(tool_shed_url);
        tracing::info!(%url, name, owner, "querying installable revisions");

        let response = self
            .http
            .get(&url)
            .query(&[("name", name), ("owner", owner)])
            .send()
            .with_context(|| format!("tool shed request failed for {owner}/{name}: {url}"))?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!(
                "tool shed returned HTTP {status} for {owner}/{name}: {url}"
            ));
        }

        let body = response
            .text()
            .with_context(|| format!("failed to read tool shed response for {owner}/{name}"))?;
        parse_installable_revisions(&body)
            .with_context(|| format!("unexpected tool shed response for {owner}/{name}"))
    }
}

pub fn installable_revisions_url(tool_shed_url: &str) -> String {
    format!(
        "{}api/repositories/get_ordered_installable_revisions",
        format_tool_shed_url(tool_shed_url)
    )
}

/// The endpoint answers with a JSON array of changeset hashes, oldest first.
pub fn parse_installable_revisions(body: &str) -> Result<Vec<String>> {
    let value: serde_json::Value =
        serde_json::from_str(body).context("response is not valid JSON")?;
    let Some(items) = value.as_array() else {
        return Err(anyhow!("expected a JSON array of revisions, got: {value}"));
    };

    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| anyhow!("revision entry is not a string: {item}"))
        })
        .collect()
}
