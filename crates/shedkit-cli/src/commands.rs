use std::path::Path;

use anyhow::{Context, Result};
use shedkit_core::{
    complete_repo_information, format_tool_shed_url, resolve_changeset_revision, InstallDefaults,
    Repository, RevisionCatalog, ToolList,
};
use shedkit_toolshed::ToolShedClient;
use shedkit_verify::{read_job_records, JobRecord, JobStatus, JobSummary};

use crate::config::ShedkitConfig;
use crate::render::TerminalRenderer;

#[derive(Debug, Clone)]
pub(crate) struct NormalizeFlags {
    pub(crate) tool_shed_url: Option<String>,
    pub(crate) force_latest_revision: bool,
    pub(crate) require_tool_panel_info: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ReportEntry {
    pub(crate) status: &'static str,
    pub(crate) message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct JobReport {
    pub(crate) entries: Vec<ReportEntry>,
    pub(crate) summary: String,
    pub(crate) all_passed: bool,
}

pub(crate) fn run_flatten_command(tool_list: &Path) -> Result<String> {
    let list = ToolList::from_path(tool_list)?;
    serde_json::to_string_pretty(&list.flattened()).context("failed to serialize install requests")
}

pub(crate) fn run_normalize_command(
    tool_list: &Path,
    config: &ShedkitConfig,
    flags: &NormalizeFlags,
    renderer: TerminalRenderer,
) -> Result<String> {
    let list = ToolList::from_path(tool_list)?;
    let defaults = resolve_install_defaults(config, &list, flags);
    let client = ToolShedClient::with_timeout(config.request_timeout())?;

    let total = list.flattened().len() as u64;
    let mut progress = renderer.start_progress("normalize", total);
    let result = normalize_tool_list(&list, &defaults, &client, || progress.inc());
    match result {
        Ok(repositories) => {
            progress.finish_success();
            serde_json::to_string_pretty(&repositories)
                .context("failed to serialize install jobs")
        }
        Err(err) => {
            progress.finish_abandon();
            Err(err)
        }
    }
}

/// Precedence, lowest first: built-in, config file, tool list, command line.
pub(crate) fn resolve_install_defaults(
    config: &ShedkitConfig,
    list: &ToolList,
    flags: &NormalizeFlags,
) -> InstallDefaults {
    let mut defaults = list.apply_defaults(config.install_defaults());
    if let Some(url) = &flags.tool_shed_url {
        defaults.tool_shed_url = url.clone();
    }
    if !flags.require_tool_panel_info {
        defaults.require_tool_panel_info = false;
    }
    defaults.force_latest_revision = flags.force_latest_revision;
    defaults
}

pub(crate) fn normalize_tool_list<C, F>(
    list: &ToolList,
    defaults: &InstallDefaults,
    catalog: &C,
    mut on_resolved: F,
) -> Result<Vec<Repository>>
where
    C: RevisionCatalog + ?Sized,
    F: FnMut(),
{
    let specs = list.flattened();
    let mut repositories = Vec::with_capacity(specs.len());
    for (idx, spec) in specs.iter().enumerate() {
        let repository = complete_repo_information(spec, defaults, catalog).with_context(|| {
            format!("tool list entry {} ({})", idx + 1, spec.display_name())
        })?;
        tracing::info!(
            name = repository.name.as_str(),
            owner = repository.owner.as_str(),
            revision = repository.changeset_revision.as_str(),
            "normalized repository"
        );
        repositories.push(repository);
        on_resolved();
    }
    Ok(repositories)
}

pub(crate) fn run_latest_revision_command(
    name: &str,
    owner: &str,
    tool_shed_url: Option<&str>,
    config: &ShedkitConfig,
) -> Result<String> {
    let defaults = config.install_defaults();
    let url = tool_shed_url.unwrap_or(&defaults.tool_shed_url);
    let client = ToolShedClient::with_timeout(config.request_timeout())?;
    latest_revision(name, owner, url, &client)
}

pub(crate) fn latest_revision<C>(
    name: &str,
    owner: &str,
    tool_shed_url: &str,
    catalog: &C,
) -> Result<String>
where
    C: RevisionCatalog + ?Sized,
{
    resolve_changeset_revision(
        &format_tool_shed_url(tool_shed_url),
        name,
        owner,
        None,
        true,
        catalog,
    )
}

pub(crate) fn run_report_command(job_data: &Path) -> Result<JobReport> {
    let records = read_job_records(job_data)?;
    Ok(build_job_report(&records))
}

pub(crate) fn build_job_report(records: &[JobRecord]) -> JobReport {
    let entries = records.iter().map(report_entry).collect();
    let summary = JobSummary::from_records(records);
    JobReport {
        entries,
        summary: format!(
            "{} test(s): {} passed, {} failed, {} errored in {:.1}s",
            summary.total(),
            summary.success,
            summary.failure,
            summary.error,
            summary.total_seconds
        ),
        all_passed: summary.all_passed(),
    }
}

fn report_entry(record: &JobRecord) -> ReportEntry {
    let version = record.tool_version.as_deref().unwrap_or("default");
    let mut message = format!(
        "{} ({version}) test #{}: {} in {:.1}s",
        record.tool_id,
        record.test_index,
        record.status.as_str(),
        record.time_seconds
    );
    if let Some(problem) = &record.execution_problem {
        message.push_str(&format!(" - {problem}"));
    }
    for problem in &record.output_problems {
        message.push_str(&format!(" - {problem}"));
    }

    let status = match record.status {
        JobStatus::Success => "ok",
        JobStatus::Failure => "fail",
        JobStatus::Error => "err",
    };
    ReportEntry { status, message }
}
