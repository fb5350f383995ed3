use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Success,
    Failure,
    Error,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Error => "error",
        }
    }
}

/// Structured outcome of one tool test run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub tool_id: String,
    pub tool_version: Option<String>,
    pub test_index: usize,
    pub time_seconds: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output_problems: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_problem: Option<String>,
    pub status: JobStatus,
}

pub trait JobDataSink {
    fn register(&mut self, record: JobRecord) -> Result<()>;
}

impl<F> JobDataSink for F
where
    F: FnMut(JobRecord),
{
    fn register(&mut self, record: JobRecord) -> Result<()> {
        self(record);
        Ok(())
    }
}

/// Appends every record as one JSON object per line.
#[derive(Debug)]
pub struct JsonLinesSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl JsonLinesSink {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create job data dir: {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open job data file: {}", path.display()))?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl JobDataSink for JsonLinesSink {
    fn register(&mut self, record: JobRecord) -> Result<()> {
        let line = serde_json::to_string(&record).context("failed to serialize job record")?;
        writeln!(self.writer, "{line}")
            .and_then(|_| self.writer.flush())
            .with_context(|| format!("failed to write job data file: {}", self.path.display()))
    }
}

pub fn read_job_records(path: &Path) -> Result<Vec<JobRecord>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read job data file: {}", path.display()))?;
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line).with_context(|| {
                format!("invalid job record at {}:{}", path.display(), idx + 1)
            })
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobSummary {
    pub success: usize,
    pub failure: usize,
    pub error: usize,
    pub total_seconds: f64,
}

impl JobSummary {
    pub fn from_records(records: &[JobRecord]) -> Self {
        let mut summary = Self::default();
        for record in records {
            match record.status {
                JobStatus::Success => summary.success += 1,
                JobStatus::Failure => summary.failure += 1,
                JobStatus::Error => summary.error += 1,
            }
            summary.total_seconds += record.time_seconds;
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.success + self.failure + self.error
    }

    pub fn all_passed(&self) -> bool {
        self.failure == 0 && self.error == 0
    }
}
