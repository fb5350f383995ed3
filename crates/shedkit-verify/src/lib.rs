mod description;
mod error;
mod interactor;
mod record;
mod runner;

pub use description::ToolTestDescription;
pub use error::{RunToolError, ToolTestError, VerifyOutputsError};
pub use interactor::{JobStdio, ToolResponse, ToolTestInteractor};
pub use record::{read_job_records, JobDataSink, JobRecord, JobStatus, JobSummary, JsonLinesSink};
pub use runner::{verify_tool, VerifyOptions, DEFAULT_TOOL_TEST_WAIT};

#[cfg(test)]
mod tests;
