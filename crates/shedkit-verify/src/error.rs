use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunToolError {
    /// The server refused or failed the run. `inputs` is what was submitted.
    #[error("{message}")]
    Rejected { message: String, inputs: Value },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum VerifyOutputsError {
    #[error("{} job output problem(s)", .problems.len())]
    JobOutputs { job_stdio: Value, problems: Vec<String> },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum ToolTestError {
    #[error("tool '{tool_id}' has no test at index {index} ({available} available)")]
    MissingTest {
        tool_id: String,
        index: usize,
        available: usize,
    },
    #[error("invalid test definition for tool '{tool_id}': {message}")]
    Definition { tool_id: String, message: String },
    #[error("failed to stage test data for tool '{tool_id}': {message}")]
    Staging { tool_id: String, message: String },
    #[error("tool '{tool_id}' execution failed: {message}")]
    Execution { tool_id: String, message: String },
    #[error("tool '{tool_id}' produced no outputs")]
    NoOutputs { tool_id: String },
    #[error("output verification failed for tool '{tool_id}': {}", .problems.join("; "))]
    Outputs {
        tool_id: String,
        problems: Vec<String>,
    },
    #[error(transparent)]
    Interactor(#[from] anyhow::Error),
}
