use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::description::ToolTestDescription;
use crate::error::{RunToolError, VerifyOutputsError};

/// Details of the verified job (command line, stdout, stderr, ...) as the
/// server reports them.
pub type JobStdio = Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolResponse {
    #[serde(default)]
    pub outputs: Vec<Value>,
    #[serde(default)]
    pub output_collections: Vec<Value>,
    #[serde(default)]
    pub jobs: Vec<Value>,
    #[serde(default)]
    pub inputs: Value,
}

/// Connection to a tool execution server. Data staging, job submission and
/// output comparison all happen on the other side of this trait.
pub trait ToolTestInteractor {
    fn get_tool_tests(
        &self,
        tool_id: &str,
        tool_version: Option<&str>,
    ) -> Result<Vec<ToolTestDescription>>;

    /// Creates a fresh history and returns its id.
    fn new_history(&self) -> Result<String>;

    fn stage_data(
        &self,
        tool_id: &str,
        test: &ToolTestDescription,
        history_id: &str,
        force_path_paste: bool,
        maxseconds: u64,
    ) -> Result<()>;

    fn run_tool(
        &self,
        test: &ToolTestDescription,
        history_id: &str,
        resource_parameters: &Map<String, Value>,
    ) -> Result<ToolResponse, RunToolError>;

    fn verify_outputs(
        &self,
        test: &ToolTestDescription,
        history_id: &str,
        tool_id: &str,
        response: &ToolResponse,
        quiet: bool,
    ) -> Result<JobStdio, VerifyOutputsError>;
}
