use std::collections::BTreeMap;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ToolTestError;

/// One test case of a tool, in the shape the server reports it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolTestDescription {
    pub name: Option<String>,
    pub tool_id: Option<String>,
    pub tool_version: Option<String>,
    pub test_index: Option<usize>,
    #[serde(default)]
    pub required_files: Vec<Value>,
    #[serde(default)]
    pub inputs: Value,
    #[serde(default)]
    pub outputs: Vec<Value>,
    #[serde(default)]
    pub output_collections: Vec<Value>,
    #[serde(default)]
    pub expect_failure: bool,
    pub expect_exit_code: Option<i64>,
    pub maxseconds: Option<u64>,
    /// Set by the server when the test definition itself could not be loaded.
    #[serde(default)]
    pub error: bool,
    pub exception: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ToolTestDescription {
    pub fn from_json(value: Value) -> anyhow::Result<Self> {
        serde_json::from_value(value).context("failed to parse tool test definition")
    }

    /// Files that must be staged into the history before the tool runs.
    pub fn test_data(&self) -> &[Value] {
        &self.required_files
    }

    pub(crate) fn check_definition(&self, tool_id: &str) -> Result<(), ToolTestError> {
        if !self.error {
            return Ok(());
        }
        Err(ToolTestError::Definition {
            tool_id: tool_id.to_string(),
            message: self
                .exception
                .clone()
                .unwrap_or_else(|| "test definition could not be loaded".to_string()),
        })
    }
}
