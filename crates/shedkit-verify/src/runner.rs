use std::time::Instant;

use serde_json::{Map, Value};

use crate::description::ToolTestDescription;
use crate::error::{RunToolError, ToolTestError, VerifyOutputsError};
use crate::interactor::{ToolTestInteractor, ToolResponse};
use crate::record::{JobDataSink, JobRecord, JobStatus};

/// Upper bound, in seconds, for staging and running a single test.
pub const DEFAULT_TOOL_TEST_WAIT: u64 = 86_400;

#[derive(Debug, Clone)]
pub struct VerifyOptions {
    pub resource_parameters: Map<String, Value>,
    pub test_index: usize,
    pub tool_version: Option<String>,
    pub quiet: bool,
    /// Reuse this history instead of creating a new one.
    pub history: Option<String>,
    pub force_path_paste: bool,
    pub maxseconds: u64,
    /// Pre-fetched test definitions; fetched from the interactor when unset.
    pub tool_tests: Option<Vec<ToolTestDescription>>,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            resource_parameters: Map::new(),
            test_index: 0,
            tool_version: None,
            quiet: false,
            history: None,
            force_path_paste: false,
            maxseconds: DEFAULT_TOOL_TEST_WAIT,
            tool_tests: None,
        }
    }
}

#[derive(Debug, Default)]
struct ExecutionTrace {
    inputs: Option<Value>,
    job_stdio: Option<Value>,
    output_problems: Vec<String>,
    execution_problem: Option<String>,
}

impl ExecutionTrace {
    fn status(&self) -> JobStatus {
        if self.execution_problem.is_some() {
            JobStatus::Error
        } else if !self.output_problems.is_empty() {
            JobStatus::Failure
        } else {
            JobStatus::Success
        }
    }

    fn into_record(
        self,
        tool_id: &str,
        tool_version: Option<String>,
        test_index: usize,
        time_seconds: f64,
    ) -> JobRecord {
        let status = self.status();
        JobRecord {
            tool_id: tool_id.to_string(),
            tool_version,
            test_index,
            time_seconds,
            inputs: self.inputs,
            job: self.job_stdio,
            output_problems: self.output_problems,
            execution_problem: self.execution_problem,
            status,
        }
    }
}

/// Runs test `options.test_index` of `tool_id` in a history on the server
/// behind `interactor`: stage the inputs, run the tool, verify the outputs.
///
/// When a sink is given it receives exactly one [`JobRecord`], whether the
/// test passed or not.
pub fn verify_tool<I>(
    tool_id: &str,
    interactor: &I,
    options: VerifyOptions,
    sink: Option<&mut dyn JobDataSink>,
) -> Result<(), ToolTestError>
where
    I: ToolTestInteractor + ?Sized,
{
    let VerifyOptions {
        resource_parameters,
        test_index,
        tool_version,
        quiet,
        history,
        force_path_paste,
        maxseconds,
        tool_tests,
    } = options;

    let tool_tests = match tool_tests {
        Some(tests) => tests,
        None => interactor.get_tool_tests(tool_id, tool_version.as_deref())?,
    };
    let available = tool_tests.len();
    let mut test = tool_tests
        .into_iter()
        .nth(test_index)
        .ok_or_else(|| ToolTestError::MissingTest {
            tool_id: tool_id.to_string(),
            index: test_index,
            available,
        })?;
    test.maxseconds.get_or_insert(maxseconds);
    test.check_definition(tool_id)?;

    let history_id = match history {
        Some(history_id) => history_id,
        None => interactor.new_history()?,
    };

    let _span = tracing::info_span!("tool_test", tool_id, test_index, history = %history_id)
        .entered();
    let started = Instant::now();
    let mut trace = ExecutionTrace::default();
    let request = TestRun {
        tool_id,
        test: &test,
        history_id: &history_id,
        resource_parameters: &resource_parameters,
        force_path_paste,
        maxseconds,
        quiet,
    };
    let outcome = request.execute(interactor, &mut trace);

    if let Some(sink) = sink {
        let record = trace.into_record(
            tool_id,
            tool_version,
            test_index,
            started.elapsed().as_secs_f64(),
        );
        tracing::info!(status = record.status.as_str(), "recording job data");
        if let Err(err) = sink.register(record) {
            if outcome.is_ok() {
                return Err(ToolTestError::Interactor(err));
            }
            tracing::warn!(error = %format!("{err:#}"), "failed to record job data");
        }
    }

    outcome
}

struct TestRun<'a> {
    tool_id: &'a str,
    test: &'a ToolTestDescription,
    history_id: &'a str,
    resource_parameters: &'a Map<String, Value>,
    force_path_paste: bool,
    maxseconds: u64,
    quiet: bool,
}

impl TestRun<'_> {
    fn execute<I>(&self, interactor: &I, trace: &mut ExecutionTrace) -> Result<(), ToolTestError>
    where
        I: ToolTestInteractor + ?Sized,
    {
        tracing::debug!(files = self.test.test_data().len(), "staging test data");
        if let Err(err) = interactor.stage_data(
            self.tool_id,
            self.test,
            self.history_id,
            self.force_path_paste,
            self.maxseconds,
        ) {
            let message = format!("{err:#}");
            trace.execution_problem = Some(message.clone());
            return Err(ToolTestError::Staging {
                tool_id: self.tool_id.to_string(),
                message,
            });
        }

        let Some(response) = self.run(interactor, trace)? else {
            return Ok(());
        };

        if response.outputs.is_empty() && response.output_collections.is_empty() {
            trace
                .output_problems
                .push("tool run produced no outputs or output collections".to_string());
            return Err(ToolTestError::NoOutputs {
                tool_id: self.tool_id.to_string(),
            });
        }

        match interactor.verify_outputs(
            self.test,
            self.history_id,
            self.tool_id,
            &response,
            self.quiet,
        ) {
            Ok(job_stdio) => {
                trace.job_stdio = Some(job_stdio);
                Ok(())
            }
            Err(VerifyOutputsError::JobOutputs {
                job_stdio,
                problems,
            }) => {
                trace.job_stdio = Some(job_stdio);
                trace.output_problems = problems.clone();
                Err(ToolTestError::Outputs {
                    tool_id: self.tool_id.to_string(),
                    problems,
                })
            }
            Err(VerifyOutputsError::Other(err)) => {
                let problems = vec![format!("{err:#}")];
                trace.output_problems = problems.clone();
                Err(ToolTestError::Outputs {
                    tool_id: self.tool_id.to_string(),
                    problems,
                })
            }
        }
    }

    /// `Ok(None)` means the run failed and the test expected it to.
    fn run<I>(
        &self,
        interactor: &I,
        trace: &mut ExecutionTrace,
    ) -> Result<Option<ToolResponse>, ToolTestError>
    where
        I: ToolTestInteractor + ?Sized,
    {
        match interactor.run_tool(self.test, self.history_id, self.resource_parameters) {
            Ok(response) => {
                trace.inputs = Some(response.inputs.clone());
                Ok(Some(response))
            }
            Err(RunToolError::Rejected { message, inputs }) => {
                trace.inputs = Some(inputs);
                trace.execution_problem = Some(message.clone());
                if self.test.expect_failure {
                    tracing::info!("tool run failed as the test expects");
                    return Ok(None);
                }
                Err(ToolTestError::Execution {
                    tool_id: self.tool_id.to_string(),
                    message,
                })
            }
            Err(RunToolError::Other(err)) => {
                let message = format!("{err:#}");
                trace.execution_problem = Some(message.clone());
                Err(ToolTestError::Execution {
                    tool_id: self.tool_id.to_string(),
                    message,
                })
            }
        }
    }
}
