use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::anyhow;
use serde_json::{json, Map, Value};

use super::*;

enum RunBehavior {
    Succeed(ToolResponse),
    Reject(&'static str),
    Crash(&'static str),
}

enum VerifyBehavior {
    Pass,
    JobOutputs(Vec<&'static str>),
    Crash(&'static str),
}

struct FakeInteractor {
    tests: Vec<ToolTestDescription>,
    stage_error: Option<&'static str>,
    run: RunBehavior,
    verify: VerifyBehavior,
    calls: RefCell<Vec<String>>,
}

impl FakeInteractor {
    fn new(run: RunBehavior, verify: VerifyBehavior) -> Self {
        Self {
            tests: vec![test_description(json!({ "name": "test-1", "tool_id": "cat1" }))],
            stage_error: None,
            run,
            verify,
            calls: RefCell::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn log(&self, call: impl Into<String>) {
        self.calls.borrow_mut().push(call.into());
    }
}

impl ToolTestInteractor for FakeInteractor {
    fn get_tool_tests(
        &self,
        tool_id: &str,
        tool_version: Option<&str>,
    ) -> anyhow::Result<Vec<ToolTestDescription>> {
        self.log(format!(
            "get_tool_tests:{tool_id}:{}",
            tool_version.unwrap_or("latest")
        ));
        Ok(self.tests.clone())
    }

    fn new_history(&self) -> anyhow::Result<String> {
        self.log("new_history");
        Ok("hist-new".to_string())
    }

    fn stage_data(
        &self,
        _tool_id: &str,
        test: &ToolTestDescription,
        history_id: &str,
        force_path_paste: bool,
        maxseconds: u64,
    ) -> anyhow::Result<()> {
        self.log(format!(
            "stage_data:{history_id}:{force_path_paste}:{maxseconds}:{}",
            test.maxseconds.unwrap_or_default()
        ));
        match self.stage_error {
            Some(message) => Err(anyhow!(message)),
            None => Ok(()),
        }
    }

    fn run_tool(
        &self,
        _test: &ToolTestDescription,
        history_id: &str,
        resource_parameters: &Map<String, Value>,
    ) -> Result<ToolResponse, RunToolError> {
        self.log(format!("run_tool:{history_id}:{}", resource_parameters.len()));
        match &self.run {
            RunBehavior::Succeed(response) => Ok(response.clone()),
            RunBehavior::Reject(message) => Err(RunToolError::Rejected {
                message: message.to_string(),
                inputs: json!({ "input1": "hda-1" }),
            }),
            RunBehavior::Crash(message) => Err(RunToolError::Other(anyhow!(*message))),
        }
    }

    fn verify_outputs(
        &self,
        _test: &ToolTestDescription,
        history_id: &str,
        tool_id: &str,
        _response: &ToolResponse,
        quiet: bool,
    ) -> Result<JobStdio, VerifyOutputsError> {
        self.log(format!("verify_outputs:{history_id}:{tool_id}:{quiet}"));
        match &self.verify {
            VerifyBehavior::Pass => Ok(json!({ "stdout": "ok", "exit_code": 0 })),
            VerifyBehavior::JobOutputs(problems) => Err(VerifyOutputsError::JobOutputs {
                job_stdio: json!({ "stdout": "", "exit_code": 1 }),
                problems: problems.iter().map(|p| p.to_string()).collect(),
            }),
            VerifyBehavior::Crash(message) => Err(VerifyOutputsError::Other(anyhow!(*message))),
        }
    }
}

fn test_description(value: Value) -> ToolTestDescription {
    ToolTestDescription::from_json(value).expect("test definition should parse")
}

fn passing_interactor() -> FakeInteractor {
    FakeInteractor::new(RunBehavior::Succeed(produced_outputs()), VerifyBehavior::Pass)
}

fn produced_outputs() -> ToolResponse {
    ToolResponse {
        outputs: vec![json!({ "id": "out-1", "output_name": "out_file1" })],
        output_collections: Vec::new(),
        jobs: vec![json!({ "id": "job-1" })],
        inputs: json!({ "input1": "hda-1" }),
    }
}

fn run_recorded(
    interactor: &FakeInteractor,
    options: VerifyOptions,
) -> (Result<(), ToolTestError>, Vec<JobRecord>) {
    let mut records = Vec::new();
    let mut collect = |record: JobRecord| records.push(record);
    let result = verify_tool("cat1", interactor, options, Some(&mut collect));
    (result, records)
}

#[test]
fn verify_tool_records_success_with_inputs_and_job() {
    let interactor = passing_interactor();

    let (result, records) = run_recorded(&interactor, VerifyOptions::default());

    result.expect("test should pass");
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.tool_id, "cat1");
    assert_eq!(record.tool_version, None);
    assert_eq!(record.test_index, 0);
    assert_eq!(record.status, JobStatus::Success);
    assert_eq!(record.inputs, Some(json!({ "input1": "hda-1" })));
    assert_eq!(record.job, Some(json!({ "stdout": "ok", "exit_code": 0 })));
    assert!(record.output_problems.is_empty());
    assert!(record.execution_problem.is_none());
    assert!(record.time_seconds >= 0.0);

    assert_eq!(
        interactor.calls(),
        vec![
            "get_tool_tests:cat1:latest",
            "new_history",
            "stage_data:hist-new:false:86400:86400",
            "run_tool:hist-new:0",
            "verify_outputs:hist-new:cat1:false",
        ]
    );
}

#[test]
fn verify_tool_uses_supplied_history_tests_and_parameters() {
    let interactor = passing_interactor();
    let mut resource_parameters = Map::new();
    resource_parameters.insert("cores".to_string(), json!(4));
    let options = VerifyOptions {
        resource_parameters,
        test_index: 1,
        tool_version: Some("1.0.2".to_string()),
        quiet: true,
        history: Some("hist-existing".to_string()),
        force_path_paste: true,
        maxseconds: 60,
        tool_tests: Some(vec![
            test_description(json!({ "name": "first" })),
            test_description(json!({ "name": "second", "maxseconds": 5 })),
        ]),
    };

    let (result, records) = run_recorded(&interactor, options);

    result.expect("test should pass");
    assert_eq!(records[0].test_index, 1);
    assert_eq!(records[0].tool_version.as_deref(), Some("1.0.2"));
    assert_eq!(
        interactor.calls(),
        vec![
            "stage_data:hist-existing:true:60:5",
            "run_tool:hist-existing:1",
            "verify_outputs:hist-existing:cat1:true",
        ]
    );
}

#[test]
fn verify_tool_rejects_out_of_range_test_index() {
    let interactor = passing_interactor();
    let options = VerifyOptions {
        test_index: 3,
        ..VerifyOptions::default()
    };

    let (result, records) = run_recorded(&interactor, options);

    let err = result.expect_err("index 3 does not exist");
    assert!(matches!(
        err,
        ToolTestError::MissingTest {
            index: 3,
            available: 1,
            ..
        }
    ));
    assert!(records.is_empty());
}

#[test]
fn verify_tool_surfaces_definition_errors_before_running() {
    let mut interactor = passing_interactor();
    interactor.tests = vec![test_description(json!({
        "error": true,
        "exception": "Test output [out_file1] not found"
    }))];

    let (result, records) = run_recorded(&interactor, VerifyOptions::default());

    let err = result.expect_err("broken definitions must fail");
    assert!(err.to_string().contains("Test output [out_file1] not found"));
    assert!(records.is_empty());
    assert_eq!(interactor.calls(), vec!["get_tool_tests:cat1:latest"]);
}

#[test]
fn verify_tool_records_execution_error_when_run_is_rejected() {
    let interactor = FakeInteractor::new(
        RunBehavior::Reject("parameter 'input1' is required"),
        VerifyBehavior::Pass,
    );

    let (result, records) = run_recorded(&interactor, VerifyOptions::default());

    let err = result.expect_err("rejected run must fail");
    assert!(matches!(err, ToolTestError::Execution { .. }));
    let record = &records[0];
    assert_eq!(record.status, JobStatus::Error);
    assert_eq!(record.inputs, Some(json!({ "input1": "hda-1" })));
    assert_eq!(
        record.execution_problem.as_deref(),
        Some("parameter 'input1' is required")
    );
    assert!(!interactor
        .calls()
        .iter()
        .any(|call| call.starts_with("verify_outputs")));
}

#[test]
fn verify_tool_accepts_expected_failure_but_records_error() {
    let mut interactor = FakeInteractor::new(
        RunBehavior::Reject("tool exited with code 1"),
        VerifyBehavior::Pass,
    );
    interactor.tests = vec![test_description(json!({ "expect_failure": true }))];

    let (result, records) = run_recorded(&interactor, VerifyOptions::default());

    result.expect("expected failure counts as a pass");
    let record = &records[0];
    assert_eq!(record.status, JobStatus::Error);
    assert_eq!(
        record.execution_problem.as_deref(),
        Some("tool exited with code 1")
    );
    assert!(record.job.is_none());
}

#[test]
fn verify_tool_does_not_excuse_unexpected_crashes_for_expected_failures() {
    let mut interactor =
        FakeInteractor::new(RunBehavior::Crash("connection reset"), VerifyBehavior::Pass);
    interactor.tests = vec![test_description(json!({ "expect_failure": true }))];

    let (result, records) = run_recorded(&interactor, VerifyOptions::default());

    result.expect_err("transport errors are never expected");
    assert_eq!(records[0].status, JobStatus::Error);
    assert!(records[0].inputs.is_none());
}

#[test]
fn verify_tool_records_output_problems_as_failure() {
    let interactor = FakeInteractor::new(
        RunBehavior::Succeed(produced_outputs()),
        VerifyBehavior::JobOutputs(vec![
            "Output out_file1 differs from expected",
            "stderr mismatch",
        ]),
    );

    let (result, records) = run_recorded(&interactor, VerifyOptions::default());

    let err = result.expect_err("output problems must fail");
    assert!(err.to_string().contains("stderr mismatch"));
    let record = &records[0];
    assert_eq!(record.status, JobStatus::Failure);
    assert_eq!(record.output_problems.len(), 2);
    assert_eq!(record.job, Some(json!({ "stdout": "", "exit_code": 1 })));
    assert!(record.execution_problem.is_none());
}

#[test]
fn verify_tool_records_unexpected_verification_error_as_single_problem() {
    let interactor = FakeInteractor::new(
        RunBehavior::Succeed(produced_outputs()),
        VerifyBehavior::Crash("history deleted"),
    );

    let (result, records) = run_recorded(&interactor, VerifyOptions::default());

    result.expect_err("verification crash must fail");
    assert_eq!(records[0].status, JobStatus::Failure);
    assert_eq!(records[0].output_problems, vec!["history deleted"]);
    assert!(records[0].job.is_none());
}

#[test]
fn verify_tool_fails_when_run_produces_nothing() {
    let interactor = FakeInteractor::new(
        RunBehavior::Succeed(ToolResponse::default()),
        VerifyBehavior::Pass,
    );

    let (result, records) = run_recorded(&interactor, VerifyOptions::default());

    assert!(matches!(
        result.expect_err("no outputs must fail"),
        ToolTestError::NoOutputs { .. }
    ));
    assert_eq!(records[0].status, JobStatus::Failure);
}

#[test]
fn verify_tool_records_staging_failure_as_error() {
    let mut interactor = passing_interactor();
    interactor.stage_error = Some("upload of 1.bed timed out");

    let (result, records) = run_recorded(&interactor, VerifyOptions::default());

    assert!(matches!(
        result.expect_err("staging failure must fail"),
        ToolTestError::Staging { .. }
    ));
    assert_eq!(records[0].status, JobStatus::Error);
    assert_eq!(
        records[0].execution_problem.as_deref(),
        Some("upload of 1.bed timed out")
    );
    assert!(!interactor
        .calls()
        .iter()
        .any(|call| call.starts_with("run_tool")));
}

#[test]
fn verify_tool_without_sink_still_reports_outcome() {
    let interactor = passing_interactor();
    verify_tool("cat1", &interactor, VerifyOptions::default(), None).expect("test should pass");
}

#[test]
fn job_record_serializes_like_the_job_data_contract() {
    let record = JobRecord {
        tool_id: "cat1".to_string(),
        tool_version: None,
        test_index: 0,
        time_seconds: 1.5,
        inputs: None,
        job: None,
        output_problems: Vec::new(),
        execution_problem: Some("boom".to_string()),
        status: JobStatus::Error,
    };

    let value = serde_json::to_value(&record).expect("must serialize");
    assert_eq!(
        value,
        json!({
            "tool_id": "cat1",
            "tool_version": null,
            "test_index": 0,
            "time_seconds": 1.5,
            "execution_problem": "boom",
            "status": "error"
        })
    );
}

#[test]
fn json_lines_sink_appends_records_that_read_back() {
    let root = test_root();
    let path = root.join("nested").join("job_data.jsonl");

    let interactor = passing_interactor();
    {
        let mut sink = JsonLinesSink::open(&path).expect("must open sink");
        assert_eq!(sink.path(), path.as_path());
        verify_tool("cat1", &interactor, VerifyOptions::default(), Some(&mut sink))
            .expect("test should pass");
    }
    let failing = FakeInteractor::new(
        RunBehavior::Succeed(produced_outputs()),
        VerifyBehavior::JobOutputs(vec!["differs"]),
    );
    {
        let mut sink = JsonLinesSink::open(&path).expect("must reopen sink");
        let _ = verify_tool("cat1", &failing, VerifyOptions::default(), Some(&mut sink));
    }

    let records = read_job_records(&path).expect("must read records");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].status, JobStatus::Success);
    assert_eq!(records[1].status, JobStatus::Failure);

    let summary = JobSummary::from_records(&records);
    assert_eq!(summary.success, 1);
    assert_eq!(summary.failure, 1);
    assert_eq!(summary.total(), 2);
    assert!(!summary.all_passed());

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn read_job_records_reports_line_of_invalid_record() {
    let root = test_root();
    fs::create_dir_all(&root).expect("must create test dir");
    let path = root.join("job_data.jsonl");
    fs::write(
        &path,
        "{\"tool_id\":\"cat1\",\"tool_version\":null,\"test_index\":0,\"time_seconds\":0.1,\"status\":\"success\"}\n\nnot json\n",
    )
    .expect("must write records");

    let err = read_job_records(&path).expect_err("third line is invalid");
    assert!(err.to_string().ends_with(":3"));

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn tool_test_description_keeps_unknown_keys() {
    let test = test_description(json!({
        "name": "test-2",
        "required_files": [["1.bed", {"ftype": "bed"}]],
        "expect_exit_code": 0,
        "command_line": ["cat"]
    }));

    assert_eq!(test.test_data().len(), 1);
    assert_eq!(test.expect_exit_code, Some(0));
    assert_eq!(test.extra.get("command_line"), Some(&json!(["cat"])));
    assert!(!test.expect_failure);
}

static TEST_ROOT_COUNTER: AtomicU64 = AtomicU64::new(0);

fn test_root() -> PathBuf {
    let mut path = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time")
        .as_nanos();
    let counter = TEST_ROOT_COUNTER.fetch_add(1, Ordering::SeqCst);
    path.push(format!(
        "shedkit-verify-tests-{}-{}-{}",
        std::process::id(),
        nanos,
        counter
    ));
    path
}
