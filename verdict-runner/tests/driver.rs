// Copyright (c) The verdict Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end driver tests with a scripted engine.

use camino::Utf8PathBuf;
use verdict_metadata::{RunStatusSummary, RunSummary, TestStatusSummary};
use verdict_runner::{
    driver,
    engine::TestEngine,
    errors::EngineError,
    locate::StaticLocator,
    reporter::{EngineExit, FailureDetail, Phase, PhaseOutcome, PhaseReport, RunObserver, TestId},
};

/// An engine that plays back a fixed list of reports.
struct ScriptedEngine {
    reports: Vec<PhaseReport>,
    exit: EngineExit,
}

impl ScriptedEngine {
    fn report(
        id: &str,
        phase: Phase,
        outcome: PhaseOutcome,
        output: Option<&str>,
        failure: Option<&str>,
    ) -> PhaseReport {
        PhaseReport {
            id: TestId::new(id),
            phase,
            outcome,
            output: output.map(str::to_owned),
            failure: failure.map(|traceback| FailureDetail {
                traceback: traceback.to_owned(),
                crash: None,
            }),
            source_file: "example_test.py".into(),
        }
    }
}

impl TestEngine for ScriptedEngine {
    fn execute(
        &self,
        args: &[String],
        _test_files: &[Utf8PathBuf],
        observer: &mut dyn RunObserver,
    ) -> Result<(), EngineError> {
        assert_eq!(
            args.last().map(String::as_str),
            Some("--tb=no"),
            "driver must sanitize engine args"
        );
        for report in &self.reports {
            observer.phase_report(report);
        }
        observer.run_finished(self.exit);
        Ok(())
    }
}

/// An engine whose process cannot be spawned at all.
struct UnspawnableEngine;

impl TestEngine for UnspawnableEngine {
    fn execute(
        &self,
        _args: &[String],
        _test_files: &[Utf8PathBuf],
        _observer: &mut dyn RunObserver,
    ) -> Result<(), EngineError> {
        Err(EngineError::spawn(
            "missing-engine",
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such binary"),
        ))
    }
}

fn read_results(dir: &camino_tempfile::Utf8TempDir) -> RunSummary {
    let path = dir.path().join(driver::RESULTS_FILE);
    let json = fs_err::read_to_string(path.as_std_path()).expect("results.json was written");
    RunSummary::parse_json(&json).expect("results.json parses")
}

#[test]
fn one_pass_one_fail_end_to_end() {
    let input_dir = camino_tempfile::tempdir().unwrap();
    let output_dir = camino_tempfile::tempdir().unwrap();

    let engine = ScriptedEngine {
        reports: vec![
            ScriptedEngine::report(
                "example_test.py::test_a",
                Phase::Call,
                PhaseOutcome::Passed,
                None,
                None,
            ),
            ScriptedEngine::report(
                "example_test.py::test_b",
                Phase::Call,
                PhaseOutcome::Failed,
                None,
                Some("expected 1, got 2"),
            ),
        ],
        exit: EngineExit::TestsFailed,
    };

    let summary = driver::run_tests(
        &engine,
        StaticLocator::default(),
        "example",
        input_dir.path(),
        output_dir.path(),
        &["-v".to_owned(), "--tb=long".to_owned()],
    )
    .expect("results are written");

    assert_eq!(summary.status, RunStatusSummary::Fail);
    let names: Vec<_> = summary.tests.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["test_a", "test_b"]);
    assert_eq!(summary.tests[0].status, TestStatusSummary::Pass);
    assert_eq!(summary.tests[1].status, TestStatusSummary::Fail);
    assert_eq!(summary.tests[1].message.as_deref(), Some("expected 1, got 2"));

    // the document on disk is the same one returned
    assert_eq!(read_results(&output_dir), summary);
}

#[cfg(unix)]
#[test]
fn results_file_is_group_writable() {
    use std::os::unix::fs::PermissionsExt;

    let input_dir = camino_tempfile::tempdir().unwrap();
    let output_dir = camino_tempfile::tempdir().unwrap();
    let engine = ScriptedEngine {
        reports: Vec::new(),
        exit: EngineExit::Ok,
    };

    driver::run_tests(
        &engine,
        StaticLocator::default(),
        "example",
        input_dir.path(),
        output_dir.path(),
        &[],
    )
    .unwrap();

    let metadata = fs_err::metadata(
        output_dir.path().join(driver::RESULTS_FILE).as_std_path(),
    )
    .unwrap();
    assert_eq!(metadata.permissions().mode() & 0o777, 0o664);
}

#[test]
fn engine_fault_still_writes_an_error_document() {
    let input_dir = camino_tempfile::tempdir().unwrap();
    let output_dir = camino_tempfile::tempdir().unwrap();

    let summary = driver::run_tests(
        &UnspawnableEngine,
        StaticLocator::default(),
        "example",
        input_dir.path(),
        output_dir.path(),
        &[],
    )
    .expect("the document is still written");

    assert_eq!(summary.status, RunStatusSummary::Error);
    let message = summary.message.as_deref().expect("error carries a message");
    assert!(
        message.contains("missing-engine") && message.contains("no such binary"),
        "message should carry the whole error chain, got {message:?}"
    );
    assert_eq!(read_results(&output_dir), summary);
}
