// Copyright (c) The verdict Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Driving a pytest-style engine over its JSONL report log.

use crate::{
    errors::EngineError,
    reporter::{
        CollectedTest, CrashLocation, EngineExit, FailureDetail, Phase, PhaseOutcome, PhaseReport,
        RunObserver, TestId,
    },
};
use camino::Utf8PathBuf;
use serde::Deserialize;
use serde_json::Value;
use std::io::BufRead;
use tracing::{debug, warn};

/// Runs a pytest-style engine as a subprocess.
///
/// The run happens in two passes. A quiet collect-only pass lists the
/// engine's test identifiers, which are fed through
/// [`RunObserver::collection_ready`] so the aggregator can establish
/// declaration order; the real run is then invoked with the reordered
/// identifiers and a `--report-log` JSONL file, which is replayed into the
/// observer record by record. Malformed records are skipped, not fatal: the
/// engine's exit code still reaches [`RunObserver::run_finished`] and the
/// aggregator still produces a coherent document.
#[derive(Clone, Debug)]
pub struct ReportLogEngine {
    program: Vec<String>,
}

impl ReportLogEngine {
    /// Creates an engine around the given command, e.g.
    /// `["python3", "-m", "pytest"]`. An empty command falls back to the
    /// default.
    pub fn new<I, S>(program: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let program: Vec<String> = program.into_iter().map(Into::into).collect();
        if program.is_empty() {
            Self::default()
        } else {
            Self { program }
        }
    }

    fn command(&self, extra: Vec<String>) -> duct::Expression {
        let mut argv = self.program.clone();
        argv.extend(extra);
        duct::cmd(argv[0].as_str(), &argv[1..])
    }

    fn command_line(&self) -> String {
        self.program.join(" ")
    }

    /// The collect-only pass. Best-effort: any fault leaves ordering to the
    /// engine and returns an empty list.
    fn collect(&self, args: &[String], test_files: &[Utf8PathBuf]) -> Vec<CollectedTest> {
        let mut argv = args.to_vec();
        argv.push("--collect-only".to_owned());
        argv.push("-q".to_owned());
        argv.extend(test_files.iter().map(ToString::to_string));

        let output = match self
            .command(argv)
            .stdout_capture()
            .stderr_capture()
            .unchecked()
            .run()
        {
            Ok(output) => output,
            Err(error) => {
                debug!("collect-only pass failed, leaving order to the engine: {error}");
                return Vec::new();
            }
        };

        String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|line| line.contains("::"))
            .map(|line| {
                let id = TestId::new(line);
                let source_file = resolve_source(id.source_segment(), test_files);
                CollectedTest { id, source_file }
            })
            .collect()
    }
}

impl Default for ReportLogEngine {
    fn default() -> Self {
        Self {
            program: vec!["python3".to_owned(), "-m".to_owned(), "pytest".to_owned()],
        }
    }
}

impl super::TestEngine for ReportLogEngine {
    fn execute(
        &self,
        args: &[String],
        test_files: &[Utf8PathBuf],
        observer: &mut dyn RunObserver,
    ) -> Result<(), EngineError> {
        let mut items = self.collect(args, test_files);
        observer.collection_ready(&mut items);

        let scratch =
            camino_tempfile::tempdir().map_err(|error| EngineError::ScratchDir { error })?;
        let log_path = scratch.path().join("report.jsonl");

        let mut argv = args.to_vec();
        argv.push(format!("--report-log={log_path}"));
        if items.is_empty() {
            argv.extend(test_files.iter().map(ToString::to_string));
        } else {
            argv.extend(items.iter().map(|item| item.id.as_str().to_owned()));
        }

        let output = self
            .command(argv)
            .stdout_capture()
            .stderr_capture()
            .unchecked()
            .run()
            .map_err(|error| EngineError::spawn(self.command_line(), error))?;
        let exit = EngineExit::from_code(output.status.code().unwrap_or(-1));

        match fs_err::File::open(log_path.as_std_path()) {
            Ok(file) => replay_report_log(std::io::BufReader::new(file), test_files, observer),
            Err(error) => {
                // e.g. the engine rejected the invocation before its report
                // plugin loaded; the exit status will say so
                warn!("engine produced no report log: {error}");
            }
        }

        observer.run_finished(exit);
        Ok(())
    }
}

/// Replays a JSONL report-log stream into an observer.
///
/// Phase reports become [`RunObserver::phase_report`] calls; failed
/// collection reports become [`RunObserver::fatal_exception`] calls.
/// Records that fail to parse are logged and skipped.
pub(crate) fn replay_report_log<R: BufRead>(
    reader: R,
    test_files: &[Utf8PathBuf],
    observer: &mut dyn RunObserver,
) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(error) => {
                warn!("stopping report-log replay: {error}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<LogRecord>(&line) {
            Ok(LogRecord::TestReport(record)) => {
                if let Some(report) = record.into_phase_report(test_files) {
                    observer.phase_report(&report);
                }
            }
            Ok(LogRecord::CollectReport(record)) => {
                if record.outcome == "failed" {
                    if let Some(detail) = record.longrepr.as_ref().and_then(failure_detail) {
                        observer.fatal_exception(PhaseOutcome::Failed, &detail);
                    }
                }
            }
            Ok(LogRecord::Other) => {}
            Err(error) => {
                warn!("skipping unparseable report-log record: {error}");
            }
        }
    }
}

/// Maps a nodeid's file segment to one of the invoked test files where
/// possible, so source lookups work regardless of the engine's rootdir.
fn resolve_source(segment: &str, test_files: &[Utf8PathBuf]) -> Utf8PathBuf {
    let segment_path = Utf8PathBuf::from(segment);
    test_files
        .iter()
        .find(|file| file.file_name() == segment_path.file_name())
        .cloned()
        .unwrap_or(segment_path)
}

#[derive(Debug, Deserialize)]
#[serde(tag = "$report_type")]
enum LogRecord {
    TestReport(TestReportRecord),
    CollectReport(CollectReportRecord),
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct TestReportRecord {
    nodeid: String,
    #[serde(default)]
    when: Option<String>,
    outcome: String,
    #[serde(default)]
    longrepr: Option<Value>,
    #[serde(default)]
    sections: Vec<(String, String)>,
}

impl TestReportRecord {
    fn into_phase_report(self, test_files: &[Utf8PathBuf]) -> Option<PhaseReport> {
        let phase = match self.when.as_deref() {
            Some("setup") => Phase::Setup,
            Some("call") => Phase::Call,
            Some("teardown") => Phase::Teardown,
            other => {
                debug!("skipping report for unknown phase {other:?}");
                return None;
            }
        };
        // anything the engine does not call failed (passes, skips) is
        // non-terminal for the record
        let outcome = if self.outcome == "failed" {
            PhaseOutcome::Failed
        } else {
            PhaseOutcome::Passed
        };
        let output = captured_stdout(&self.sections);
        let failure = self.longrepr.as_ref().and_then(failure_detail);
        let id = TestId::new(self.nodeid);
        let source_file = resolve_source(id.source_segment(), test_files);
        Some(PhaseReport {
            id,
            phase,
            outcome,
            output,
            failure,
            source_file,
        })
    }
}

#[derive(Debug, Deserialize)]
struct CollectReportRecord {
    #[serde(default)]
    #[expect(dead_code)]
    nodeid: String,
    outcome: String,
    #[serde(default)]
    longrepr: Option<Value>,
}

/// Joins the bodies of every captured-stdout section.
fn captured_stdout(sections: &[(String, String)]) -> Option<String> {
    let mut out = String::new();
    for (title, body) in sections {
        if title.starts_with("Captured stdout") {
            out.push_str(body);
        }
    }
    (!out.is_empty()).then_some(out)
}

/// Converts the engine's serialized longrepr into a [`FailureDetail`].
///
/// The engine serializes either a plain string or a structured traceback
/// (`reprtraceback` with per-entry line lists, `reprcrash` with the crash
/// location). Unknown shapes read as "no detail".
fn failure_detail(longrepr: &Value) -> Option<FailureDetail> {
    match longrepr {
        Value::String(text) => Some(FailureDetail {
            traceback: text.clone(),
            crash: None,
        }),
        Value::Object(map) => {
            let traceback = render_traceback(map.get("reprtraceback")?);
            let crash = map.get("reprcrash").and_then(crash_location);
            Some(FailureDetail { traceback, crash })
        }
        _ => None,
    }
}

fn render_traceback(reprtraceback: &Value) -> String {
    let mut lines: Vec<&str> = Vec::new();
    if let Some(entries) = reprtraceback.get("reprentries").and_then(Value::as_array) {
        for entry in entries {
            let entry_lines = entry
                .get("data")
                .and_then(|data| data.get("lines"))
                .and_then(Value::as_array);
            if let Some(entry_lines) = entry_lines {
                lines.extend(entry_lines.iter().filter_map(Value::as_str));
            }
        }
    }
    lines.join("\n")
}

fn crash_location(reprcrash: &Value) -> Option<CrashLocation> {
    Some(CrashLocation {
        path: reprcrash.get("path")?.as_str()?.into(),
        line: reprcrash.get("lineno")?.as_u64()?,
        message: reprcrash.get("message")?.as_str()?.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locate::StaticLocator;
    use crate::reporter::ResultsAggregator;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use verdict_metadata::{RunStatusSummary, TestStatusSummary};

    fn replay(log: &str) -> ResultsAggregator<StaticLocator> {
        let mut aggregator = ResultsAggregator::with_cwd(StaticLocator::default(), None);
        replay_report_log(log.as_bytes(), &[], &mut aggregator);
        aggregator
    }

    #[test]
    fn passing_run_replays_to_passing_records() {
        let log = indoc! {r#"
            {"$report_type": "SessionStart", "pytest_version": "8.0.0"}
            {"$report_type": "CollectReport", "nodeid": "", "outcome": "passed"}
            {"$report_type": "TestReport", "nodeid": "a_test.py::test_one", "when": "setup", "outcome": "passed", "sections": []}
            {"$report_type": "TestReport", "nodeid": "a_test.py::test_one", "when": "call", "outcome": "passed", "sections": [["Captured stdout call", "Hello\n"]]}
            {"$report_type": "TestReport", "nodeid": "a_test.py::test_one", "when": "teardown", "outcome": "passed", "sections": []}
            {"$report_type": "SessionFinish", "exitstatus": 0}
        "#};
        let mut aggregator = replay(log);
        aggregator.run_finished(EngineExit::Ok);

        let summary = aggregator.into_summary();
        assert_eq!(summary.status, RunStatusSummary::Pass);
        assert_eq!(summary.tests.len(), 1);
        assert_eq!(summary.tests[0].name, "test_one");
        assert_eq!(summary.tests[0].output.as_deref(), Some("Hello\n"));
    }

    #[test]
    fn structured_longrepr_becomes_a_message() {
        let log = indoc! {r#"
            {"$report_type": "TestReport", "nodeid": "a_test.py::test_two", "when": "call", "outcome": "failed", "sections": [], "longrepr": {"reprcrash": {"path": "/work/a_test.py", "lineno": 7, "message": "AssertionError: expected 1, got 2"}, "reprtraceback": {"reprentries": [{"type": "ReprEntry", "data": {"lines": ["    def test_two():", ">       assert f() == 1", "E       AssertionError: expected 1, got 2"]}}], "style": "long"}}}
        "#};
        let mut aggregator = replay(log);
        aggregator.run_finished(EngineExit::TestsFailed);

        let summary = aggregator.into_summary();
        assert_eq!(summary.status, RunStatusSummary::Fail);
        let test = &summary.tests[0];
        assert_eq!(test.status, TestStatusSummary::Fail);
        assert_eq!(
            test.message.as_deref(),
            Some("    def test_two():\n>       assert f() == 1\n        AssertionError: expected 1, got 2")
        );
    }

    #[test]
    fn failed_collect_report_is_a_run_level_fault() {
        let log = indoc! {r#"
            {"$report_type": "CollectReport", "nodeid": "a_test.py", "outcome": "failed", "longrepr": "ImportError: cannot import name 'f'"}
        "#};
        let mut aggregator = replay(log);
        aggregator.run_finished(EngineExit::Interrupted);

        let summary = aggregator.into_summary();
        assert_eq!(summary.status, RunStatusSummary::Error);
        assert_eq!(
            summary.message.as_deref(),
            Some("ImportError: cannot import name 'f'")
        );
    }

    #[test]
    fn malformed_records_are_skipped() {
        let log = indoc! {r#"
            not json at all
            {"$report_type": "TestReport", "nodeid": "a_test.py::test_ok", "when": "call", "outcome": "passed", "sections": []}
            {"$report_type": "WhoKnows", "field": 1}
        "#};
        let mut aggregator = replay(log);
        aggregator.run_finished(EngineExit::Ok);

        let summary = aggregator.into_summary();
        assert_eq!(summary.tests.len(), 1);
        assert_eq!(summary.tests[0].status, TestStatusSummary::Pass);
    }

    #[test]
    fn skips_are_not_failures() {
        let log = indoc! {r#"
            {"$report_type": "TestReport", "nodeid": "a_test.py::test_skipped", "when": "setup", "outcome": "skipped", "sections": []}
            {"$report_type": "TestReport", "nodeid": "a_test.py::test_skipped", "when": "teardown", "outcome": "passed", "sections": []}
        "#};
        let mut aggregator = replay(log);
        aggregator.run_finished(EngineExit::Ok);

        let summary = aggregator.into_summary();
        assert_eq!(summary.tests[0].status, TestStatusSummary::Pass);
    }

    #[test]
    fn stdout_sections_are_joined() {
        let sections = vec![
            ("Captured stdout setup".to_owned(), "from setup\n".to_owned()),
            ("Captured stderr call".to_owned(), "ignored\n".to_owned()),
            ("Captured stdout call".to_owned(), "from call\n".to_owned()),
        ];
        assert_eq!(
            captured_stdout(&sections).as_deref(),
            Some("from setup\nfrom call\n")
        );
        assert_eq!(captured_stdout(&[]), None);
    }

    #[test]
    fn source_resolution_prefers_invoked_files() {
        let test_files = vec![Utf8PathBuf::from("/exercises/two-fer/two_fer_test.py")];
        assert_eq!(
            resolve_source("two_fer_test.py", &test_files),
            Utf8PathBuf::from("/exercises/two-fer/two_fer_test.py")
        );
        assert_eq!(
            resolve_source("other_test.py", &test_files),
            Utf8PathBuf::from("other_test.py")
        );
    }
}
