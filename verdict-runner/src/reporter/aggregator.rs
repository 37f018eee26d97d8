// Copyright (c) The verdict Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The results aggregation state machine.

use crate::{
    locate::TestLocator,
    reporter::{
        diagnostics,
        events::{
            CollectedTest, EngineExit, FailureDetail, Phase, PhaseOutcome, PhaseReport,
            RunObserver,
        },
    },
};
use camino::Utf8PathBuf;
use indexmap::IndexMap;
use smol_str::SmolStr;
use tracing::debug;
use verdict_metadata::{RunStatusSummary, RunSummary, TestStatusSummary, TestSummary};

/// The final classification of one test.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum TestStatus {
    Passed,
    Failed,
    Errored,
}

/// Aggregation state for one distinct test name.
///
/// Created on the first report referencing the name, mutated in place for
/// the remainder of the run. Once the status leaves `Passed` it never
/// returns: further status and message updates are ignored, though captured
/// output may still be refreshed by later reports.
#[derive(Clone, Debug)]
struct TestRecord {
    name: SmolStr,
    status: TestStatus,
    message: Option<String>,
    output: Option<String>,
    test_code: Option<String>,
}

impl TestRecord {
    fn new(name: SmolStr) -> Self {
        Self {
            name,
            status: TestStatus::Passed,
            message: None,
            output: None,
            test_code: None,
        }
    }

    fn is_passing(&self) -> bool {
        self.status == TestStatus::Passed
    }

    fn fail(&mut self, message: Option<String>) {
        self.status = TestStatus::Failed;
        self.message = message;
    }

    fn error(&mut self, message: Option<String>) {
        self.status = TestStatus::Errored;
        self.message = message;
    }

    fn to_summary(&self) -> TestSummary {
        TestSummary {
            name: self.name.clone(),
            status: match self.status {
                TestStatus::Passed => TestStatusSummary::Pass,
                TestStatus::Failed => TestStatusSummary::Fail,
                TestStatus::Errored => TestStatusSummary::Error,
            },
            message: self.message.clone(),
            output: self.output.clone(),
            test_code: self.test_code.clone(),
        }
    }
}

/// Folds an engine's lifecycle events into a [`RunSummary`].
///
/// One aggregator is constructed per run and owned by the driver for that
/// run's duration. Every mutation is total: no event, however malformed,
/// aborts aggregation, and a partial summary can be taken at any point if
/// the engine dies early.
pub struct ResultsAggregator<L> {
    locator: L,
    tests: IndexMap<SmolStr, TestRecord>,
    last_error: Option<String>,
    finished: Option<RunSummary>,
    cwd: Option<Utf8PathBuf>,
}

impl<L: TestLocator> ResultsAggregator<L> {
    /// Creates an aggregator anchored to the process working directory.
    pub fn new(locator: L) -> Self {
        let cwd = std::env::current_dir()
            .ok()
            .and_then(|dir| Utf8PathBuf::try_from(dir).ok());
        Self::with_cwd(locator, cwd)
    }

    /// Creates an aggregator with an explicit anchor for path
    /// relativization. `None` disables relativization.
    pub fn with_cwd(locator: L, cwd: Option<Utf8PathBuf>) -> Self {
        Self {
            locator,
            tests: IndexMap::new(),
            last_error: None,
            finished: None,
            cwd,
        }
    }

    /// Takes the summary for this run.
    ///
    /// If the engine never signalled [`RunObserver::run_finished`] (it died
    /// mid-run), a summary is synthesized from whatever partial state
    /// exists: records are snapshotted in creation order and the aggregate
    /// status is derived from them.
    pub fn into_summary(mut self) -> RunSummary {
        if let Some(summary) = self.finished.take() {
            return summary;
        }
        debug!("engine never signalled run-finished, snapshotting partial state");
        let exit = if self.last_error.is_some() {
            EngineExit::InternalError
        } else if self.tests.values().all(TestRecord::is_passing) {
            EngineExit::Ok
        } else {
            EngineExit::TestsFailed
        };
        self.run_finished(exit);
        self.finished.take().expect("run_finished stores a summary")
    }

    fn format_failure(&self, detail: &FailureDetail) -> String {
        diagnostics::format_failure(detail, self.cwd.as_deref())
    }
}

impl<L: TestLocator> RunObserver for ResultsAggregator<L> {
    fn collection_ready(&mut self, items: &mut Vec<CollectedTest>) {
        // Stable: tests sharing a declaration line (or missing one) keep
        // their original relative order.
        items.sort_by_key(|item| {
            self.locator
                .declaration_line(&item.id, &item.source_file)
                .unwrap_or(u64::MAX)
        });
    }

    fn phase_report(&mut self, report: &PhaseReport) {
        let name = report.id.test_name();
        let record = self
            .tests
            .entry(name.clone())
            .or_insert_with(|| TestRecord::new(name));

        // successful setup and teardown stages carry nothing of interest
        if report.outcome == PhaseOutcome::Passed && report.phase != Phase::Call {
            return;
        }

        if let Some(output) = report.output.as_deref().filter(|output| !output.is_empty()) {
            record.output = Some(output.to_owned());
        }

        // The first terminal report is authoritative; later failures for
        // the same name may still refresh the captured output above.
        if record.is_passing() && report.outcome == PhaseOutcome::Failed {
            let message = report
                .failure
                .as_ref()
                .map(|detail| diagnostics::format_failure(detail, self.cwd.as_deref()));
            if report.phase == Phase::Call {
                record.fail(message);
            } else {
                // the environment could not be established, which is
                // categorically distinct from an assertion failure
                record.error(message);
            }
        }

        if let Some(code) = self.locator.test_code(&report.id, &report.source_file) {
            record.test_code = Some(code);
        }
    }

    fn fatal_exception(&mut self, outcome: PhaseOutcome, detail: &FailureDetail) {
        if outcome == PhaseOutcome::Failed {
            self.last_error = Some(self.format_failure(detail));
        }
    }

    fn run_finished(&mut self, exit: EngineExit) {
        let mut summary = RunSummary::new();
        match exit {
            EngineExit::TestsFailed => {
                summary.status = RunStatusSummary::Fail;
            }
            EngineExit::Ok => {}
            exit => {
                summary.status = RunStatusSummary::Error;
                summary.message = Some(self.last_error.clone().unwrap_or_else(|| {
                    format!("unexpected engine exit ({exit}): check logs for details")
                }));
            }
        }
        summary.tests = self.tests.values().map(TestRecord::to_summary).collect();
        self.finished = Some(summary);
    }
}
