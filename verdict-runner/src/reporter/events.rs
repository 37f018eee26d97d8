// Copyright (c) The verdict Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The lifecycle events a test-execution engine reports to verdict.
//!
//! Engines address tests by hierarchical identifiers and report each test in
//! up to three phases. The [`RunObserver`] trait has one method per
//! lifecycle event; an engine adapter (see [`crate::engine`]) translates
//! engine-native callbacks into these calls, in the engine's own order.

use camino::Utf8PathBuf;
use smol_str::SmolStr;
use std::fmt;

/// An opaque hierarchical identifier for one test, as produced by the
/// execution engine.
///
/// The identifier consists of `::`-separated segments: the source file
/// first, then any enclosing classes, then the test function, possibly with
/// a parametrization suffix in square brackets (for example
/// `word_count_test.py::WordCountTest::test_count[2-3]`).
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct TestId(SmolStr);

impl TestId {
    /// Creates a new identifier from an engine-supplied string.
    pub fn new(raw: impl Into<SmolStr>) -> Self {
        Self(raw.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The source file segment of the identifier, as the engine spelled it.
    pub fn source_segment(&self) -> &str {
        self.0.split("::").next().unwrap_or("")
    }

    /// The test name used as the results key: the identifier with its
    /// leading source segment stripped and the remaining segments joined
    /// with `.`.
    pub fn test_name(&self) -> SmolStr {
        let mut name = String::new();
        for segment in self.0.split("::").skip(1) {
            if !name.is_empty() {
                name.push('.');
            }
            name.push_str(segment);
        }
        name.into()
    }

    /// The `.`-joined path of the test function within its file, with any
    /// parametrization suffix stripped from the last segment. Used to match
    /// the identifier against source declarations.
    pub fn function_path(&self) -> Option<String> {
        let mut segments = self.0.split("::").skip(1).peekable();
        segments.peek()?;
        let mut path = String::new();
        while let Some(segment) = segments.next() {
            let segment = if segments.peek().is_none() {
                segment.split('[').next().unwrap_or(segment)
            } else {
                segment
            };
            if !path.is_empty() {
                path.push('.');
            }
            path.push_str(segment);
        }
        Some(path)
    }
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A test discovered during collection, before any phase has run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CollectedTest {
    /// The engine identifier for the test.
    pub id: TestId,

    /// The file the test was collected from.
    pub source_file: Utf8PathBuf,
}

/// A sub-step of executing a single test.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Phase {
    /// Establishing the test's environment.
    Setup,

    /// Running the test function itself.
    Call,

    /// Tearing the environment back down.
    Teardown,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Setup => write!(f, "setup"),
            Phase::Call => write!(f, "call"),
            Phase::Teardown => write!(f, "teardown"),
        }
    }
}

/// The outcome of a single phase.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PhaseOutcome {
    /// The phase completed without a fault.
    Passed,

    /// The phase raised or an assertion did not hold.
    Failed,
}

/// One phase report for one test.
#[derive(Clone, Debug)]
pub struct PhaseReport {
    /// The engine identifier for the test.
    pub id: TestId,

    /// Which phase this report describes.
    pub phase: Phase,

    /// The outcome of the phase.
    pub outcome: PhaseOutcome,

    /// Standard output captured during the phase, if any.
    pub output: Option<String>,

    /// The engine's representation of the fault, present when the phase
    /// failed and the engine had a traceback to attach.
    pub failure: Option<FailureDetail>,

    /// The file the test originates from, used for best-effort source
    /// attachment.
    pub source_file: Utf8PathBuf,
}

/// An engine-supplied traceback plus an optional crash locator.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FailureDetail {
    /// The traceback, rendered to text by the engine.
    pub traceback: String,

    /// Where the fault surfaced, if the engine knows.
    pub crash: Option<CrashLocation>,
}

/// The location at which a fault surfaced.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CrashLocation {
    /// The file the fault surfaced in.
    pub path: Utf8PathBuf,

    /// The 1-based line number of the fault.
    pub line: u64,

    /// The engine's short reason for the fault.
    pub message: String,
}

/// The exit status of an engine run.
///
/// The numeric codes follow the engine's documented exit statuses; anything
/// else is carried through as [`EngineExit::Other`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EngineExit {
    /// The run completed and every test passed.
    Ok,

    /// The run completed and at least one test failed.
    TestsFailed,

    /// The run was interrupted.
    Interrupted,

    /// The engine hit an internal fault.
    InternalError,

    /// The engine was invoked incorrectly.
    UsageError,

    /// The engine collected no tests at all.
    NoTestsCollected,

    /// Any exit code outside the engine's documented set.
    Other(i32),
}

impl EngineExit {
    /// Maps an engine process exit code to its meaning.
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => EngineExit::Ok,
            1 => EngineExit::TestsFailed,
            2 => EngineExit::Interrupted,
            3 => EngineExit::InternalError,
            4 => EngineExit::UsageError,
            5 => EngineExit::NoTestsCollected,
            code => EngineExit::Other(code),
        }
    }
}

impl fmt::Display for EngineExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineExit::Ok => write!(f, "ok"),
            EngineExit::TestsFailed => write!(f, "tests failed"),
            EngineExit::Interrupted => write!(f, "interrupted"),
            EngineExit::InternalError => write!(f, "internal error"),
            EngineExit::UsageError => write!(f, "usage error"),
            EngineExit::NoTestsCollected => write!(f, "no tests collected"),
            EngineExit::Other(code) => write!(f, "exit code {code}"),
        }
    }
}

/// The lifecycle events of one engine run, in the order the engine drives
/// them.
///
/// Implementations must be total: no method may panic, whatever the engine
/// reports. The engine's own control flow is the only caller; there are no
/// suspension points and no concurrent mutators.
pub trait RunObserver {
    /// Collection finished. Reorder `items` in place to establish execution
    /// order; the engine runs tests in the order left here. Must not touch
    /// aggregation state.
    fn collection_ready(&mut self, items: &mut Vec<CollectedTest>);

    /// One phase of one test finished.
    fn phase_report(&mut self, report: &PhaseReport);

    /// The engine faulted outside any test phase (collection error,
    /// internal error). May be called several times; the last failed report
    /// wins.
    fn fatal_exception(&mut self, outcome: PhaseOutcome, detail: &FailureDetail);

    /// The run is over. No further events follow.
    fn run_finished(&mut self, exit: EngineExit);
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("kindergarten_garden_test.py::test_full_garden", "test_full_garden"; "plain function")]
    #[test_case("word_count_test.py::WordCountTest::test_count", "WordCountTest.test_count"; "class method")]
    #[test_case("a_test.py::T::test_x[2-3]", "T.test_x[2-3]"; "parametrized keeps suffix")]
    #[test_case("lone_file.py", ""; "no function segments")]
    fn test_name_derivation(raw: &str, expected: &str) {
        assert_eq!(TestId::new(raw).test_name(), expected);
    }

    #[test_case("a_test.py::T::test_x[2-3]", Some("T.test_x"); "parametrization stripped")]
    #[test_case("a_test.py::test_y", Some("test_y"); "plain function")]
    #[test_case("a_test.py", None; "no function segments")]
    fn function_path_derivation(raw: &str, expected: Option<&str>) {
        assert_eq!(TestId::new(raw).function_path().as_deref(), expected);
    }

    #[test]
    fn exit_code_mapping() {
        assert_eq!(EngineExit::from_code(0), EngineExit::Ok);
        assert_eq!(EngineExit::from_code(1), EngineExit::TestsFailed);
        assert_eq!(EngineExit::from_code(5), EngineExit::NoTestsCollected);
        assert_eq!(EngineExit::from_code(77), EngineExit::Other(77));
    }
}
