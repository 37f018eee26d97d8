// Copyright (c) The verdict Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Documented, machine-readable formats for verdict results.
//!
//! A verdict run produces one results document per invocation, consumed by
//! automated grading pipelines. This crate owns the field names and shape of
//! that document; the aggregation logic that fills it in lives in
//! `verdict-runner`.

#![warn(missing_docs)]

mod exit_codes;

pub use exit_codes::VerdictExitCode;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// The version of the results document emitted by this crate.
///
/// Version 2 added the per-test `test_code` field.
pub const RESULTS_FORMAT_VERSION: u32 = 2;

/// The results document for a whole run.
///
/// Serialized to `results.json` in the output directory. The aggregate
/// `status` reflects the most severe thing that happened during the run:
/// every test passing is `pass`, at least one failing or erroring test is
/// `fail`, and a fault not attributable to any single test is `error`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// The version of the results format.
    pub version: u32,

    /// The aggregate status of the run.
    pub status: RunStatusSummary,

    /// A run-level error message.
    ///
    /// Present if and only if `status` is [`RunStatusSummary::Error`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Per-test results, in the order the engine first reported each test.
    pub tests: Vec<TestSummary>,
}

impl RunSummary {
    /// Creates a new summary with the current format version, a `pass`
    /// status and no tests.
    pub fn new() -> Self {
        Self {
            version: RESULTS_FORMAT_VERSION,
            status: RunStatusSummary::Pass,
            message: None,
            tests: Vec::new(),
        }
    }

    /// Parses a results document from a JSON string.
    pub fn parse_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serializes this document to a pretty-printed JSON string.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for RunSummary {
    fn default() -> Self {
        Self::new()
    }
}

/// The aggregate status of a run.
///
/// Forms part of [`RunSummary`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatusSummary {
    /// Every reported test passed.
    Pass,

    /// At least one test failed or errored.
    Fail,

    /// The run could not be completed.
    Error,
}

/// The result of a single test.
///
/// Forms part of [`RunSummary`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TestSummary {
    /// The test name: the engine identifier with its leading module segment
    /// stripped, remaining segments joined with `.`.
    pub name: SmolStr,

    /// The final verdict for this test.
    pub status: TestStatusSummary,

    /// The diagnostic message attached to a failed or errored test.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Standard output captured while the test ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// The literal source text of the test function, if it could be
    /// resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_code: Option<String>,
}

/// The final verdict for a single test.
///
/// Forms part of [`TestSummary`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatusSummary {
    /// All executed phases of the test passed.
    Pass,

    /// The test's call phase failed: an assertion did not hold.
    Fail,

    /// The test's environment could not be established: its setup or
    /// teardown phase failed.
    Error,
}
