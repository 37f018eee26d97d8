// Copyright (c) The verdict Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The execution-engine boundary.
//!
//! verdict does not discover, select or execute tests itself; an engine
//! does, and reports what happened through the
//! [`RunObserver`](crate::reporter::RunObserver) trait. [`TestEngine`] is
//! the driver-facing side of that collaboration: run these files with these
//! arguments, report into this observer, and signal how the run ended.
//!
//! [`ReportLogEngine`] is the production implementation, driving a
//! pytest-style engine process over its machine-readable report log.

mod report_log;

pub use report_log::ReportLogEngine;

use crate::{errors::EngineError, reporter::RunObserver};
use camino::Utf8PathBuf;

/// A test-execution engine.
///
/// Implementations own the whole run: they establish execution order by
/// calling [`RunObserver::collection_ready`], report each phase of each
/// test, and finish with [`RunObserver::run_finished`]. An `Err` return
/// means the engine could not be driven at all (for example, its process
/// could not be spawned); everything the engine itself diagnoses flows
/// through the observer instead.
pub trait TestEngine {
    /// Runs the given test files with the given (already sanitized)
    /// arguments, reporting into `observer`.
    fn execute(
        &self,
        args: &[String],
        test_files: &[Utf8PathBuf],
        observer: &mut dyn RunObserver,
    ) -> Result<(), EngineError>;
}
