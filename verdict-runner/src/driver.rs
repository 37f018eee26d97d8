// Copyright (c) The verdict Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The run driver: one engine invocation, one results document.

use crate::{
    config,
    engine::TestEngine,
    errors::{WriteResultsError, display_error_chain},
    locate::TestLocator,
    reporter::{EngineExit, FailureDetail, PhaseOutcome, ResultsAggregator, RunObserver},
    sanitize::sanitize_args,
};
use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, warn};
use verdict_metadata::RunSummary;

/// The results file name within the output directory.
pub const RESULTS_FILE: &str = "results.json";

/// The permission mode of the results file: read-write for owner and
/// group, read-only for others.
#[cfg(unix)]
const RESULTS_FILE_MODE: u32 = 0o664;

/// Runs the tests for one exercise and writes its results document.
///
/// Test files come from the exercise config when it names any, else from
/// the slug-derived default; a path that does not exist is passed to the
/// engine as-is, which surfaces a collection fault through the normal
/// reporting path. Engine faults of any kind are folded into the document
/// rather than propagated: the only error this returns is an unwritable
/// output path.
pub fn run_tests<L: TestLocator>(
    engine: &dyn TestEngine,
    locator: L,
    slug: &str,
    input_dir: &Utf8Path,
    output_dir: &Utf8Path,
    args: &[String],
) -> Result<RunSummary, WriteResultsError> {
    let test_files = config::resolve_test_files(slug, input_dir);
    debug!("running {slug} against {test_files:?}");
    let args = sanitize_args(args.iter().cloned());

    let mut aggregator = ResultsAggregator::new(locator);
    if let Err(error) = engine.execute(&args, &test_files, &mut aggregator) {
        warn!("engine invocation failed: {error}");
        aggregator.fatal_exception(
            PhaseOutcome::Failed,
            &FailureDetail {
                traceback: display_error_chain(&error),
                crash: None,
            },
        );
        aggregator.run_finished(EngineExit::InternalError);
    }

    let summary = aggregator.into_summary();
    write_results(&summary, output_dir)?;
    Ok(summary)
}

/// Writes the results document to [`RESULTS_FILE`] in `output_dir` and sets
/// its permission mode.
pub fn write_results(
    summary: &RunSummary,
    output_dir: &Utf8Path,
) -> Result<Utf8PathBuf, WriteResultsError> {
    let path = output_dir.join(RESULTS_FILE);
    let json = summary.to_json_string()?;
    fs_err::write(path.as_std_path(), json).map_err(|error| WriteResultsError::Write {
        path: path.clone(),
        error,
    })?;
    set_results_mode(&path)?;
    Ok(path)
}

#[cfg(unix)]
fn set_results_mode(path: &Utf8Path) -> Result<(), WriteResultsError> {
    use std::os::unix::fs::PermissionsExt;
    fs_err::set_permissions(
        path.as_std_path(),
        std::fs::Permissions::from_mode(RESULTS_FILE_MODE),
    )
    .map_err(|error| WriteResultsError::Write {
        path: path.to_owned(),
        error,
    })
}

#[cfg(not(unix))]
fn set_results_mode(_path: &Utf8Path) -> Result<(), WriteResultsError> {
    Ok(())
}
