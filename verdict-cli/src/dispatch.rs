// Copyright (c) The verdict Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{errors::ExpectedError, output::OutputOpts};
use camino::Utf8PathBuf;
use clap::Parser;
use tracing::info;
use verdict_metadata::{RunStatusSummary, VerdictExitCode};
use verdict_runner::{driver, engine::ReportLogEngine, locate::PythonLocator};

/// Run an exercise's tests and write per-test verdicts for grading.
///
/// The process exit code says whether a results document was produced, not
/// whether the tests passed: test failures and engine faults are reported
/// inside `results.json`.
#[derive(Debug, Parser)]
#[command(name = "verdict", version, about)]
pub struct VerdictApp {
    #[command(flatten)]
    output: OutputOpts,

    /// The exercise slug, e.g. `two-fer`.
    slug: String,

    /// Directory containing the solution under test (and optionally
    /// `.meta/config.json` naming its test files).
    input_dir: Utf8PathBuf,

    /// Directory the results document is written to.
    output_dir: Utf8PathBuf,

    /// The engine command, split shell-style.
    #[arg(long, value_name = "COMMAND", default_value = "python3 -m pytest", env = "VERDICT_ENGINE")]
    engine: String,

    /// Extra arguments passed through to the engine (after sanitization).
    #[arg(last = true, value_name = "ENGINE_ARGS")]
    engine_args: Vec<String>,
}

impl VerdictApp {
    /// Executes the run. Returns the process exit code.
    pub fn exec(self) -> Result<i32, ExpectedError> {
        self.output.init();

        let program =
            shell_words::split(&self.engine).map_err(|error| ExpectedError::EngineCommand {
                command: self.engine.clone(),
                error,
            })?;
        let engine = ReportLogEngine::new(program);

        let summary = driver::run_tests(
            &engine,
            PythonLocator::new(),
            &self.slug,
            &self.input_dir,
            &self.output_dir,
            &self.engine_args,
        )?;

        match summary.status {
            RunStatusSummary::Pass => info!("{}: all tests passed", self.slug),
            RunStatusSummary::Fail => info!("{}: some tests failed", self.slug),
            RunStatusSummary::Error => info!("{}: run errored", self.slug),
        }
        info!("generated {}", self.output_dir.join(driver::RESULTS_FILE));

        Ok(VerdictExitCode::OK)
    }
}
