// Copyright (c) The verdict Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use thiserror::Error;
use tracing::error;
use verdict_metadata::VerdictExitCode;
use verdict_runner::errors::{WriteResultsError, display_error_chain};

/// An error in setting up or finishing a verdict invocation, as opposed to
/// a fault inside the run (those end up in the results document).
#[derive(Debug, Error)]
pub enum ExpectedError {
    /// The `--engine` command could not be parsed.
    #[error("invalid engine command `{command}`")]
    EngineCommand {
        /// The command as given.
        command: String,
        /// The underlying error.
        #[source]
        error: shell_words::ParseError,
    },

    /// The results document could not be written.
    #[error(transparent)]
    WriteResults {
        /// The underlying error.
        #[from]
        error: WriteResultsError,
    },
}

impl ExpectedError {
    /// The process exit code this error maps to.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            ExpectedError::EngineCommand { .. } => VerdictExitCode::SETUP_ERROR,
            ExpectedError::WriteResults { .. } => VerdictExitCode::WRITE_OUTPUT_ERROR,
        }
    }

    /// Logs this error, with its cause chain, to stderr.
    pub fn display_to_stderr(&self) {
        error!("{}", display_error_chain(self));
    }
}
