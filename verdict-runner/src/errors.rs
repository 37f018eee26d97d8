// Copyright (c) The verdict Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by verdict.

use camino::Utf8PathBuf;
use std::io;
use thiserror::Error;

/// An error that occurred while invoking the execution engine.
///
/// Engine errors are recovered by the driver into the run-level error
/// message of the results document; they never abort a run.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine process could not be spawned or waited on.
    #[error("failed to run engine command `{command}`")]
    Spawn {
        /// The command that failed, for diagnostics.
        command: String,
        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// No scratch directory could be created for the report log.
    #[error("failed to create a scratch directory for the report log")]
    ScratchDir {
        /// The underlying error.
        #[source]
        error: io::Error,
    },
}

impl EngineError {
    pub fn spawn(command: impl Into<String>, error: io::Error) -> Self {
        Self::Spawn {
            command: command.into(),
            error,
        }
    }
}

/// An error writing the results document.
///
/// This is the one fault a verdict run does not recover from: a run whose
/// results cannot be written has produced nothing.
#[derive(Debug, Error)]
pub enum WriteResultsError {
    /// The results document could not be serialized.
    #[error("failed to serialize the results document")]
    Serialize {
        /// The underlying error.
        #[from]
        error: serde_json::Error,
    },

    /// The results file could not be written or its permissions not set.
    #[error("failed to write results to `{path}`")]
    Write {
        /// The path that could not be written.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        error: io::Error,
    },
}

/// Renders an error and its source chain on one line, `: `-separated.
pub fn display_error_chain(error: &dyn std::error::Error) -> String {
    let mut out = error.to_string();
    let mut source = error.source();
    while let Some(error) = source {
        out.push_str(": ");
        out.push_str(&error.to_string());
        source = error.source();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_chain_is_flattened() {
        let inner = io::Error::new(io::ErrorKind::NotFound, "no such file");
        let error = EngineError::spawn("python3 -m pytest", inner);
        assert_eq!(
            display_error_chain(&error),
            "failed to run engine command `python3 -m pytest`: no such file"
        );
    }
}
