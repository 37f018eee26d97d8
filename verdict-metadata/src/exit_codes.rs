// Copyright (c) The verdict Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `verdict` failures.
///
/// A verdict invocation always tries to complete the run and write a results
/// document, even when the run itself errors: test failures and engine
/// faults are reported inside `results.json`, not through the process exit
/// code. These codes cover the cases where no useful document could be
/// produced at all.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum VerdictExitCode {}

impl VerdictExitCode {
    /// A results document was written and verdict exited normally. This says
    /// nothing about whether the tests passed.
    pub const OK: i32 = 0;

    /// A user issue happened while setting up a verdict invocation.
    pub const SETUP_ERROR: i32 = 96;

    /// The results document could not be written to the output directory.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;
}
