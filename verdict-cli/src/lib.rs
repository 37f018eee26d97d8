// Copyright (c) The verdict Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-test verdicts from a test engine's report stream.
//!
//! `verdict` runs an exercise's tests through an external execution engine
//! and writes one `results.json` per run for automated grading pipelines.
//! See `verdict-runner` for the aggregation semantics.

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
