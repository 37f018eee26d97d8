// Copyright (c) The verdict Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Report aggregation for verdict.
//!
//! The types in this module sit between a test-execution engine and the
//! results document. An engine adapter translates engine-native callbacks
//! into calls on the [`RunObserver`] trait; [`ResultsAggregator`] is the
//! observer implementation that folds those calls into a
//! [`RunSummary`](verdict_metadata::RunSummary).

mod aggregator;
mod diagnostics;
pub mod events;

pub use aggregator::ResultsAggregator;
pub use events::{
    CollectedTest, CrashLocation, EngineExit, FailureDetail, Phase, PhaseOutcome, PhaseReport,
    RunObserver, TestId,
};
