// Copyright (c) The verdict Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for [verdict](https://crates.io/crates/verdict-cli).
//!
//! verdict adapts the multi-phase report stream of an external
//! test-execution engine into one stable, machine-readable verdict per test.
//! The engine owns discovery, assertion evaluation and execution; this crate
//! owns the aggregation: exactly one final status per test name, with
//! defined precedence across phases and repeated reports, captured output,
//! normalized diagnostics, and deterministic declaration-order sorting.
//!
//! The main entry point is [`driver::run_tests`], which wires an engine
//! implementation to a [`reporter::ResultsAggregator`] and writes the
//! resulting results document.

pub mod config;
pub mod driver;
pub mod engine;
pub mod errors;
pub mod locate;
pub mod reporter;
pub mod sanitize;
