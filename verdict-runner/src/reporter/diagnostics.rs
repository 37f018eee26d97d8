// Copyright (c) The verdict Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Normalization of engine-supplied failure diagnostics.

use crate::reporter::events::FailureDetail;
use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use std::sync::LazyLock;

/// The engine marks the failing line of an assertion with `E ` at the start
/// of the line. Downstream consumers get a plain two-space indent instead.
static FAILING_LINE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^E ").expect("marker regex is valid"));

/// Renders an engine failure into normalized diagnostic text.
///
/// The marker replacement and dedent always run. Path relativization runs
/// only when a crash locator is present and the crash path shares a
/// non-trivial directory prefix with `cwd`: every occurrence of that prefix
/// is replaced with `.`, so no absolute directory structure leaks into the
/// results document. Never fails.
pub(crate) fn format_failure(detail: &FailureDetail, cwd: Option<&Utf8Path>) -> String {
    let message = FAILING_LINE_MARKER.replace_all(&detail.traceback, "  ");
    let message = dedent(&message);

    let (Some(crash), Some(cwd)) = (&detail.crash, cwd) else {
        return message;
    };
    match common_dir_prefix(cwd, &crash.path) {
        Some(prefix) => message.replace(prefix.as_str(), "."),
        None => message,
    }
}

/// Strips the longest common leading whitespace from every line.
///
/// Lines consisting solely of whitespace do not participate in the common
/// prefix, matching the engine's own dedent semantics.
fn dedent(text: &str) -> String {
    let prefix = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| &line[..line.len() - line.trim_start().len()])
        .reduce(common_str_prefix);
    let Some(prefix) = prefix.filter(|prefix| !prefix.is_empty()) else {
        return text.to_owned();
    };

    let mut out = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        out.push_str(line.strip_prefix(prefix).unwrap_or_else(|| {
            // whitespace-only line, possibly shorter than the prefix
            line.trim_start_matches(|c: char| c.is_whitespace() && c != '\n')
        }));
    }
    out
}

fn common_str_prefix<'a>(a: &'a str, b: &'a str) -> &'a str {
    let len = a
        .bytes()
        .zip(b.bytes())
        .take_while(|(x, y)| x == y)
        .count();
    &a[..len]
}

/// The longest common directory prefix of two paths, or `None` if they
/// share nothing beyond a filesystem root.
fn common_dir_prefix(a: &Utf8Path, b: &Utf8Path) -> Option<Utf8PathBuf> {
    let mut prefix = Utf8PathBuf::new();
    let mut named = 0usize;
    for (x, y) in a.components().zip(b.components()) {
        if x != y {
            break;
        }
        prefix.push(x);
        if !matches!(
            x,
            camino::Utf8Component::RootDir | camino::Utf8Component::Prefix(_)
        ) {
            named += 1;
        }
    }
    (named > 0).then_some(prefix)
}
