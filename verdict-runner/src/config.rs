// Copyright (c) The verdict Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Exercise configuration.
//!
//! An exercise directory may carry a `.meta/config.json` naming its test
//! files. Only the `files.test` list is interpreted here; everything else in
//! the document belongs to other tools and is ignored. A missing, unreadable
//! or unparseable config falls back to a single test file derived from the
//! exercise slug.

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use tracing::debug;

/// The directory an exercise keeps its metadata in.
pub const CONFIG_DIR: &str = ".meta";

/// The config file name within [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.json";

/// The parts of an exercise config that verdict interprets.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ExerciseConfig {
    #[serde(default)]
    files: ConfigFiles,
}

#[derive(Clone, Debug, Default, Deserialize)]
struct ConfigFiles {
    #[serde(default)]
    test: Vec<String>,
}

impl ExerciseConfig {
    /// Loads the config from an exercise directory, if present and
    /// parseable.
    pub fn load(input_dir: &Utf8Path) -> Option<Self> {
        let config_file = input_dir.join(CONFIG_DIR).join(CONFIG_FILE);
        let text = fs_err::read_to_string(config_file.as_std_path()).ok()?;
        match serde_json::from_str(&text) {
            Ok(config) => Some(config),
            Err(error) => {
                debug!("ignoring unparseable config at {config_file}: {error}");
                None
            }
        }
    }

    /// The configured test files, relative to the exercise directory.
    pub fn test_files(&self) -> &[String] {
        &self.files.test
    }
}

/// The default test file name for a slug: `-` becomes `_`, with a fixed
/// suffix appended (`two-fer` → `two_fer_test.py`).
pub fn default_test_file(slug: &str) -> String {
    format!("{}_test.py", slug.replace('-', "_"))
}

/// Resolves the test files for one run: the config's list when it names
/// any, the derived default otherwise. The result may point at files that
/// do not exist; the engine is expected to surface that as a collection
/// fault through the normal reporting path.
pub fn resolve_test_files(slug: &str, input_dir: &Utf8Path) -> Vec<Utf8PathBuf> {
    let mut test_files: Vec<Utf8PathBuf> = ExerciseConfig::load(input_dir)
        .map(|config| {
            config
                .test_files()
                .iter()
                .map(|file| input_dir.join(file))
                .collect()
        })
        .unwrap_or_default();
    if test_files.is_empty() {
        test_files.push(input_dir.join(default_test_file(slug)));
    }
    test_files
}
