// Copyright (c) The verdict Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Best-effort mapping from test identities to source declarations.
//!
//! The aggregator uses declaration lines to restore source order for
//! dynamically discovered tests, and attaches the literal test function text
//! to each record. Both lookups are collaborators of the aggregation core:
//! everything here is `Option`-valued and an unreadable or unparseable file
//! simply reads as "not found".

use crate::reporter::events::TestId;
use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use std::{cell::RefCell, collections::HashMap, sync::LazyLock};
use tracing::debug;

/// Resolves test identities to source declarations.
pub trait TestLocator {
    /// The 1-based line the test function is declared on.
    fn declaration_line(&self, id: &TestId, source_file: &Utf8Path) -> Option<u64>;

    /// The literal source text of the test function.
    fn test_code(&self, id: &TestId, source_file: &Utf8Path) -> Option<String>;
}

static DEF_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([ \t]*)(?:async[ \t]+)?def[ \t]+([A-Za-z_]\w*)").expect("def regex is valid")
});
static CLASS_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([ \t]*)class[ \t]+([A-Za-z_]\w*)").expect("class regex is valid")
});

/// A [`TestLocator`] for Python test files.
///
/// Scans a file once, recording every `def`/`async def` with its enclosing
/// `class` qualification (tracked by indentation), and caches the result per
/// path for the lifetime of the locator.
#[derive(Debug, Default)]
pub struct PythonLocator {
    cache: RefCell<HashMap<Utf8PathBuf, Option<FileIndex>>>,
}

impl PythonLocator {
    /// Creates a locator with an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    fn with_index<T>(
        &self,
        source_file: &Utf8Path,
        f: impl FnOnce(&FileIndex) -> Option<T>,
    ) -> Option<T> {
        let mut cache = self.cache.borrow_mut();
        let index = cache
            .entry(source_file.to_owned())
            .or_insert_with(|| match fs_err::read_to_string(source_file.as_std_path()) {
                Ok(text) => Some(FileIndex::scan(&text)),
                Err(error) => {
                    debug!("cannot index {source_file}: {error}");
                    None
                }
            });
        index.as_ref().and_then(f)
    }
}

impl TestLocator for PythonLocator {
    fn declaration_line(&self, id: &TestId, source_file: &Utf8Path) -> Option<u64> {
        let path = id.function_path()?;
        self.with_index(source_file, |index| {
            index.find(&path).map(|def| def.line)
        })
    }

    fn test_code(&self, id: &TestId, source_file: &Utf8Path) -> Option<String> {
        let path = id.function_path()?;
        self.with_index(source_file, |index| {
            index.find(&path).map(|def| def.text.clone())
        })
    }
}

/// One scanned definition: `Class.method` or a bare function name.
#[derive(Clone, Debug)]
struct Definition {
    path: String,
    line: u64,
    text: String,
}

#[derive(Clone, Debug)]
struct FileIndex {
    definitions: Vec<Definition>,
}

impl FileIndex {
    fn scan(text: &str) -> Self {
        let lines: Vec<&str> = text.lines().collect();
        // enclosing (indent, name) scopes, innermost last
        let mut scopes: Vec<(usize, String)> = Vec::new();
        let mut definitions = Vec::new();

        for (idx, line) in lines.iter().enumerate() {
            let (captures, is_def) = match DEF_LINE.captures(line) {
                Some(captures) => (captures, true),
                None => match CLASS_LINE.captures(line) {
                    Some(captures) => (captures, false),
                    None => continue,
                },
            };
            let indent = captures[1].len();
            let name = captures[2].to_owned();
            scopes.retain(|(scope_indent, _)| *scope_indent < indent);

            if is_def {
                let mut path = String::new();
                for (_, scope) in &scopes {
                    path.push_str(scope);
                    path.push('.');
                }
                path.push_str(&name);
                definitions.push(Definition {
                    path,
                    line: idx as u64 + 1,
                    text: body_text(&lines, idx, indent),
                });
            }
            scopes.push((indent, name));
        }

        Self { definitions }
    }

    fn find(&self, path: &str) -> Option<&Definition> {
        self.definitions.iter().find(|def| def.path == path)
    }
}

/// The literal text of a definition: its `def` line through the last
/// following line indented deeper than it, trailing blank lines trimmed.
fn body_text(lines: &[&str], def_idx: usize, def_indent: usize) -> String {
    let mut end = def_idx + 1;
    for (idx, line) in lines.iter().enumerate().skip(def_idx + 1) {
        if line.trim().is_empty() {
            continue;
        }
        let indent = line.len() - line.trim_start().len();
        if indent <= def_indent {
            break;
        }
        end = idx + 1;
    }
    lines[def_idx..end].join("\n")
}

/// A [`TestLocator`] answering from fixed tables. Useful for tests and for
/// embedders whose ordering information comes from somewhere other than
/// source files.
#[derive(Debug, Default)]
pub struct StaticLocator {
    lines: HashMap<String, u64>,
    code: HashMap<String, String>,
}

impl StaticLocator {
    /// Creates a locator mapping full test identifiers to declaration
    /// lines.
    pub fn with_lines<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        Self {
            lines: pairs
                .into_iter()
                .map(|(id, line)| (id.into(), line))
                .collect(),
            code: HashMap::new(),
        }
    }

    /// Adds a test identifier → function text mapping.
    pub fn insert_code(&mut self, id: impl Into<String>, code: impl Into<String>) {
        self.code.insert(id.into(), code.into());
    }
}

impl TestLocator for StaticLocator {
    fn declaration_line(&self, id: &TestId, _source_file: &Utf8Path) -> Option<u64> {
        self.lines.get(id.as_str()).copied()
    }

    fn test_code(&self, id: &TestId, _source_file: &Utf8Path) -> Option<String> {
        self.code.get(id.as_str()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    const EXAMPLE: &str = indoc! {r#"
        import unittest

        from example import hello


        class ExampleTest(unittest.TestCase):
            def test_hello(self):
                self.assertEqual(hello(), "Hello, World!")

            def test_goodbye(self):
                value = hello()

                self.assertEqual(value, "Hello, World!")


        class OtherTest(unittest.TestCase):
            def test_hello(self):
                self.assertEqual(hello(), "Hello, World!")


        def test_module_level():
            assert hello() == "Hello, World!"
    "#};

    #[test]
    fn finds_methods_by_class_qualification() {
        let index = FileIndex::scan(EXAMPLE);
        assert_eq!(index.find("ExampleTest.test_hello").unwrap().line, 7);
        assert_eq!(index.find("OtherTest.test_hello").unwrap().line, 17);
        assert_eq!(index.find("test_module_level").unwrap().line, 21);
        assert!(index.find("test_hello").is_none(), "methods are not bare names");
    }

    #[test]
    fn body_spans_to_dedent() {
        let index = FileIndex::scan(EXAMPLE);
        let def = index.find("ExampleTest.test_goodbye").unwrap();
        // the method's own base indentation is preserved
        assert_eq!(
            def.text,
            "    def test_goodbye(self):\n        value = hello()\n\n        \
             self.assertEqual(value, \"Hello, World!\")"
        );
    }

    #[test]
    fn module_level_function_body() {
        let index = FileIndex::scan(EXAMPLE);
        let def = index.find("test_module_level").unwrap();
        assert_eq!(
            def.text,
            "def test_module_level():\n    assert hello() == \"Hello, World!\""
        );
    }

    #[test]
    fn async_defs_are_recognized() {
        let index = FileIndex::scan("async def test_later():\n    await thing()\n");
        assert_eq!(index.find("test_later").unwrap().line, 1);
    }

    #[test]
    fn unreadable_file_reads_as_not_found() {
        let locator = PythonLocator::new();
        let id = TestId::new("missing_test.py::test_x");
        assert_eq!(
            locator.declaration_line(&id, Utf8Path::new("/definitely/missing_test.py")),
            None
        );
        assert_eq!(
            locator.test_code(&id, Utf8Path::new("/definitely/missing_test.py")),
            None
        );
    }
}
