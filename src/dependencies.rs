//! Detect the third-party modules a file set imports.

use crate::file_map::FileMap;
use regex::Regex;
use std::sync::LazyLock;

static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:\bfrom\s*|\bimport\s*\(?\s*|\brequire\s*\(\s*)['"]([^'"\s]+)['"]"#)
        .expect("valid import regex")
});

/// Package part of a bare specifier: `@scope/pkg/x` → `@scope/pkg`, `pkg/x` → `pkg`.
fn package_name(specifier: &str) -> Option<&str> {
    if specifier.starts_with('.') || specifier.starts_with('/') || specifier.contains("://") {
        return None;
    }
    let mut end = specifier.len();
    let mut slashes = specifier.match_indices('/');
    let skip = usize::from(specifier.starts_with('@'));
    if let Some((index, _)) = slashes.nth(skip) {
        end = index;
    }
    Some(&specifier[..end])
}

/// Bare module names imported anywhere in `files`, in first-seen order.
pub fn detect_modules(files: &FileMap) -> Vec<String> {
    let mut modules: Vec<String> = Vec::new();
    for (_, contents) in files.iter() {
        for capture in IMPORT_RE.captures_iter(contents) {
            let Some(name) = capture.get(1).and_then(|m| package_name(m.as_str())) else {
                continue;
            };
            if !modules.iter().any(|existing| existing == name) {
                modules.push(name.to_string());
            }
        }
    }
    modules
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_bare_imports_in_order() {
        let files: FileMap = [
            (
                "index.js",
                "import React from 'react'\nimport { View } from \"react-native\"\nimport './styles'\n",
            ),
            (
                "util.js",
                "const _ = require('lodash/fp')\nconst x = import('@babel/core/lib')\nimport React2 from 'react'\n",
            ),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            detect_modules(&files),
            vec!["react", "react-native", "lodash", "@babel/core"]
        );
    }

    #[test]
    fn test_side_effect_import() {
        let files = FileMap::single("a.js", "import 'core-js'");
        assert_eq!(detect_modules(&files), vec!["core-js"]);
    }

    #[test]
    fn test_relative_and_remote_are_ignored() {
        let files = FileMap::single(
            "a.js",
            "import a from '../a'\nimport b from '/abs'\nimport c from 'https://cdn/x.js'",
        );
        assert!(detect_modules(&files).is_empty());
    }
}
