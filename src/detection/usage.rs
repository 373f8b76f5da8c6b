//! Textual import matching.
//!
//! Deliberately approximate: libraries are recognised by the shape of
//! their import statements, not by module resolution.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use std::path::Path;

use super::manifests::Ecosystem;

const JS_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx", "mjs", "cjs"];

static JS_IMPORT_SPECIFIERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:import\s+(?:[^'";]*?\s+from\s+)?|require\(\s*|from\s+)['"]([^'"]+)['"]"#)
        .unwrap()
});

// `import Widget from '...'` must not be read as a Python/Java import.
static PY_IMPORT_SPECIFIERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^\s*(?:from\s+([\w.]+)\s+import\b|import\s+(?:static\s+)?([\w.]+)\s*(?:;|,|$|\s+as\b))",
    )
    .unwrap()
});

/// Whether `path` is a JavaScript or TypeScript source.
pub fn is_js_source(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| JS_EXTENSIONS.iter().any(|x| x.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

pub fn is_python_source(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("py")
}

/// Compiled import patterns for one library.
pub struct UsageMatcher {
    ecosystem: Ecosystem,
    patterns: Vec<Regex>,
}

impl UsageMatcher {
    pub fn new(ecosystem: Ecosystem, library: &str) -> Self {
        let patterns = match ecosystem {
            Ecosystem::Npm => js_patterns(library),
            Ecosystem::Python => python_patterns(library),
        };
        Self {
            ecosystem,
            patterns,
        }
    }

    /// Whether files of this kind can reference the library.
    pub fn applies_to(&self, path: &Path) -> bool {
        match self.ecosystem {
            Ecosystem::Npm => is_js_source(path),
            Ecosystem::Python => is_python_source(path),
        }
    }

    pub fn is_match(&self, content: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(content))
    }
}

fn case_insensitive(pattern: &str) -> Option<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .multi_line(true)
        .build()
        .map_err(|e| log::warn!("Skipping import pattern {}: {}", pattern, e))
        .ok()
}

fn js_patterns(library: &str) -> Vec<Regex> {
    let lib = regex::escape(library);
    let mut patterns = vec![
        format!(r#"import\s[^;]*?from\s*['"]{lib}"#),
        format!(r#"import\s*['"]{lib}"#),
        format!(r#"require\(\s*['"]{lib}"#),
        format!(r#"from\s*['"]{lib}"#),
    ];
    let global = if library.starts_with(|c: char| c.is_alphanumeric() || c == '_') {
        format!(r"\b{lib}\.")
    } else {
        format!(r"{lib}\.")
    };
    patterns.push(global);
    patterns.iter().filter_map(|p| case_insensitive(p)).collect()
}

fn python_patterns(library: &str) -> Vec<Regex> {
    let mut names = vec![library.to_string()];
    let module = library.replace('-', "_");
    if module != library {
        names.push(module);
    }
    names
        .iter()
        .flat_map(|name| {
            let name = regex::escape(name);
            [
                format!(r"^\s*import\s+{name}\b"),
                format!(r"^\s*from\s+{name}\b"),
            ]
        })
        .filter_map(|p| case_insensitive(&p))
        .collect()
}

/// Import specifiers found in a source file.
///
/// Covers JS/TS `import ... from 'x'`, `import 'x'`, `require('x')` and
/// Python/Java `import x` / `from x import`.
pub fn extract_import_specifiers(content: &str) -> Vec<String> {
    let mut specifiers: Vec<String> = JS_IMPORT_SPECIFIERS
        .captures_iter(content)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect();
    specifiers.extend(
        PY_IMPORT_SPECIFIERS
            .captures_iter(content)
            .filter_map(|c| c.get(1).or_else(|| c.get(2)))
            .map(|m| m.as_str().to_string()),
    );
    specifiers.sort();
    specifiers.dedup();
    specifiers
}

/// Strip relative prefixes so a specifier can be compared with item paths.
pub fn normalize_specifier(specifier: &str) -> String {
    let mut s = specifier.trim();
    loop {
        if let Some(rest) = s.strip_prefix("./") {
            s = rest;
        } else if let Some(rest) = s.strip_prefix("../") {
            s = rest;
        } else if let Some(rest) = s.strip_prefix("@/") {
            s = rest;
        } else {
            break;
        }
    }
    s.trim_end_matches('/').to_string()
}

/// Last path segment of a specifier without its extension.
///
/// Dotted module paths (`utils.helpers`) yield their last component.
pub fn specifier_stem(specifier: &str) -> &str {
    let trimmed = specifier.trim_end_matches('/');
    if trimmed.contains('/') {
        let segment = trimmed.rsplit('/').next().unwrap_or(trimmed);
        segment.split('.').next().unwrap_or(segment)
    } else {
        trimmed.rsplit('.').next().unwrap_or(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_js_import_forms_match() {
        let matcher = UsageMatcher::new(Ecosystem::Npm, "moment");
        assert!(matcher.is_match("import moment from 'moment';"));
        assert!(matcher.is_match("const m = require(\"moment\");"));
        assert!(matcher.is_match("import { utc } from \"Moment\""));
        assert!(matcher.is_match("window.moment.locale('fr')"));
        assert!(!matcher.is_match("// a momentous occasion"));
    }

    #[test]
    fn test_scoped_package_matches() {
        let matcher = UsageMatcher::new(Ecosystem::Npm, "@babel/core");
        assert!(matcher.is_match("import x from '@babel/core'"));
    }

    #[test]
    fn test_python_import_forms_match() {
        let matcher = UsageMatcher::new(Ecosystem::Python, "python-dateutil");
        assert!(matcher.is_match("import python_dateutil\n"));
        let requests = UsageMatcher::new(Ecosystem::Python, "requests");
        assert!(requests.is_match("from requests import get\n"));
        assert!(!requests.is_match("# requests are handled elsewhere\n"));
    }

    #[test]
    fn test_applies_to_by_extension() {
        let npm = UsageMatcher::new(Ecosystem::Npm, "qs");
        assert!(npm.applies_to(Path::new("src/a.tsx")));
        assert!(!npm.applies_to(Path::new("src/a.py")));
    }

    #[test]
    fn test_extract_specifiers() {
        let specifiers = extract_import_specifiers(indoc! {r#"
            import Widget from './legacy/old-widget';
            import 'polyfills';
            const _ = require('underscore');
            from utils.helpers import clean
            import java.util.List;
        "#});
        assert_eq!(
            specifiers,
            vec![
                "./legacy/old-widget",
                "java.util.List",
                "polyfills",
                "underscore",
                "utils.helpers"
            ]
        );
    }

    #[test]
    fn test_normalize_and_stem() {
        assert_eq!(normalize_specifier("../../legacy/old-widget/"), "legacy/old-widget");
        assert_eq!(specifier_stem("legacy/old-widget"), "old-widget");
        assert_eq!(specifier_stem("legacy/helpers.js"), "helpers");
        assert_eq!(specifier_stem("underscore"), "underscore");
        assert_eq!(specifier_stem("utils.helpers"), "helpers");
    }
}
