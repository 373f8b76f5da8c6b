//! Static knowledge about legacy technology.

/// A package known to be deprecated, with its suggested successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeprecatedPackage {
    pub name: &'static str,
    pub reason: &'static str,
    pub replacement: &'static str,
}

const DEPRECATED_JAVASCRIPT: &[DeprecatedPackage] = &[
    DeprecatedPackage {
        name: "request",
        reason: "Security vulnerabilities, unmaintained",
        replacement: "axios",
    },
    DeprecatedPackage {
        name: "left-pad",
        reason: "Controversial history, unnecessary",
        replacement: "String.prototype.padStart",
    },
    DeprecatedPackage {
        name: "moment",
        reason: "Large bundle size, modern alternatives available",
        replacement: "date-fns or luxon",
    },
    DeprecatedPackage {
        name: "underscore",
        reason: "Modern JavaScript has built-in alternatives",
        replacement: "Lodash or native methods",
    },
    DeprecatedPackage {
        name: "babel-preset-es2015",
        reason: "Replaced by @babel/preset-env",
        replacement: "@babel/preset-env",
    },
    DeprecatedPackage {
        name: "bluebird",
        reason: "Native Promises are widely supported",
        replacement: "Native Promises",
    },
    DeprecatedPackage {
        name: "qs",
        reason: "Security concerns in older versions",
        replacement: "URLSearchParams or modern alternatives",
    },
];

/// Substrings that mark a package as a legacy front-end framework.
pub const LEGACY_FRAMEWORKS: &[&str] = &["angularjs", "jquery", "backbone", "knockout", "ember"];

/// Build-tool and CI configs that are legacy wherever they appear at the root.
pub const LEGACY_CONFIG_FILES: &[(&str, &str)] = &[
    ("Gruntfile.js", "Legacy Grunt build system"),
    ("gulpfile.js", "Legacy Gulp build system"),
    (".travis.yml", "Travis CI (deprecated)"),
    ("bower.json", "Bower package manager (deprecated)"),
    ("Jenkinsfile", "Jenkins (consider modern alternatives)"),
    (".bowerrc", "Bower configuration (deprecated)"),
    ("karma.conf.js", "Legacy Karma configuration (consider Vitest)"),
    ("protractor.conf.js", "Legacy Protractor e2e tests"),
];

/// Directory-name fragments that suggest abandoned code.
pub const LEGACY_DIRECTORY_NAMES: &[&str] = &["legacy", "deprecated", "old", "bak", "backup"];

/// File-name fragments that suggest abandoned code.
pub const LEGACY_FILE_INDICATORS: &[&str] =
    &["legacy", "old", "deprecated", "backup", "bak", "v1", "v2"];

/// Content markers, as case-insensitive regexes.
pub const CONTENT_MARKERS: &[&str] = &[
    r"(TODO|FIXME|HACK).*remove",
    r"deprecated",
    r"legacy",
    r"old.*code",
    r"temporar(y|ily)",
    r"cleanup.*required",
    r"refactor.*needed",
];

/// Python packages are not catalogued; only JavaScript has entries.
pub fn deprecated_javascript(name: &str) -> Option<&'static DeprecatedPackage> {
    DEPRECATED_JAVASCRIPT.iter().find(|p| p.name == name)
}

/// The framework fragment contained in `name`, if any.
pub fn legacy_framework(name: &str) -> Option<&'static str> {
    let lower = name.to_lowercase();
    LEGACY_FRAMEWORKS
        .iter()
        .copied()
        .find(|fragment| lower.contains(fragment))
}
