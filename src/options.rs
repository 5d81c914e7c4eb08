use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::catalog::CategorySet;

pub const DEFAULT_PROGRAM: &str = "cargo";
pub const DEFAULT_FAILURE_MARKER: &str = "error: test failed";

/// Settings for the verification command.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VerifyConfig {
    /// Program to run (looked up on `PATH`).
    pub program: String,

    /// Arguments placed before any pass-through arguments.
    pub args: Vec<String>,

    /// Prefix of the last output line that marks an expected test failure.
    pub failure_marker: String,

    /// Kill the command after this many seconds.
    pub timeout_secs: Option<u64>,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            args: vec!["test".to_string()],
            failure_marker: DEFAULT_FAILURE_MARKER.to_string(),
            timeout_secs: None,
        }
    }
}

/// Contents of a `--config` TOML file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub categories: Option<Vec<String>>,
    pub verify: VerifyConfig,
}

impl FileConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid op-mutant configuration")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {:?}", path))?;
        Self::from_toml(&text).with_context(|| format!("in config file {:?}", path))
    }
}

/// Configuration options for op-mutant derived from the CLI and config file.
#[derive(Debug, Clone)]
pub struct Options {
    /// Directory (or single `.rs` file) to mutate.
    pub unit: PathBuf,

    /// Enabled operator categories.
    pub categories: CategorySet,

    pub verify: VerifyConfig,

    /// Extra arguments appended to `verify.args`.
    pub passthrough: Vec<String>,

    /// Optional limit for the number of mutants to execute.
    pub mutant_limit: Option<usize>,

    /// Run the verification command once on the unmutated workspace first.
    pub baseline: bool,

    /// Leave the staged workspace on disk after the run.
    pub keep_workspace: bool,

    /// When true, emit JSON output instead of human-readable summary.
    pub json_output: bool,
}

impl Options {
    /// Construct an `Options` instance with default values.
    pub fn new(unit: PathBuf) -> Self {
        Self {
            unit,
            categories: CategorySet::all(),
            verify: VerifyConfig::default(),
            passthrough: Vec::new(),
            mutant_limit: None,
            baseline: true,
            keep_workspace: false,
            json_output: false,
        }
    }

    /// Layer a config file over the defaults.
    pub fn with_file_config(mut self, config: FileConfig) -> Self {
        if let Some(names) = &config.categories {
            self.categories = CategorySet::from_names(names.iter().map(String::as_str));
        }
        self.verify = config.verify;
        self
    }

    /// Full argument list for the verification command.
    pub fn verification_args(&self) -> Vec<String> {
        self.verify
            .args
            .iter()
            .chain(&self.passthrough)
            .cloned()
            .collect()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.verify.timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Category;

    #[test]
    fn defaults_run_cargo_test() {
        let options = Options::new(PathBuf::from("."));

        assert_eq!(options.verify.program, "cargo");
        assert_eq!(options.verification_args(), vec!["test"]);
        assert_eq!(options.timeout(), None);
        assert!(options.baseline);
    }

    #[test]
    fn passthrough_args_follow_base_args() {
        let mut options = Options::new(PathBuf::from("."));
        options.passthrough = vec!["--lib".to_string(), "--quiet".to_string()];

        assert_eq!(options.verification_args(), vec!["test", "--lib", "--quiet"]);
    }

    #[test]
    fn file_config_overrides_defaults() {
        let config = FileConfig::from_toml(
            r#"
categories = ["comparison", "logical"]

[verify]
program = "make"
args = ["check"]
failure_marker = "FAIL"
timeout_secs = 90
"#,
        )
        .unwrap();

        let options = Options::new(PathBuf::from(".")).with_file_config(config);

        assert!(options.categories.contains(Category::Comparison));
        assert!(options.categories.contains(Category::Logical));
        assert!(!options.categories.contains(Category::Arithmetic));
        assert_eq!(options.verify.program, "make");
        assert_eq!(options.verification_args(), vec!["check"]);
        assert_eq!(options.verify.failure_marker, "FAIL");
        assert_eq!(options.timeout(), Some(Duration::from_secs(90)));
    }

    #[test]
    fn partial_verify_table_keeps_other_defaults() {
        let config = FileConfig::from_toml("[verify]\ntimeout_secs = 5\n").unwrap();

        assert_eq!(config.categories, None);
        assert_eq!(config.verify.program, "cargo");
        assert_eq!(config.verify.failure_marker, DEFAULT_FAILURE_MARKER);
        assert_eq!(config.verify.timeout_secs, Some(5));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(FileConfig::from_toml("colour = true\n").is_err());
        assert!(FileConfig::from_toml("[verify]\nprogam = \"cargo\"\n").is_err());
    }
}
