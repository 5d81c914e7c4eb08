use std::path::PathBuf;

use serde::Serialize;

use crate::catalog::CategorySet;
use crate::mutant::{Mutant, MutantOutcome};
use crate::verify::Verification;

/// Summary counts for a mutation-testing run.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Verification failed with the expected marker.
    pub killed: usize,

    /// Verification still passed.
    pub survived: usize,

    /// Verification failed for an unrelated reason.
    pub errored: usize,

    /// Verification was killed after the timeout.
    pub timed_out: usize,

    /// Verification could not run or crashed.
    pub fatal: usize,

    /// Not executed because of `--limit` or an abort.
    pub not_run: usize,
}

impl RunSummary {
    pub fn record(&mut self, outcome: &MutantOutcome) {
        match outcome {
            MutantOutcome::Killed => self.killed += 1,
            MutantOutcome::Survived => self.survived += 1,
            MutantOutcome::Errored { .. } => self.errored += 1,
            MutantOutcome::TimedOut => self.timed_out += 1,
            MutantOutcome::Fatal { .. } => self.fatal += 1,
            MutantOutcome::NotRun => self.not_run += 1,
        }
    }

    pub fn from_mutants<'a>(mutants: impl IntoIterator<Item = &'a Mutant>) -> Self {
        let mut summary = Self::default();
        for m in mutants {
            summary.record(&m.outcome);
        }
        summary
    }

    /// Mutants whose verification actually ran.
    pub fn executed(&self) -> usize {
        self.killed + self.survived + self.errored + self.timed_out + self.fatal
    }
}

/// Baseline verification metadata.
#[derive(Debug, Clone, Serialize)]
pub struct BaselineReport {
    pub success: bool,
    pub detail: String,
    pub duration_ms: u64,
}

impl BaselineReport {
    pub fn from_verification(v: &Verification) -> Self {
        Self {
            success: v.succeeded(),
            detail: v.describe(),
            duration_ms: v.duration.as_millis() as u64,
        }
    }
}

/// Per-file result of the mutation loop.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    /// Path relative to the compilation unit directory.
    pub file: PathBuf,

    /// Mutation sites found in the pristine file.
    pub sites: usize,

    /// One entry per site, in discovery order.
    pub mutants: Vec<Mutant>,
}

/// Machine-readable report for a mutation test run.
///
/// In `--json` mode we print this to stdout as pretty JSON.
#[derive(Debug, Serialize)]
pub struct MutationRunReport {
    /// Tool name, stable across versions.
    pub tool: &'static str,

    /// Current crate version.
    pub version: &'static str,

    /// The compilation unit directory used for this run.
    pub unit: PathBuf,

    /// Enabled categories.
    pub categories: CategorySet,

    /// Baseline verification result, when one was run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline: Option<BaselineReport>,

    /// Summary of mutant outcomes.
    pub summary: RunSummary,

    /// Per-file outcomes.
    pub files: Vec<FileReport>,

    /// Optional high-level error message (for example a fatal verification).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MutationRunReport {
    pub fn new(unit: PathBuf, categories: CategorySet) -> Self {
        Self {
            tool: "op-mutant",
            version: env!("CARGO_PKG_VERSION"),
            unit,
            categories,
            baseline: None,
            summary: RunSummary::default(),
            files: Vec::new(),
            error: None,
        }
    }

    pub fn failure(unit: PathBuf, categories: CategorySet, error: String) -> Self {
        Self {
            error: Some(error),
            ..Self::new(unit, categories)
        }
    }

    pub fn mutants(&self) -> impl Iterator<Item = &Mutant> {
        self.files.iter().flat_map(|f| f.mutants.iter())
    }

    pub fn discovered(&self) -> usize {
        self.files.iter().map(|f| f.sites).sum()
    }
}
