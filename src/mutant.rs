use crate::catalog::{Category, Operator, OperatorEntry};
use crate::span::{Position, SourceSpan};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One eligible operator occurrence in a source file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MutationSite {
    /// Catalog row for the operator found at this site.
    pub entry: OperatorEntry,

    /// Byte span of the operator token.
    pub span: SourceSpan,

    /// Line/column of the operator token.
    pub position: Position,
}

impl MutationSite {
    pub fn operator(&self) -> Operator {
        self.entry.original
    }

    pub fn replacement(&self) -> Operator {
        self.entry.replacement
    }

    pub fn category(&self) -> Category {
        self.entry.category
    }

    /// Stable identifier: `<file name>:<line>:<column>`.
    pub fn id(&self) -> MutationId {
        let file = self
            .span
            .file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.span.file.display().to_string());

        MutationId(format!("{file}:{}", self.position))
    }
}

/// Identifier derived from file name and source position.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MutationId(pub String);

impl fmt::Display for MutationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of running the verification command against a single mutant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MutantOutcome {
    /// Mutant has not been executed.
    NotRun,

    /// Verification reported the expected failure.
    Killed,

    /// Verification still passed with this mutant.
    Survived,

    /// Verification failed for a reason unrelated to the mutation (build break, harness crash).
    Errored { detail: String },

    /// Verification exceeded the configured timeout and was killed.
    TimedOut,

    /// Verification could not be run or terminated abnormally.
    Fatal { reason: String },
}

/// A mutation site together with the result of executing it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Mutant {
    /// Stable identifier (`lib.rs:12:9`).
    pub id: MutationId,

    pub site: MutationSite,

    pub outcome: MutantOutcome,

    /// Duration of the verification run in milliseconds.
    ///
    /// `None` means the mutant has not been executed.
    pub duration_ms: Option<u64>,
}

impl Mutant {
    pub fn not_run(site: MutationSite) -> Self {
        Self {
            id: site.id(),
            site,
            outcome: MutantOutcome::NotRun,
            duration_ms: None,
        }
    }
}
