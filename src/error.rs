use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the mutation engine.
///
/// Every variant except `Spawn` aborts the whole run. A spawn failure is
/// recorded as a fatal outcome for the mutant that triggered it.
#[derive(Debug, Error)]
pub enum MutateError {
    #[error("could not resolve compilation unit {unit:?}: {reason}")]
    Resolution { unit: PathBuf, reason: String },

    #[error("could not stage {dir:?}: {source}")]
    Staging {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not parse {file:?}: {source}")]
    Parse {
        file: PathBuf,
        #[source]
        source: syn::Error,
    },

    #[error("could not read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("span [{start}, {end}) in {file:?} does not hold {expected:?}")]
    SpanMismatch {
        file: PathBuf,
        start: u32,
        end: u32,
        expected: String,
    },

    #[error("failed to run verification command `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("baseline verification failed: {detail}")]
    Baseline { detail: String },
}
