use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Byte span inside a source file.
///
/// Offsets are byte indices into the file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceSpan {
    /// Path to the source file, relative to the compilation unit directory.
    pub file: PathBuf,

    /// Start byte offset (inclusive).
    pub start: u32,

    /// End byte offset (exclusive).
    pub end: u32,
}

/// 1-based line and column. Columns count characters, not bytes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
