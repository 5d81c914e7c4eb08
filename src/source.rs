use std::fs;
use std::path::{Path, PathBuf};

use crate::error::MutateError;
use crate::span::Position;

/// Parsed source file inside a staged workspace.
///
/// Holds the pristine text alongside its `syn` tree. The text is never
/// modified; mutated variants are produced by splicing a copy of it.
pub struct SourceUnit {
    /// Path relative to the compilation unit directory (for example `lib.rs`).
    root_relative: PathBuf,

    /// Absolute path on disk.
    absolute_path: PathBuf,

    text: String,
    syntax: syn::File,
    lines: LineIndex,
}

impl SourceUnit {
    /// Read and parse `rel` under `root`.
    pub fn load(root: &Path, rel: &Path) -> Result<Self, MutateError> {
        let absolute_path = root.join(rel);
        let text = fs::read_to_string(&absolute_path).map_err(|source| MutateError::Read {
            path: absolute_path.clone(),
            source,
        })?;

        Self::parse(absolute_path, rel.to_path_buf(), text)
    }

    /// Parse already loaded text.
    pub fn parse(
        absolute_path: PathBuf,
        root_relative: PathBuf,
        text: String,
    ) -> Result<Self, MutateError> {
        let syntax = syn::parse_file(&text).map_err(|source| MutateError::Parse {
            file: absolute_path.clone(),
            source,
        })?;
        let lines = LineIndex::new(&text);

        Ok(Self {
            root_relative,
            absolute_path,
            text,
            syntax,
            lines,
        })
    }

    /// Absolute path on disk.
    pub fn path(&self) -> &Path {
        &self.absolute_path
    }

    /// Path relative to the compilation unit directory.
    pub fn relative_path(&self) -> &Path {
        &self.root_relative
    }

    /// Base file name, used in mutation ids.
    pub fn file_name(&self) -> String {
        self.root_relative
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.root_relative.display().to_string())
    }

    /// Pristine source text.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn syntax(&self) -> &syn::File {
        &self.syntax
    }

    /// Byte offset of a `proc-macro2` line/column pair (1-based line, 0-based char column).
    pub fn offset_of(&self, lc: proc_macro2::LineColumn) -> Option<usize> {
        self.lines.offset(&self.text, lc.line, lc.column)
    }

    /// 1-based position of a byte offset.
    pub fn position_of(&self, offset: usize) -> Option<Position> {
        self.lines.position(&self.text, offset)
    }

    /// Write the pristine text back to disk.
    pub fn write_pristine(&self) -> Result<(), MutateError> {
        write_source(&self.absolute_path, &self.text)
    }
}

/// Overwrite `path` with `contents`.
pub fn write_source(path: &Path, contents: &str) -> Result<(), MutateError> {
    fs::write(path, contents).map_err(|source| MutateError::Write {
        path: path.to_path_buf(),
        source,
    })
}

const BOM: char = '\u{feff}';

/// Byte offsets of line starts.
///
/// `syn` lexes the text after a leading byte order mark, so line 1 starts
/// after the BOM and columns on it line up with `proc-macro2` spans.
#[derive(Debug, Clone)]
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(text: &str) -> Self {
        let first = if text.starts_with(BOM) { BOM.len_utf8() } else { 0 };
        let starts = std::iter::once(first)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { starts }
    }

    fn offset(&self, text: &str, line: usize, column: usize) -> Option<usize> {
        let start = *self.starts.get(line.checked_sub(1)?)?;
        let end = self.starts.get(line).copied().unwrap_or(text.len());
        let line_text = text.get(start..end)?;

        if column == line_text.chars().count() {
            return Some(end);
        }

        line_text
            .char_indices()
            .nth(column)
            .map(|(i, _)| start + i)
    }

    fn position(&self, text: &str, offset: usize) -> Option<Position> {
        if offset > text.len() {
            return None;
        }

        // Number of line starts at or before `offset`; zero inside the BOM.
        let line = self.starts.partition_point(|&s| s <= offset);
        if line == 0 {
            return None;
        }
        let line_start = self.starts[line - 1];
        let column = text.get(line_start..offset)?.chars().count() + 1;

        Some(Position { line, column })
    }
}
