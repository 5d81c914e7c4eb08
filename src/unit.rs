use std::fs;
use std::path::{Path, PathBuf};

use crate::error::MutateError;

/// A directory of Rust sources mutated as one unit.
#[derive(Debug, Clone)]
pub struct CompilationUnit {
    /// Directory holding the sources.
    pub root: PathBuf,

    /// Source files to mutate, relative to `root`, in processing order.
    pub files: Vec<PathBuf>,
}

impl CompilationUnit {
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn source_files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Whether a `Cargo.toml` sits directly next to the sources, and so gets staged.
    pub fn has_manifest(&self) -> bool {
        self.root.join("Cargo.toml").is_file()
    }
}

/// Turns a user-supplied unit name into a directory and a file list.
pub trait UnitResolver {
    fn resolve(&self, unit: &Path) -> Result<CompilationUnit, MutateError>;
}

/// Resolves a directory to its top-level `.rs` files (sorted by name), or a
/// single `.rs` file to a unit containing just that file.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirResolver;

impl UnitResolver for DirResolver {
    fn resolve(&self, unit: &Path) -> Result<CompilationUnit, MutateError> {
        let resolution_err = |reason: String| MutateError::Resolution {
            unit: unit.to_path_buf(),
            reason,
        };

        let meta = fs::metadata(unit).map_err(|e| resolution_err(e.to_string()))?;

        if meta.is_file() {
            if !is_rust_source(unit) {
                return Err(resolution_err("not a `.rs` file".to_string()));
            }
            let name = unit
                .file_name()
                .ok_or_else(|| resolution_err("file has no name".to_string()))?;
            let root = match unit.parent() {
                Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
                _ => PathBuf::from("."),
            };
            return Ok(CompilationUnit {
                root,
                files: vec![PathBuf::from(name)],
            });
        }

        let entries = fs::read_dir(unit).map_err(|e| resolution_err(e.to_string()))?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| resolution_err(e.to_string()))?;
            let file_type = entry.file_type().map_err(|e| resolution_err(e.to_string()))?;
            let path = entry.path();

            // Symlinks are not staged, so they are not sources either.
            if file_type.is_file() && is_rust_source(&path) {
                files.push(PathBuf::from(entry.file_name()));
            }
        }
        files.sort();

        Ok(CompilationUnit {
            root: unit.to_path_buf(),
            files,
        })
    }
}

fn is_rust_source(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "rs")
}
