use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::MutateError;

/// Isolated copy of a compilation unit directory.
///
/// The directory is removed on drop unless [`Workspace::keep`] was called.
#[derive(Debug)]
pub struct Workspace {
    path: PathBuf,
    dir: Option<TempDir>,
}

impl Workspace {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist the directory past the end of the run and return its path.
    pub fn keep(&mut self) -> PathBuf {
        if let Some(dir) = self.dir.take() {
            let _ = dir.keep();
        }
        self.path.clone()
    }
}

/// Copy the regular files directly inside `source_dir` into a fresh temporary directory.
///
/// Subdirectories, symlinks and special files are left behind. A failure part
/// way through leaves the files copied so far in place; callers abort the run.
pub fn stage(source_dir: &Path) -> Result<Workspace, MutateError> {
    let staging_err = |source| MutateError::Staging {
        dir: source_dir.to_path_buf(),
        source,
    };

    let temp = tempfile::Builder::new()
        .prefix("op-mutant-")
        .tempdir()
        .map_err(staging_err)?;

    copy_regular_files(source_dir, temp.path()).map_err(staging_err)?;

    Ok(Workspace {
        path: temp.path().to_path_buf(),
        dir: Some(temp),
    })
}

fn copy_regular_files(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in fs::read_dir(src)? {
        let entry = entry?;

        // `file_type` does not follow symlinks.
        if !entry.file_type()?.is_file() {
            continue;
        }

        fs::copy(entry.path(), dst.join(entry.file_name()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn stage_copies_top_level_regular_files_only() {
        let src = TempDir::new().unwrap();
        fs::write(src.path().join("lib.rs"), "pub fn f() {}\n").unwrap();
        fs::create_dir(src.path().join("nested")).unwrap();
        fs::write(src.path().join("nested").join("deep.rs"), "fn g() {}\n").unwrap();

        #[cfg(unix)]
        {
            std::os::unix::fs::symlink(src.path().join("lib.rs"), src.path().join("link.rs"))
                .unwrap();

            let status = std::process::Command::new("mkfifo")
                .arg(src.path().join("pipe.rs"))
                .status()
                .expect("mkfifo should run");
            assert!(status.success());
            assert!(!fs::symlink_metadata(src.path().join("pipe.rs")).unwrap().is_file());
        }

        let ws = stage(src.path()).expect("stage should succeed");

        assert_eq!(names_in(ws.path()), vec!["lib.rs"]);
        assert_eq!(
            fs::read_to_string(ws.path().join("lib.rs")).unwrap(),
            "pub fn f() {}\n"
        );
    }

    #[test]
    fn staged_copy_is_isolated_from_source() {
        let src = TempDir::new().unwrap();
        fs::write(src.path().join("lib.rs"), "a").unwrap();

        let ws = stage(src.path()).unwrap();
        fs::write(ws.path().join("lib.rs"), "b").unwrap();

        assert_eq!(fs::read_to_string(src.path().join("lib.rs")).unwrap(), "a");
    }

    #[test]
    fn missing_source_dir_is_a_staging_error() {
        let src = TempDir::new().unwrap();
        let missing = src.path().join("does-not-exist");

        let err = stage(&missing).unwrap_err();
        assert!(matches!(err, MutateError::Staging { .. }));
    }

    #[test]
    fn kept_workspace_outlives_the_handle() {
        let src = TempDir::new().unwrap();
        fs::write(src.path().join("lib.rs"), "x").unwrap();

        let mut ws = stage(src.path()).unwrap();
        let kept = ws.keep();
        drop(ws);

        assert!(kept.join("lib.rs").exists());
        fs::remove_dir_all(kept).unwrap();
    }

    #[test]
    fn dropped_workspace_is_removed() {
        let src = TempDir::new().unwrap();
        fs::write(src.path().join("lib.rs"), "x").unwrap();

        let ws = stage(src.path()).unwrap();
        let path = ws.path().to_path_buf();
        drop(ws);

        assert!(!path.exists());
    }
}
