//! Temporary workspace management.
//!
//! One workspace per run holds every downloaded and converted file. The
//! directory-level removal in `close` is authoritative: individual files
//! are not tracked or deleted one by one, so stray files written into the
//! workspace are removed with it.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

const WORKSPACE_PREFIX: &str = "lakesync-";

/// A scoped scratch directory owned by one pipeline run.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    // Present when tempfile owns the directory; a caller-supplied base
    // directory is removed by close()/Drop instead.
    temp: Option<TempDir>,
}

impl Workspace {
    /// Open a fresh workspace.
    ///
    /// With no base, a uniquely named directory is created under the system
    /// temp dir. With `base`, that directory is used directly and created
    /// if absent; close() removes it entirely.
    pub fn open(base: Option<&Path>) -> io::Result<Workspace> {
        match base {
            Some(dir) => {
                fs::create_dir_all(dir)?;
                Ok(Workspace { root: dir.to_path_buf(), temp: None })
            }
            None => {
                let temp = tempfile::Builder::new().prefix(WORKSPACE_PREFIX).tempdir()?;
                let root = temp.path().to_path_buf();
                Ok(Workspace { root, temp: Some(temp) })
            }
        }
    }

    /// Path slot for `file_name` inside the workspace.
    ///
    /// The file is not created; the same name always yields the same path,
    /// so repeated allocations are last-writer-wins.
    pub fn allocate(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }

    /// The workspace directory.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Remove the workspace directory and everything in it.
    pub fn close(mut self) -> io::Result<()> {
        match self.temp.take() {
            Some(temp) => temp.close(),
            None => fs::remove_dir_all(&self.root),
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        // Backstop for early-exit paths; close() is the path that reports
        // failures. TempDir handles its own removal.
        if self.temp.is_none() && self.root.exists() {
            let _ = fs::remove_dir_all(&self.root);
        }
    }
}
