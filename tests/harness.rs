//! Shared scaffolding: a scratch directory plus a builder for invoking
//! the compiled `flowctl` binary inside it.

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self { dir: TempDir::new().unwrap() }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes `name` relative to the workspace root and returns its path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, contents).unwrap();
        path
    }

    pub fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(name)).unwrap()
    }

    pub fn exists(&self, name: &str) -> bool {
        self.dir.path().join(name).is_file()
    }

    /// A fresh `flowctl` invocation rooted at this workspace.
    pub fn flowctl(&self) -> Command {
        let mut cmd = Command::cargo_bin("flowctl").unwrap();
        cmd.current_dir(self.path());
        cmd
    }
}
