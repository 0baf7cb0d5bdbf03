//! Outer↔inner filename translation for backends that need a
//! namespace-legal, slash-free name (spec §4.2 Sandboxing).

use crate::error::EngineError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Maintains the forward (outer→inner) and reverse (inner→outer) maps and
/// the symlinks that make both names resolve to the same bytes.
#[derive(Debug, Default)]
pub struct SandboxTranslator {
    fwd: HashMap<String, String>,
    rev: HashMap<String, String>,
    preserve_symlinks: bool,
    created_symlinks: Vec<PathBuf>,
}

impl SandboxTranslator {
    pub fn new(preserve_symlinks: bool) -> Self {
        Self { preserve_symlinks, ..Default::default() }
    }

    /// Returns the inner name for `outer`, creating a fresh mapping (and a
    /// symlink under `dir`) on first use. A name already translated is
    /// returned unchanged, so repeated calls are idempotent.
    pub fn translate(&mut self, dir: &Path, outer: &str) -> Result<String, EngineError> {
        if let Some(inner) = self.fwd.get(outer) {
            return Ok(inner.clone());
        }

        let candidates = Self::candidates(outer);
        let chosen = candidates.iter().find(|candidate| match self.rev.get(*candidate) {
            None => true,
            Some(existing) => existing == outer,
        });

        let Some(inner) = chosen else {
            let last = candidates.last().expect("candidates is never empty").clone();
            let other_outer = self.rev.get(&last).cloned().unwrap_or_default();
            return Err(EngineError::SandboxCollision { outer: outer.to_string(), other_outer, inner: last });
        };
        let inner = inner.clone();

        self.materialize_symlink(dir, outer, &inner)?;
        self.fwd.insert(outer.to_string(), inner.clone());
        self.rev.insert(inner.clone(), outer.to_string());
        Ok(inner)
    }

    pub fn outer_of(&self, inner: &str) -> Option<&str> {
        self.rev.get(inner).map(String::as_str)
    }

    /// Replace `/` with `_` and leading `.`s with `_`, then (only on
    /// collision) rewrite one character class at a time: `_`→`~`, then
    /// `~`→`-`. Three candidates total; giving up after that is the
    /// original's documented limit (spec §9 open question), not extended
    /// here.
    fn candidates(outer: &str) -> [String; 3] {
        let base = Self::sanitize(outer);
        let step2 = base.replace('_', "~");
        let step3 = step2.replace('~', "-");
        [base, step2, step3]
    }

    fn sanitize(outer: &str) -> String {
        let mut s = outer.replace('/', "_");
        let first_non_dot = s.find(|c: char| c != '.').unwrap_or(s.len());
        s.replace_range(0..first_non_dot, &"_".repeat(first_non_dot));
        s
    }

    fn materialize_symlink(&mut self, dir: &Path, outer: &str, inner: &str) -> Result<(), EngineError> {
        let link_path = dir.join(inner);
        match std::fs::symlink_metadata(&link_path) {
            Ok(_) => std::fs::remove_file(&link_path)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        std::os::unix::fs::symlink(outer, &link_path)?;
        self.created_symlinks.push(link_path);
        Ok(())
    }

    /// Remove every symlink this translator created, unless the caller
    /// opted to preserve them.
    pub fn cleanup(&self) {
        if self.preserve_symlinks {
            return;
        }
        for path in &self.created_symlinks {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
#[path = "sandbox_tests.rs"]
mod tests;
