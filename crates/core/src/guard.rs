//! Overwrite arbitration for transfer destinations

use std::path::Path;

use crate::error::{Error, Result};

/// Outcome of checking a destination before writing to it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictDecision {
    /// Write (or overwrite) the destination
    Proceed,
    /// Leave an existing destination untouched
    Skip,
    /// Stop the whole operation before anything is written
    Abort,
}

impl ConflictDecision {
    /// The `update` flag handed to the remote collaborator
    pub fn update_flag(self) -> bool {
        matches!(self, ConflictDecision::Proceed)
    }
}

/// Decides whether existing destinations may be overwritten
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConflictGuard {
    force: bool,
}

impl ConflictGuard {
    /// Create a guard from the user's force flag
    pub fn new(force: bool) -> Self {
        Self { force }
    }

    /// Decision for a local destination path
    pub fn check_local(&self, path: &Path) -> ConflictDecision {
        if path.exists() && !self.force {
            ConflictDecision::Abort
        } else {
            ConflictDecision::Proceed
        }
    }

    /// Like [`check_local`](Self::check_local), turning `Abort` into a conflict error
    pub fn ensure_local(&self, path: &Path) -> Result<()> {
        match self.check_local(path) {
            ConflictDecision::Abort => Err(Error::Conflict(format!(
                "Local file {} already exists, not overwriting.",
                path.display()
            ))),
            _ => Ok(()),
        }
    }

    /// Decision for a remote destination.
    ///
    /// No existence check happens here: the remote side applies the
    /// decision through the `update` flag.
    pub fn check_remote(&self) -> ConflictDecision {
        if self.force {
            ConflictDecision::Proceed
        } else {
            ConflictDecision::Skip
        }
    }
}

/// Create `dir` and its parents; an existing directory is not an error
pub fn ensure_dir(dir: &Path) -> Result<()> {
    if dir.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(dir)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_local_missing_proceeds() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("new.txt");
        assert_eq!(ConflictGuard::new(false).check_local(&path), ConflictDecision::Proceed);
        assert!(ConflictGuard::new(false).ensure_local(&path).is_ok());
    }

    #[test]
    fn test_local_existing_aborts_without_force() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("x.txt");
        std::fs::write(&path, b"keep").unwrap();

        let guard = ConflictGuard::new(false);
        assert_eq!(guard.check_local(&path), ConflictDecision::Abort);

        let err = guard.ensure_local(&path).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        assert!(err.to_string().contains("already exists, not overwriting"));
    }

    #[test]
    fn test_local_existing_forced_proceeds() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("x.txt");
        std::fs::write(&path, b"old").unwrap();
        assert_eq!(ConflictGuard::new(true).check_local(&path), ConflictDecision::Proceed);
    }

    #[test]
    fn test_remote_decision_maps_to_update_flag() {
        assert_eq!(ConflictGuard::new(true).check_remote(), ConflictDecision::Proceed);
        assert!(ConflictGuard::new(true).check_remote().update_flag());
        assert_eq!(ConflictGuard::new(false).check_remote(), ConflictDecision::Skip);
        assert!(!ConflictGuard::new(false).check_remote().update_flag());
        assert!(!ConflictDecision::Abort.update_flag());
    }

    #[test]
    fn test_ensure_dir_idempotent() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("a").join("b");
        ensure_dir(&dir).unwrap();
        ensure_dir(&dir).unwrap();
        assert!(dir.is_dir());
        ensure_dir(Path::new("")).unwrap();
    }
}
