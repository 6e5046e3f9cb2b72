//! Git command executor

use std::path::{Path, PathBuf};
use std::process::Command;

use super::error::{GitError, Result};

/// Runs git commands inside one repository
pub struct GitExecutor {
    repo_path: PathBuf,
}

impl GitExecutor {
    pub fn new(repo_path: impl AsRef<Path>) -> Result<Self> {
        let path = repo_path.as_ref().to_path_buf();
        if !path.join(".git").exists() {
            return Err(GitError::NotARepository(path.display().to_string()));
        }
        Ok(Self { repo_path: path })
    }

    pub fn run(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_path)
            .output()?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            Err(GitError::CommandFailed(
                String::from_utf8_lossy(&output.stderr).to_string(),
            ))
        }
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_repo_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(GitExecutor::new(dir.path()).is_err());
    }
}
