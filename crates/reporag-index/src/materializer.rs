//! Local working copies of remote repositories.

use std::path::{Path, PathBuf};

use tokio::process::Command;

use crate::error::{IndexError, Result};

const URL_SCHEMES: &[&str] = &["https://", "http://", "git@", "file://"];

/// Outcome of [`Materializer::materialize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Materialized {
    /// Freshly cloned into the work directory.
    Cloned(PathBuf),
    /// The derived directory already existed; no fetch was made.
    Existing(PathBuf),
    /// The source was a local directory and is used in place.
    Local(PathBuf),
}

impl Materialized {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Cloned(p) | Self::Existing(p) | Self::Local(p) => p,
        }
    }
}

/// Directory name for a repository URL: the last path segment without a `.git` suffix.
///
/// # Errors
///
/// Returns [`IndexError::InvalidSource`] if no usable name can be derived.
pub fn repo_dir_name(url: &str) -> Result<String> {
    let trimmed = url.trim_end_matches('/');
    let last = trimmed
        .rsplit(['/', ':'])
        .next()
        .unwrap_or_default();
    let name = last.strip_suffix(".git").unwrap_or(last);
    if name.is_empty() || name == "." || name == ".." {
        return Err(IndexError::InvalidSource(format!(
            "cannot derive a directory name from {url}"
        )));
    }
    Ok(name.to_owned())
}

/// Ensures a local copy of a repository exists under `workdir`.
#[derive(Debug, Clone)]
pub struct Materializer {
    workdir: PathBuf,
}

impl Materializer {
    #[must_use]
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    #[must_use]
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Resolve `source` to a local directory, cloning it if needed.
    ///
    /// An existing target directory is reused as-is and never updated. A local
    /// directory path is returned without copying.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::InvalidSource`] for unsupported sources and
    /// [`IndexError::GitClone`] if the clone cannot be run or fails.
    pub async fn materialize(&self, source: &str) -> Result<Materialized> {
        if !URL_SCHEMES.iter().any(|s| source.starts_with(s)) {
            let local = Path::new(source);
            if local.is_dir() {
                tracing::info!(path = %local.display(), "using local repository");
                return Ok(Materialized::Local(local.to_path_buf()));
            }
            return Err(IndexError::InvalidSource(format!(
                "unsupported URL scheme or missing directory: {source}"
            )));
        }
        if source.chars().any(char::is_whitespace) {
            return Err(IndexError::InvalidSource(
                "URL must not contain whitespace".to_owned(),
            ));
        }

        let dest = self.workdir.join(repo_dir_name(source)?);
        if tokio::fs::try_exists(&dest).await? {
            tracing::info!(path = %dest.display(), "repository already present, skipping clone");
            return Ok(Materialized::Existing(dest));
        }

        tokio::fs::create_dir_all(&self.workdir).await?;
        tracing::info!(url = source, path = %dest.display(), "cloning repository");

        let status = Command::new("git")
            .args(["clone", "--depth=1", source])
            .arg(&dest)
            .status()
            .await
            .map_err(|e| IndexError::GitClone(format!("failed to run git: {e}")))?;

        if !status.success() {
            let _ = tokio::fs::remove_dir_all(&dest).await;
            return Err(IndexError::GitClone(format!(
                "git clone of {source} exited with code {}",
                status.code().unwrap_or(-1)
            )));
        }

        Ok(Materialized::Cloned(dest))
    }
}
