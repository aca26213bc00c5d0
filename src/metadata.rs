//! Build metadata resolution.
//!
//! One immutable snapshot is computed at process start and threaded through
//! to the artifact stamper. A field that cannot be resolved degrades to an
//! empty value with a stderr diagnostic; the artifact simply stamps blank.

use crate::error::EngineError;
use crate::runner;
use chrono::{SecondsFormat, Utc};
use colored::Colorize;
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Environment facts gathered once per invocation.
#[derive(Debug, Clone, Serialize)]
pub struct BuildMetadata {
    /// Full HEAD commit id; empty when the checkout is not a repository.
    pub revision: String,
    /// Abbreviated (7 character) commit id.
    pub short_revision: String,
    /// Whether the working tree differs from HEAD.
    pub is_dirty: bool,
    /// UTC, RFC 3339, fixed at process start.
    pub build_timestamp: String,
    /// Trimmed `go version` output; empty when the toolchain is missing.
    pub toolchain_version: String,
}

impl BuildMetadata {
    /// Resolve a snapshot for the checkout at `root`.
    ///
    /// Fields degrade independently: failure to obtain one never aborts
    /// resolution of the others.
    pub async fn resolve(root: &Path) -> Self {
        let build_timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

        let (revision, short_revision, is_dirty) = match resolve_revision(root) {
            Ok(fields) => fields,
            Err(e) => {
                eprintln!("{}", format!("⚠️  {}", e).yellow());
                (String::new(), String::new(), false)
            }
        };

        let toolchain_version = match resolve_toolchain().await {
            Ok(version) => version,
            Err(e) => {
                eprintln!("{}", format!("⚠️  {}", e).yellow());
                String::new()
            }
        };

        Self {
            revision,
            short_revision,
            is_dirty,
            build_timestamp,
            toolchain_version,
        }
    }
}

impl fmt::Display for BuildMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dirty = if self.is_dirty { " (dirty)" } else { "" };
        writeln!(f, "Version:    {}{}", self.short_revision, dirty)?;
        writeln!(f, "Revision:   {}", self.revision)?;
        writeln!(f, "Build Date: {}", self.build_timestamp)?;
        write!(f, "Go Version: {}", self.toolchain_version)
    }
}

fn resolve_revision(root: &Path) -> Result<(String, String, bool), EngineError> {
    let repo = git2::Repository::discover(root).map_err(|e| {
        EngineError::Environment(format!(
            "no git repository at {}: {}",
            root.display(),
            e.message()
        ))
    })?;

    let head = repo
        .head()
        .and_then(|reference| reference.peel_to_commit())
        .map_err(|e| EngineError::Environment(format!("cannot resolve HEAD: {}", e.message())))?;

    // Commit ids are 40 hex characters; the short form is the conventional 7.
    let revision = head.id().to_string();
    let short_revision = revision[..7].to_string();
    let is_dirty = working_tree_dirty(&repo)?;

    Ok((revision, short_revision, is_dirty))
}

/// True when the index or working tree differs from HEAD. Untracked and
/// ignored files do not count: a fresh clone with build output lying around
/// is still a clean build.
fn working_tree_dirty(repo: &git2::Repository) -> Result<bool, EngineError> {
    let mut opts = git2::StatusOptions::new();
    opts.include_untracked(false).include_ignored(false);

    let statuses = repo
        .statuses(Some(&mut opts))
        .map_err(|e| EngineError::Environment(format!("cannot read git status: {}", e.message())))?;

    Ok(!statuses.is_empty())
}

async fn resolve_toolchain() -> Result<String, EngineError> {
    runner::capture("go", &["version"])
        .await
        .map_err(|e| EngineError::Environment(format!("go toolchain unavailable: {}", e)))
}
