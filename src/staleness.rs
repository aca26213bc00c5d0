//! Staleness tracking via per-task marker files.
//!
//! A marker is a zero-byte file whose modification time records "task last
//! completed at T". A task is stale when any declared input is newer than
//! its marker. Markers are touched only after an action succeeds; nothing
//! else mutates them.

use crate::error::EngineError;
use crate::graph::{Input, Task};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

/// Hidden directory under the project root holding one marker per task.
pub const MARKER_DIR: &str = ".taskforge";

pub struct StalenessTracker {
    root: PathBuf,
    marker_dir: PathBuf,
}

impl StalenessTracker {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let marker_dir = root.join(MARKER_DIR);
        Self { root, marker_dir }
    }

    /// Marker file for a task, named deterministically from the task name.
    pub fn marker_path(&self, task: &str) -> PathBuf {
        self.marker_dir.join(format!("{}.stamp", task))
    }

    /// Whether `task` must run.
    ///
    /// Untracked tasks, tasks without a marker, and tasks with an empty
    /// input set are always stale. Otherwise a task is stale exactly when
    /// some input file was modified after the marker was written.
    pub fn is_stale(&self, task: &Task) -> Result<bool, EngineError> {
        if !task.tracked {
            return Ok(true);
        }

        let marker = self.marker_path(&task.name);
        let marker_time = match fs::metadata(&marker) {
            Ok(meta) => meta
                .modified()
                .map_err(|e| EngineError::fs(&marker, e))?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(true),
            Err(e) => return Err(EngineError::fs(&marker, e)),
        };

        if task.inputs.is_empty() {
            // No natural inputs to compare against: always re-run.
            return Ok(true);
        }

        match newest_input_time(&self.root, &task.inputs)? {
            Some(newest) => Ok(newest > marker_time),
            // Inputs declared but none present on disk.
            None => Ok(false),
        }
    }

    /// Record successful completion with a single atomic touch
    /// (create-or-truncate). Creates the marker directory on first use.
    pub fn mark_complete(&self, task: &Task) -> Result<(), EngineError> {
        if !task.tracked {
            return Ok(());
        }

        fs::create_dir_all(&self.marker_dir)
            .map_err(|e| EngineError::fs(&self.marker_dir, e))?;

        let marker = self.marker_path(&task.name);
        fs::File::create(&marker).map_err(|e| EngineError::fs(&marker, e))?;
        Ok(())
    }

    /// Drop every marker: all tracked tasks become stale again.
    pub fn clear(&self) -> Result<(), EngineError> {
        match fs::remove_dir_all(&self.marker_dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(EngineError::fs(&self.marker_dir, e)),
        }
    }

    pub fn marker_dir(&self) -> &Path {
        &self.marker_dir
    }
}

/// Maximum modification time over all files matched by `inputs`, or `None`
/// when nothing matched. Missing files and directories are skipped; an entry
/// that exists but cannot be read is a fatal filesystem error.
fn newest_input_time(
    root: &Path,
    inputs: &[Input],
) -> Result<Option<SystemTime>, EngineError> {
    let mut newest: Option<SystemTime> = None;

    for input in inputs {
        match input {
            Input::File(rel) => {
                let path = root.join(rel);
                match fs::metadata(&path) {
                    Ok(meta) => {
                        let mtime = meta.modified().map_err(|e| EngineError::fs(&path, e))?;
                        bump(&mut newest, mtime);
                    }
                    Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                    Err(e) => return Err(EngineError::fs(&path, e)),
                }
            }
            Input::Tree { root: rel, extensions } => {
                let base = root.join(rel);
                if !base.exists() {
                    continue;
                }
                for entry in WalkDir::new(&base) {
                    let entry = entry.map_err(|e| {
                        let path = e
                            .path()
                            .map(Path::to_path_buf)
                            .unwrap_or_else(|| base.clone());
                        EngineError::fs(path, e.into())
                    })?;

                    if !entry.file_type().is_file() {
                        continue;
                    }
                    if !matches_extension(entry.path(), extensions) {
                        continue;
                    }

                    let meta = entry
                        .metadata()
                        .map_err(|e| EngineError::fs(entry.path(), e.into()))?;
                    let mtime = meta
                        .modified()
                        .map_err(|e| EngineError::fs(entry.path(), e))?;
                    bump(&mut newest, mtime);
                }
            }
        }
    }

    Ok(newest)
}

fn matches_extension(path: &Path, extensions: &[String]) -> bool {
    if extensions.is_empty() {
        return true;
    }
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| extensions.iter().any(|want| want == ext))
}

fn bump(newest: &mut Option<SystemTime>, candidate: SystemTime) {
    match newest {
        Some(current) if *current >= candidate => {}
        _ => *newest = Some(candidate),
    }
}
