//! Error taxonomy for the task engine.
//!
//! Everything here is fatal and aborts the run, with one exception:
//! `Environment` is recovered per-field during metadata resolution so that a
//! partially-instrumented checkout still produces a buildable artifact.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Requested task name is not in the declared graph.
    #[error("unknown task '{0}'")]
    UnknownTask(String),

    /// The dependency closure is not acyclic. Carries the offending path,
    /// first occurrence to the repeated task.
    #[error("dependency cycle: {}", .0.join(" -> "))]
    Cycle(Vec<String>),

    /// A task's action failed. Nothing after it was started.
    #[error("task '{name}' failed")]
    Task {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    /// Input enumeration or marker I/O failed. Indicates a misconfigured
    /// input set or an unwritable marker directory, not ordinary staleness.
    #[error("filesystem error at {}", path.display())]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Version-control or toolchain information was unavailable.
    #[error("{0}")]
    Environment(String),
}

impl EngineError {
    pub(crate) fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileSystem {
            path: path.into(),
            source,
        }
    }
}
