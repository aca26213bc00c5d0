//! Sequential execution over a resolved schedule.
//!
//! Actions share the source tree, so ordering correctness is the guarantee:
//! dependencies run before dependents, one at a time, and the first failure
//! stops everything.

use crate::error::EngineError;
use crate::graph::{RunContext, Task, TaskSet};
use crate::staleness::StalenessTracker;
use colored::Colorize;
use std::collections::HashSet;

/// Terminal state of a task within one invocation. Both mean "downstream
/// dependents may proceed".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Inputs unchanged since the last completion; the action did not run.
    Skipped,
    /// The action ran and succeeded.
    Completed,
}

/// Walks a task's dependency closure and runs whatever is stale.
pub struct Executor<'a> {
    tasks: &'a TaskSet,
    tracker: &'a StalenessTracker,
    cx: &'a RunContext,
    /// Tasks already handled in this invocation. A shared dependency runs at
    /// most once no matter how many dependents pull it in.
    visited: HashSet<String>,
}

impl<'a> Executor<'a> {
    pub fn new(tasks: &'a TaskSet, tracker: &'a StalenessTracker, cx: &'a RunContext) -> Self {
        Self {
            tasks,
            tracker,
            cx,
            visited: HashSet::new(),
        }
    }

    /// Run `name` and its dependency closure.
    ///
    /// Cycles and unknown names are rejected before any action starts.
    /// Fail-fast: the first failing action aborts the run.
    pub async fn run(&mut self, name: &str) -> Result<(), EngineError> {
        let schedule = self.tasks.resolve(name)?;

        for task in schedule {
            if self.visited.contains(&task.name) {
                continue;
            }
            self.run_one(task).await?;
            self.visited.insert(task.name.clone());
        }

        Ok(())
    }

    async fn run_one(&self, task: &Task) -> Result<TaskOutcome, EngineError> {
        if !self.tracker.is_stale(task)? {
            println!("{}", format!("  {} is up to date", task.name).dimmed());
            return Ok(TaskOutcome::Skipped);
        }

        if let Some(action) = &task.action {
            println!("{}", format!("▶ {}", task.name).cyan());
            action.run(self.cx).await.map_err(|e| EngineError::Task {
                name: task.name.clone(),
                source: e,
            })?;
        }

        // The only place a marker is ever touched, and only after success.
        self.tracker.mark_complete(task)?;
        Ok(TaskOutcome::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::graph::{Action, Input};
    use crate::metadata::BuildMetadata;
    use async_trait::async_trait;
    use std::fs;
    use std::path::Path;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Appends its task name to a shared log when run.
    struct Recording {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Action for Recording {
        async fn run(&self, _cx: &RunContext) -> crate::Result<()> {
            self.log.lock().unwrap().push(self.name.to_string());
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl Action for Failing {
        async fn run(&self, _cx: &RunContext) -> crate::Result<()> {
            anyhow::bail!("simulated tool failure")
        }
    }

    fn context(root: &Path) -> RunContext {
        RunContext {
            root: root.to_path_buf(),
            config: Config::default(),
            meta: BuildMetadata {
                revision: "abcd1234abcd1234abcd1234abcd1234abcd1234".into(),
                short_revision: "abcd123".into(),
                is_dirty: false,
                build_timestamp: "2024-01-01T00:00:00Z".into(),
                toolchain_version: "1.21".into(),
            },
        }
    }

    fn recording_task(
        name: &'static str,
        deps: &[&str],
        log: &Arc<Mutex<Vec<String>>>,
    ) -> Task {
        Task::new(name).deps(deps).action(Recording {
            name,
            log: Arc::clone(log),
        })
    }

    #[tokio::test]
    async fn test_chain_runs_dependencies_first() {
        let temp_dir = TempDir::new().unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));

        let mut tasks = TaskSet::new();
        tasks.declare(recording_task("a", &["b"], &log));
        tasks.declare(recording_task("b", &["c"], &log));
        tasks.declare(recording_task("c", &[], &log));

        let tracker = StalenessTracker::new(temp_dir.path());
        let cx = context(temp_dir.path());
        let mut executor = Executor::new(&tasks, &tracker, &cx);

        executor.run("a").await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["c", "b", "a"]);
    }

    #[tokio::test]
    async fn test_shared_dependency_runs_once() {
        let temp_dir = TempDir::new().unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));

        let mut tasks = TaskSet::new();
        tasks.declare(recording_task("a", &["b", "c"], &log));
        tasks.declare(recording_task("b", &["d"], &log));
        tasks.declare(recording_task("c", &["d"], &log));
        tasks.declare(recording_task("d", &[], &log));

        let tracker = StalenessTracker::new(temp_dir.path());
        let cx = context(temp_dir.path());
        let mut executor = Executor::new(&tasks, &tracker, &cx);

        executor.run("a").await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["d", "b", "c", "a"]);
    }

    #[tokio::test]
    async fn test_repeated_run_calls_do_not_rerun_tasks() {
        let temp_dir = TempDir::new().unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));

        let mut tasks = TaskSet::new();
        tasks.declare(recording_task("a", &["c"], &log));
        tasks.declare(recording_task("b", &["c"], &log));
        tasks.declare(recording_task("c", &[], &log));

        let tracker = StalenessTracker::new(temp_dir.path());
        let cx = context(temp_dir.path());
        let mut executor = Executor::new(&tasks, &tracker, &cx);

        executor.run("a").await.unwrap();
        executor.run("b").await.unwrap();

        // c ran for a; the second invocation of the same process reuses it.
        assert_eq!(*log.lock().unwrap(), vec!["c", "a", "b"]);
    }

    #[tokio::test]
    async fn test_failure_aborts_before_dependents() {
        let temp_dir = TempDir::new().unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));

        let mut tasks = TaskSet::new();
        tasks.declare(recording_task("a", &["bad", "after"], &log));
        tasks.declare(Task::new("bad").action(Failing));
        tasks.declare(recording_task("after", &[], &log));

        let tracker = StalenessTracker::new(temp_dir.path());
        let cx = context(temp_dir.path());
        let mut executor = Executor::new(&tasks, &tracker, &cx);

        let err = executor.run("a").await.unwrap_err();
        match err {
            EngineError::Task { name, source } => {
                assert_eq!(name, "bad");
                assert!(source.to_string().contains("simulated tool failure"));
            }
            other => panic!("expected task error, got {}", other),
        }

        // Fail-fast: neither the sibling nor the dependent ran.
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cycle_is_rejected_before_any_action() {
        let temp_dir = TempDir::new().unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));

        let mut tasks = TaskSet::new();
        tasks.declare(recording_task("a", &["b"], &log));
        tasks.declare(recording_task("b", &["a"], &log));

        let tracker = StalenessTracker::new(temp_dir.path());
        let cx = context(temp_dir.path());
        let mut executor = Executor::new(&tasks, &tracker, &cx);

        assert!(matches!(
            executor.run("a").await,
            Err(EngineError::Cycle(_))
        ));
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_task_executes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));

        let mut tasks = TaskSet::new();
        tasks.declare(recording_task("a", &[], &log));

        let tracker = StalenessTracker::new(temp_dir.path());
        let cx = context(temp_dir.path());
        let mut executor = Executor::new(&tasks, &tracker, &cx);

        assert!(matches!(
            executor.run("deploy").await,
            Err(EngineError::UnknownTask(name)) if name == "deploy"
        ));
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fresh_task_is_skipped_but_counts_as_visited() {
        let temp_dir = TempDir::new().unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));

        fs::write(temp_dir.path().join("main.go"), "package main").unwrap();

        let mut tasks = TaskSet::new();
        tasks.declare(
            Task::new("vet")
                .input(Input::tree(".", &["go"]))
                .tracked()
                .action(Recording {
                    name: "vet",
                    log: Arc::clone(&log),
                }),
        );
        tasks.declare(recording_task("check", &["vet"], &log));

        let tracker = StalenessTracker::new(temp_dir.path());
        let cx = context(temp_dir.path());

        // First run executes vet and records a marker.
        let mut executor = Executor::new(&tasks, &tracker, &cx);
        executor.run("check").await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["vet", "check"]);

        // A new invocation sees the marker and skips vet's action, while the
        // dependent still proceeds.
        let mut executor = Executor::new(&tasks, &tracker, &cx);
        executor.run("check").await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["vet", "check", "check"]);
    }

    #[tokio::test]
    async fn test_marker_written_only_after_success() {
        let temp_dir = TempDir::new().unwrap();

        let mut tasks = TaskSet::new();
        tasks.declare(Task::new("bad").tracked().action(Failing));

        let tracker = StalenessTracker::new(temp_dir.path());
        let cx = context(temp_dir.path());
        let mut executor = Executor::new(&tasks, &tracker, &cx);

        assert!(executor.run("bad").await.is_err());
        assert!(!tracker.marker_path("bad").exists());
    }
}
