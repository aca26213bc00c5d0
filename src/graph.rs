//! Task declarations and dependency resolution.
//!
//! Tasks, their dependency edges, and their input sets are data; one generic
//! resolver turns a requested task into a deterministic execution schedule.

use crate::config::Config;
use crate::error::EngineError;
use crate::metadata::BuildMetadata;
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::PathBuf;

/// A declared input of a task, relative to the project root.
#[derive(Debug, Clone)]
pub enum Input {
    /// A single file. Missing files are skipped, not errors.
    File(PathBuf),
    /// Recursive walk rooted at a directory, keeping files whose extension
    /// matches one of `extensions` (every file when the list is empty).
    Tree {
        root: PathBuf,
        extensions: Vec<String>,
    },
}

impl Input {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Input::File(path.into())
    }

    pub fn tree(root: impl Into<PathBuf>, extensions: &[&str]) -> Self {
        Input::Tree {
            root: root.into(),
            extensions: extensions.iter().map(|e| e.to_string()).collect(),
        }
    }
}

/// Everything a task action may consult. Read-only for the whole run.
pub struct RunContext {
    pub root: PathBuf,
    pub config: Config,
    pub meta: BuildMetadata,
}

/// A task body. Implementations are opaque to the executor: success or
/// failure is the only contract.
#[async_trait]
pub trait Action: Send + Sync {
    async fn run(&self, cx: &RunContext) -> crate::Result<()>;
}

/// A named unit of build work.
pub struct Task {
    pub name: String,
    /// Prerequisite task names, deduplicated, in declaration order.
    pub deps: Vec<String>,
    pub inputs: Vec<Input>,
    /// None for aggregate tasks that exist only to group dependencies.
    pub action: Option<Box<dyn Action>>,
    /// Whether completion is recorded as a staleness marker. Untracked tasks
    /// run unconditionally.
    pub tracked: bool,
}

impl Task {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            deps: Vec::new(),
            inputs: Vec::new(),
            action: None,
            tracked: false,
        }
    }

    /// Declare prerequisites. Duplicates are dropped, keeping the first
    /// occurrence so sibling ordering stays stable.
    pub fn deps(mut self, deps: &[&str]) -> Self {
        for dep in deps {
            if !self.deps.iter().any(|d| d == dep) {
                self.deps.push(dep.to_string());
            }
        }
        self
    }

    pub fn input(mut self, input: Input) -> Self {
        self.inputs.push(input);
        self
    }

    pub fn action(mut self, action: impl Action + 'static) -> Self {
        self.action = Some(Box::new(action));
        self
    }

    pub fn tracked(mut self) -> Self {
        self.tracked = true;
        self
    }
}

/// The declared task graph. Declaration order is preserved; it breaks ties
/// between siblings during scheduling.
#[derive(Default)]
pub struct TaskSet {
    tasks: Vec<Task>,
}

impl TaskSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, task: Task) {
        self.tasks.push(task);
    }

    pub fn get(&self, name: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Dependency closure of `name` in execution order: dependencies before
    /// dependents, declaration order among siblings.
    ///
    /// Iterative depth-first post-order with an explicit stack, so deep
    /// graphs cannot overflow the call stack. Cycles and undeclared names
    /// are reported before anything runs.
    pub fn resolve<'a>(&'a self, name: &str) -> Result<Vec<&'a Task>, EngineError> {
        let start = self
            .get(name)
            .ok_or_else(|| EngineError::UnknownTask(name.to_string()))?;

        enum Frame<'a> {
            Enter(&'a Task),
            Exit(&'a Task),
        }

        let mut order: Vec<&'a Task> = Vec::new();
        let mut placed: HashSet<&'a str> = HashSet::new();
        // The current depth-first path, kept both as a set (membership) and a
        // stack (cycle reporting).
        let mut on_path: HashSet<&'a str> = HashSet::new();
        let mut path: Vec<&'a str> = Vec::new();

        let mut stack = vec![Frame::Enter(start)];

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Enter(task) => {
                    if placed.contains(task.name.as_str()) {
                        continue;
                    }
                    if on_path.contains(task.name.as_str()) {
                        let pos = path
                            .iter()
                            .position(|n| *n == task.name)
                            .expect("cycle member must be on the current path");
                        let mut cycle: Vec<String> =
                            path[pos..].iter().map(|n| n.to_string()).collect();
                        cycle.push(task.name.clone());
                        return Err(EngineError::Cycle(cycle));
                    }

                    on_path.insert(task.name.as_str());
                    path.push(task.name.as_str());
                    stack.push(Frame::Exit(task));

                    // Reversed so the first-declared dependency is resolved
                    // (and therefore scheduled) first.
                    for dep in task.deps.iter().rev() {
                        let dep_task = self
                            .get(dep)
                            .ok_or_else(|| EngineError::UnknownTask(dep.clone()))?;
                        stack.push(Frame::Enter(dep_task));
                    }
                }
                Frame::Exit(task) => {
                    on_path.remove(task.name.as_str());
                    path.pop();
                    placed.insert(task.name.as_str());
                    order.push(task);
                }
            }
        }

        Ok(order)
    }
}
