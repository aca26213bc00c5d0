//! The canonical task table.
//!
//! Tasks, dependency edges, and input sets are data consumed by the generic
//! executor; the actions are ordinary toolchain invocations. `iterate` is
//! the default entry point: full check plus build.

use crate::graph::{Action, Input, RunContext, Task, TaskSet};
use crate::staleness::MARKER_DIR;
use crate::{runner, stamp, Result};
use async_trait::async_trait;
use std::io;

pub const DEFAULT_TASK: &str = "iterate";

/// External command action: run in the project root, fail on non-zero exit.
pub struct Cmd {
    program: String,
    args: Vec<String>,
}

impl Cmd {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

#[async_trait]
impl Action for Cmd {
    async fn run(&self, cx: &RunContext) -> Result<()> {
        runner::run_in(&cx.root, &self.program, &self.args, true).await
    }
}

/// Compiles the artifact with metadata substitutions baked in.
struct Build;

#[async_trait]
impl Action for Build {
    async fn run(&self, cx: &RunContext) -> Result<()> {
        let flags = stamp::ldflags(&cx.meta, &cx.config.ldflags_prefix);
        runner::run_in(
            &cx.root,
            "go",
            &["build", "-ldflags", &flags, "-o", &cx.config.target],
            true,
        )
        .await
    }
}

/// Installs into GOBIN with the same substitutions.
struct Install;

#[async_trait]
impl Action for Install {
    async fn run(&self, cx: &RunContext) -> Result<()> {
        let flags = stamp::ldflags(&cx.meta, &cx.config.ldflags_prefix);
        runner::run_in(&cx.root, "go", &["install", "-ldflags", &flags], true).await
    }
}

/// Removes the build artifact and every staleness marker.
struct Clean;

#[async_trait]
impl Action for Clean {
    async fn run(&self, cx: &RunContext) -> Result<()> {
        remove_if_exists(std::fs::remove_file(cx.root.join(&cx.config.target)))?;
        remove_if_exists(std::fs::remove_dir_all(cx.root.join(MARKER_DIR)))?;
        Ok(())
    }
}

fn remove_if_exists(result: io::Result<()>) -> Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn go_sources() -> Input {
    Input::tree(".", &["go"])
}

/// The declared task graph.
///
/// Markers live in the hidden `.taskforge/` directory. `install` depends on
/// `tidy`, not on `build`: installing compiles from source itself, so a
/// local artifact is not a prerequisite.
pub fn canonical() -> TaskSet {
    let mut tasks = TaskSet::new();

    tasks.declare(
        Task::new("fmt")
            .input(go_sources())
            .tracked()
            .action(Cmd::new("gofumpt", &["-w", "."])),
    );
    tasks.declare(
        Task::new("lint")
            .input(go_sources())
            .tracked()
            .action(Cmd::new("golangci-lint", &["run"])),
    );
    tasks.declare(
        Task::new("vet")
            .input(go_sources())
            .tracked()
            .action(Cmd::new("go", &["vet", "./..."])),
    );
    tasks.declare(Task::new("check").deps(&["lint", "fmt", "vet"]));
    tasks.declare(
        Task::new("tidy")
            .input(Input::file("go.mod"))
            .input(Input::file("go.sum"))
            .tracked()
            .action(Cmd::new("go", &["mod", "tidy"])),
    );
    tasks.declare(
        Task::new("build")
            .deps(&["tidy"])
            .input(go_sources())
            .input(Input::file("go.mod"))
            .input(Input::file("go.sum"))
            .tracked()
            .action(Build),
    );
    tasks.declare(Task::new("install").deps(&["tidy"]).action(Install));
    tasks.declare(Task::new("clean").action(Clean));
    tasks.declare(Task::new(DEFAULT_TASK).deps(&["check", "build"]));

    tasks
}
