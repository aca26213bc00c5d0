use crate::staleness::StalenessTracker;
use crate::{tasks, Result};
use colored::Colorize;
use serde::Serialize;
use std::path::Path;

/// Per-task staleness, as reported by `taskforge status`.
#[derive(Debug, Serialize)]
struct TaskStatus {
    name: String,
    tracked: bool,
    stale: bool,
}

pub fn run(root: &Path, json: bool) -> Result<()> {
    let tasks = tasks::canonical();
    let tracker = StalenessTracker::new(root);

    let mut report = Vec::new();
    for task in tasks.iter() {
        report.push(TaskStatus {
            name: task.name.clone(),
            tracked: task.tracked,
            stale: tracker.is_stale(task)?,
        });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let stale: Vec<_> = report.iter().filter(|s| s.tracked && s.stale).collect();

    if stale.is_empty() {
        println!("{}", "✓ everything is up to date".green());
    } else {
        println!("{}", "Stale tasks:".yellow().bold());
        for status in stale {
            println!("   • {}", status.name);
        }
    }

    Ok(())
}
