use crate::staleness::StalenessTracker;
use crate::{tasks, Result};
use colored::Colorize;
use std::path::Path;

pub fn run(root: &Path) -> Result<()> {
    let tasks = tasks::canonical();
    let tracker = StalenessTracker::new(root);

    println!("{}", "📋 Declared tasks:".cyan());
    println!();
    println!("{:<10} {:<22} {}", "Task".bold(), "Depends on".bold(), "State".bold());
    println!("{}", "─".repeat(50));

    for task in tasks.iter() {
        let deps = if task.deps.is_empty() {
            "-".dimmed().to_string()
        } else {
            task.deps.join(", ")
        };

        let state = if !task.tracked {
            "always runs".dimmed().to_string()
        } else if tracker.is_stale(task)? {
            "stale".yellow().to_string()
        } else {
            "up to date".green().to_string()
        };

        println!("{:<10} {:<22} {}", task.name, deps, state);
    }

    println!();
    Ok(())
}
