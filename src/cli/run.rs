use crate::config::Config;
use crate::executor::Executor;
use crate::graph::RunContext;
use crate::metadata::BuildMetadata;
use crate::staleness::StalenessTracker;
use crate::{tasks, Result};
use colored::Colorize;
use std::path::Path;

pub async fn run(root: &Path, task: &str) -> Result<()> {
    let config = Config::load(root)?;
    let meta = BuildMetadata::resolve(root).await;

    if meta.short_revision.is_empty() {
        println!("{}", format!("🔨 {}", task).cyan());
    } else {
        let dirty = if meta.is_dirty { " (dirty)" } else { "" };
        println!(
            "{}",
            format!("🔨 {} at {}{}", task, meta.short_revision, dirty).cyan()
        );
    }

    let tasks = tasks::canonical();
    let tracker = StalenessTracker::new(root);
    let cx = RunContext {
        root: root.to_path_buf(),
        config,
        meta,
    };

    let mut executor = Executor::new(&tasks, &tracker, &cx);
    executor.run(task).await?;

    println!("{}", "✓ done".green());
    Ok(())
}
