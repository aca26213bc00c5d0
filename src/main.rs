use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use colored::Colorize;
use std::io;
use std::path::PathBuf;
use taskforge::Result;

#[derive(Parser)]
#[command(name = "taskforge")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Dependency-aware build task runner", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Project root (defaults to the current directory)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a task and its dependency closure
    Run {
        /// Task name (defaults to 'iterate')
        task: Option<String>,
    },

    /// List declared tasks with dependencies and staleness
    List,

    /// Show which tasks would run and why
    Status {
        /// Output in JSON format
        #[arg(short, long)]
        json: bool,
    },

    /// Print the resolved build metadata snapshot
    Meta {
        /// Output in JSON format
        #[arg(short, long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to create tokio runtime");

    // Non-zero exit iff the requested task or a dependency failed.
    if let Err(e) = runtime.block_on(run_async(cli)) {
        eprintln!("{}", format!("Error: {:#}", e).red());
        std::process::exit(1);
    }
}

async fn run_async(cli: Cli) -> Result<()> {
    let root = match cli.dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Run { task } => {
            let task = task.as_deref().unwrap_or(taskforge::tasks::DEFAULT_TASK);
            taskforge::cli::run::run(&root, task).await?;
        }

        Commands::List => {
            taskforge::cli::list::run(&root)?;
        }

        Commands::Status { json } => {
            taskforge::cli::status::run(&root, json)?;
        }

        Commands::Meta { json } => {
            taskforge::cli::meta::run(&root, json).await?;
        }

        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "taskforge", &mut io::stdout());
        }
    }

    Ok(())
}
