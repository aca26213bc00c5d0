//! External command execution.
//!
//! Every task action is a blocking toolchain invocation: spawn, stream
//! output, map a non-zero exit to an error. A spinner keeps long compiler or
//! linter runs legible; when it is disabled, output streams straight through.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

/// Run a command in `cwd` to completion.
///
/// With `show_progress`, output is collected behind a spinner and replayed
/// only on failure; without it, stdout and stderr stream to the terminal in
/// real time.
pub async fn run_in<S: AsRef<OsStr>>(
    cwd: &Path,
    program: &str,
    args: &[S],
    show_progress: bool,
) -> Result<()> {
    let display_cmd = display_command(program, args);

    let mut cmd = Command::new(program);
    cmd.args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let progress = if show_progress {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "),
        );
        pb.set_message(format!("Running {}...", display_cmd));
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let mut child = cmd.spawn().with_context(|| {
        format!(
            "Command '{}' not found. Please ensure it is installed and in your PATH.",
            program
        )
    })?;

    // Stream stdout and stderr concurrently to avoid backpressure deadlock
    let stdout = child.stdout.take().context("Failed to capture stdout")?;
    let stderr = child.stderr.take().context("Failed to capture stderr")?;

    let mut stdout_reader = BufReader::new(stdout).lines();
    let mut stderr_reader = BufReader::new(stderr).lines();

    let mut output = String::new();
    let mut stderr_output = String::new();
    let mut stdout_done = false;
    let mut stderr_done = false;

    while !stdout_done || !stderr_done {
        tokio::select! {
            line = stdout_reader.next_line(), if !stdout_done => {
                match line {
                    Ok(Some(line)) => {
                        output.push_str(&line);
                        output.push('\n');

                        if let Some(ref pb) = progress {
                            pb.set_message(shorten(&line));
                        } else {
                            println!("{}", line);
                        }
                    }
                    Ok(None) => stdout_done = true,
                    Err(e) => return Err(anyhow::anyhow!("Failed to read stdout: {}", e)),
                }
            }
            line = stderr_reader.next_line(), if !stderr_done => {
                match line {
                    Ok(Some(line)) => {
                        stderr_output.push_str(&line);
                        stderr_output.push('\n');

                        if progress.is_none() {
                            eprintln!("{}", line);
                        }
                    }
                    Ok(None) => stderr_done = true,
                    Err(e) => return Err(anyhow::anyhow!("Failed to read stderr: {}", e)),
                }
            }
        }
    }

    let status = child.wait().await?;

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    if !status.success() {
        // The spinner swallowed the tool's findings; replay them before
        // reporting the failure.
        if show_progress && !output.is_empty() {
            print!("{}", output);
        }
        anyhow::bail!(
            "Command '{}' failed with exit code {:?}\nStderr: {}",
            display_cmd,
            status.code(),
            stderr_output
        );
    }

    Ok(())
}

/// Run a command and capture its trimmed stdout. No spinner, no streaming:
/// the output is the point.
pub async fn capture(program: &str, args: &[&str]) -> Result<String> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await
        .with_context(|| format!("Command '{}' not found", program))?;

    if !output.status.success() {
        anyhow::bail!(
            "Command '{}' failed with exit code {:?}",
            display_command(program, args),
            output.status.code()
        );
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn display_command<S: AsRef<OsStr>>(program: &str, args: &[S]) -> String {
    let mut parts = vec![program.to_string()];
    parts.extend(args.iter().map(|a| a.as_ref().to_string_lossy().into_owned()));
    parts.join(" ")
}

fn shorten(line: &str) -> String {
    if line.chars().count() > 60 {
        let truncated: String = line.chars().take(60).collect();
        format!("{}...", truncated)
    } else {
        line.to_string()
    }
}
