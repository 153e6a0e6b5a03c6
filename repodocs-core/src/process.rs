//! Child process invocation shared by the git and build collaborators.

use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::{timeout, Duration};

/// Captured result of a finished child process.
#[derive(Debug)]
pub(crate) struct Captured {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug)]
pub(crate) enum RunError {
    Launch(std::io::Error),
    TimedOut(u64),
}

pub(crate) fn display_command(program: &str, args: &[String]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}

/// Runs `program` in `dir` and waits for it, capturing both output streams.
///
/// Without `timeout_secs` a hung process blocks the caller indefinitely.
pub(crate) async fn run_captured(
    program: &str,
    args: &[String],
    dir: &Path,
    timeout_secs: Option<u64>,
) -> Result<Captured, RunError> {
    let mut command = Command::new(program);
    command
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    tracing::debug!(
        command = %display_command(program, args),
        dir = %dir.display(),
        "Spawning process"
    );

    let output = match timeout_secs {
        Some(secs) => match timeout(Duration::from_secs(secs), command.output()).await {
            Ok(result) => result,
            Err(_) => return Err(RunError::TimedOut(secs)),
        },
        None => command.output().await,
    }
    .map_err(RunError::Launch)?;

    Ok(Captured {
        code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}
