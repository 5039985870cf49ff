use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::Command;

use crate::error::ExecError;

/// Result of a child process execution.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ExecResult {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was killed (timeout or signal).
    pub exit_code: Option<i32>,
    pub timed_out: bool,
}

impl ExecResult {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Run `sh -c <command>` in `cwd` with a hard wall-clock timeout.
pub async fn execute_shell(
    command: &str,
    cwd: &Path,
    timeout: Duration,
) -> Result<ExecResult, ExecError> {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    run_with_timeout(cmd, cwd, timeout).await
}

/// Run a program directly (no shell) in `cwd` with a hard wall-clock timeout.
pub async fn run_program(
    program: &str,
    args: &[&str],
    cwd: &Path,
    timeout: Duration,
) -> Result<ExecResult, ExecError> {
    let mut cmd = Command::new(program);
    cmd.args(args);
    run_with_timeout(cmd, cwd, timeout).await
}

/// Spawn in its own process group, capture both streams independently, and
/// kill the whole group if the deadline passes. Output gathered before the
/// kill is returned alongside `timed_out = true`.
async fn run_with_timeout(
    mut cmd: Command,
    cwd: &Path,
    timeout: Duration,
) -> Result<ExecResult, ExecError> {
    let mut child = cmd
        .current_dir(cwd)
        .process_group(0)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| ExecError::SpawnFailed(e.to_string()))?;

    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| ExecError::SpawnFailed("stdout not captured".into()))?;
    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| ExecError::SpawnFailed("stderr not captured".into()))?;

    let stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        let _ = stdout.read_to_end(&mut buf).await;
        buf
    });
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        let _ = stderr.read_to_end(&mut buf).await;
        buf
    });

    let (exit_code, timed_out) = match tokio::time::timeout(timeout, child.wait()).await {
        Ok(Ok(status)) => (status.code(), false),
        Ok(Err(e)) => return Err(ExecError::ProcessFailed(e.to_string())),
        Err(_) => {
            if let Some(pid) = child.id() {
                let pgid = nix::unistd::Pid::from_raw(pid as i32);
                let _ = nix::sys::signal::killpg(pgid, nix::sys::signal::Signal::SIGKILL);
            }
            // Reap the child to prevent zombies.
            let _ = child.wait().await;
            (None, true)
        }
    };

    let stdout = stdout_task
        .await
        .map_err(|e| ExecError::ProcessFailed(e.to_string()))?;
    let stderr = stderr_task
        .await
        .map_err(|e| ExecError::ProcessFailed(e.to_string()))?;

    Ok(ExecResult {
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
        exit_code,
        timed_out,
    })
}
