//! Running the external collaborators (`rmapi`, `rmc`).
//!
//! Every invocation goes through [`run_tool`], which captures stdout/stderr
//! and bounds the call with a timeout. A process that outlives its timeout
//! is killed when the future is dropped.

use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Failure of one external tool invocation.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("{program} timed out after {timeout:?}")]
    TimedOut { program: String, timeout: Duration },
}

#[cfg(any(test, feature = "test-export-mocks"))]
impl CommandError {
    /// Non-zero exit with the given stderr, for scripting mocked collaborators.
    pub fn failed(program: impl Into<String>, stderr: impl Into<String>) -> Self {
        CommandError::Failed {
            program: program.into(),
            status: "exit status: 1".to_string(),
            stderr: stderr.into(),
        }
    }
}

/// Runs `program args..` (optionally inside `cwd`) and waits at most `timeout`.
/// Returns the captured stdout.
///
/// Non-zero exit is turned into [`CommandError::Failed`] carrying stderr.
pub async fn run_tool<I, S>(
    program: &Path,
    args: I,
    cwd: Option<&Path>,
    timeout: Duration,
) -> Result<String, CommandError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let name = program.display().to_string();
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    let output = match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            return Err(CommandError::Launch {
                program: name,
                source: e,
            })
        }
        Err(_) => {
            return Err(CommandError::TimedOut {
                program: name,
                timeout,
            })
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    debug!(program = %name, status = ?output.status, stderr = %stderr.trim(), "External tool finished");

    if !output.status.success() {
        return Err(CommandError::Failed {
            program: name,
            status: output.status.to_string(),
            stderr: stderr.trim().to_string(),
        });
    }

    Ok(stdout)
}
