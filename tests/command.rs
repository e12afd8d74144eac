#![cfg(unix)]

use std::fs::write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rmcloud2pdf::command::{run_tool, CommandError};
use rmcloud2pdf::config::ToolConfig;
use rmcloud2pdf::contract::{PageConverter, RemoteStore};
use rmcloud2pdf::convert::Rmc;
use rmcloud2pdf::listing::RemotePath;
use rmcloud2pdf::remote::Rmapi;
use serial_test::serial;
use tempfile::tempdir;

const TIMEOUT: Duration = Duration::from_secs(10);

/// Writes an executable script that appends its argv, one per line, and its
/// working directory to `log`, then runs `body`.
fn recording_script(dir: &Path, name: &str, log: &Path, body: &str) -> PathBuf {
    let path = dir.join(name);
    let script = format!(
        "#!/bin/sh\nprintf '%s\\n' \"$@\" > '{log}'\necho \"cwd=$(pwd)\" >> '{log}'\n{body}\n",
        log = log.display(),
    );
    write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn logged_lines(log: &Path) -> Vec<String> {
    std::fs::read_to_string(log)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[tokio::test]
#[serial]
async fn returns_stdout_on_success() {
    let stdout = run_tool(Path::new("sh"), ["-c", "echo hello"], None, TIMEOUT)
        .await
        .unwrap();
    assert_eq!(stdout, "hello\n");
}

#[tokio::test]
#[serial]
async fn slow_tool_times_out_and_is_not_waited_for() {
    let started = Instant::now();

    let err = run_tool(Path::new("sleep"), ["5"], None, Duration::from_millis(200))
        .await
        .unwrap_err();

    assert!(matches!(err, CommandError::TimedOut { .. }), "got {err:?}");
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
#[serial]
async fn non_zero_exit_carries_stderr() {
    let err = run_tool(
        Path::new("sh"),
        ["-c", "echo bad >&2; exit 3"],
        None,
        TIMEOUT,
    )
    .await
    .unwrap_err();

    match &err {
        CommandError::Failed { program, stderr, .. } => {
            assert_eq!(program, "sh");
            assert_eq!(stderr, "bad");
        }
        other => panic!("expected Failed, got {other:?}"),
    }
    assert!(err.to_string().contains("bad"));
    assert!(err.to_string().contains('3'));
}

#[tokio::test]
#[serial]
async fn missing_binary_fails_to_launch() {
    let err = run_tool(
        Path::new("/nonexistent/bin/rmapi"),
        ["find", "."],
        None,
        TIMEOUT,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, CommandError::Launch { .. }), "got {err:?}");
}

#[tokio::test]
#[serial]
async fn runs_inside_the_requested_directory() {
    let dir = tempdir().unwrap();

    let stdout = run_tool(Path::new("sh"), ["-c", "pwd"], Some(dir.path()), TIMEOUT)
        .await
        .unwrap();

    assert_eq!(
        PathBuf::from(stdout.trim()).canonicalize().unwrap(),
        dir.path().canonicalize().unwrap()
    );
}

#[tokio::test]
#[serial]
async fn rmc_is_called_with_format_flags_then_output_then_input() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("argv.log");
    let rmc = recording_script(dir.path(), "rmc", &log, "exit 0");
    let converter = Rmc::new(ToolConfig {
        rmc,
        timeout: TIMEOUT,
        ..ToolConfig::default()
    });

    let input = dir.path().join("page.rm");
    let output = dir.path().join("page.pdf");
    converter.convert(&input, &output).await.unwrap();

    let lines = logged_lines(&log);
    let output_arg = output.display().to_string();
    let input_arg = input.display().to_string();
    assert_eq!(
        lines[..6],
        ["-f", "rm", "-t", "pdf", "-o", output_arg.as_str()]
    );
    assert_eq!(lines[6], input_arg);
    assert_eq!(lines.len(), 8);
}

#[tokio::test]
#[serial]
async fn rmc_failure_is_reported() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("argv.log");
    let rmc = recording_script(
        dir.path(),
        "rmc",
        &log,
        "echo 'unsupported file version' >&2\nexit 1",
    );
    let converter = Rmc::new(ToolConfig {
        rmc,
        timeout: TIMEOUT,
        ..ToolConfig::default()
    });

    let err = converter
        .convert(&dir.path().join("a.rm"), &dir.path().join("a.pdf"))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("unsupported file version"));
}

#[tokio::test]
#[serial]
async fn rmapi_lists_with_find_dot() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("argv.log");
    let rmapi = recording_script(
        dir.path(),
        "rmapi",
        &log,
        "printf '[d] /Notes\\n[f] /Notes/Quarterly\\n'",
    );
    let store = Rmapi::new(ToolConfig {
        rmapi,
        timeout: TIMEOUT,
        ..ToolConfig::default()
    });

    let listing = store.list().await.unwrap();

    assert_eq!(listing, "[d] /Notes\n[f] /Notes/Quarterly\n");
    assert_eq!(logged_lines(&log)[..2], ["find", "."]);
}

#[tokio::test]
#[serial]
async fn rmapi_fetches_with_get_inside_the_workdir() {
    let dir = tempdir().unwrap();
    let workdir = dir.path().join("work");
    std::fs::create_dir_all(&workdir).unwrap();
    let log = dir.path().join("argv.log");
    let rmapi = recording_script(dir.path(), "rmapi", &log, "exit 0");
    let store = Rmapi::new(ToolConfig {
        rmapi,
        timeout: TIMEOUT,
        ..ToolConfig::default()
    });

    store
        .fetch(&RemotePath::new("/Notes/Quarterly"), &workdir)
        .await
        .unwrap();

    let lines = logged_lines(&log);
    assert_eq!(lines[..2], ["get", "/Notes/Quarterly"]);
    let cwd = lines[2].strip_prefix("cwd=").unwrap();
    assert_eq!(
        PathBuf::from(cwd).canonicalize().unwrap(),
        workdir.canonicalize().unwrap()
    );
}
