// ABOUTME: Streams a child process's stdio to caller-supplied sinks until it exits.
// ABOUTME: On cancellation the child is interrupted so it can clean up, then killed if it lingers.

use super::error::RunError;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;

/// How long an interrupted child gets to release remote resources.
pub const CANCEL_GRACE: Duration = Duration::from_secs(5);

/// Spawn `command`, feed it `preamble` followed by `input`, and pump its output.
///
/// Stdin is closed once the input is exhausted (immediately after the
/// preamble when `input` is `None`). Output is flushed to the sinks as it
/// arrives. Returns the child's exit code.
///
/// When `cancel` fires the child receives SIGINT and up to [`CANCEL_GRACE`]
/// to exit on its own before it is killed.
pub async fn run_streaming(
    mut command: Command,
    preamble: Vec<u8>,
    input: Option<&mut (dyn AsyncRead + Send + Unpin)>,
    stdout: &mut (dyn AsyncWrite + Send + Unpin),
    stderr: &mut (dyn AsyncWrite + Send + Unpin),
    cancel: &CancellationToken,
) -> Result<i32, RunError> {
    command
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command.spawn().map_err(RunError::Spawn)?;

    let (Some(mut child_in), Some(mut child_out), Some(mut child_err)) =
        (child.stdin.take(), child.stdout.take(), child.stderr.take())
    else {
        return Err(RunError::Spawn(std::io::Error::other(
            "child stdio was not captured",
        )));
    };

    let feed = async move {
        child_in.write_all(&preamble).await?;
        if let Some(input) = input {
            tokio::io::copy(input, &mut child_in).await?;
        }
        child_in.shutdown().await
    };
    let feed = async move {
        match feed.await {
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
            other => other,
        }
    };

    let pump_out = async {
        tokio::io::copy(&mut child_out, stdout).await?;
        stdout.flush().await
    };
    let pump_err = async {
        tokio::io::copy(&mut child_err, stderr).await?;
        stderr.flush().await
    };

    // Output ends when the child closes its pipes; a local input that never
    // reaches EOF must not hold the run open after that.
    let streamed = async {
        let pumps = async { tokio::try_join!(pump_out, pump_err) };
        tokio::pin!(feed, pumps);
        let mut feeding = true;
        loop {
            tokio::select! {
                fed = &mut feed, if feeding => {
                    fed?;
                    feeding = false;
                }
                pumped = &mut pumps => {
                    pumped?;
                    return Ok::<(), std::io::Error>(());
                }
            }
        }
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            stop(&mut child, CANCEL_GRACE).await;
            return Err(RunError::Cancelled);
        }
        streamed = streamed => streamed.map_err(RunError::Stream)?,
    }

    let status = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            stop(&mut child, CANCEL_GRACE).await;
            return Err(RunError::Cancelled);
        }
        status = child.wait() => status.map_err(RunError::Stream)?,
    };

    tracing::debug!(?status, "child exited");
    status.code().ok_or(RunError::Terminated)
}

/// Interrupt the child, wait up to `grace` for it to exit, then kill it.
async fn stop(child: &mut Child, grace: Duration) {
    if interrupt(child) {
        match tokio::time::timeout(grace, child.wait()).await {
            Ok(status) => {
                tracing::debug!(?status, "child exited after interrupt");
                return;
            }
            Err(_) => tracing::warn!(?grace, "child ignored interrupt, killing it"),
        }
    }
    if let Err(e) = child.kill().await {
        tracing::debug!(error = %e, "failed to kill child");
    }
}

/// Send SIGINT. Returns whether the signal was delivered.
#[cfg(unix)]
fn interrupt(child: &Child) -> bool {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let Some(pid) = child.id().and_then(|id| i32::try_from(id).ok()) else {
        return false;
    };
    match kill(Pid::from_raw(pid), Signal::SIGINT) {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(pid, error = %e, "failed to interrupt child");
            false
        }
    }
}

#[cfg(not(unix))]
fn interrupt(_child: &Child) -> bool {
    false
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Duration;

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    #[tokio::test]
    async fn forwards_preamble_and_input_and_reports_exit_code() {
        let mut input: &[u8] = b"world\n";
        let mut out = Vec::new();
        let mut err = Vec::new();

        let code = run_streaming(
            sh("cat; exit 3"),
            b"hello ".to_vec(),
            Some(&mut input),
            &mut out,
            &mut err,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(code, 3);
        assert_eq!(out, b"hello world\n");
        assert!(err.is_empty());
    }

    #[tokio::test]
    async fn without_input_stdin_is_closed_after_preamble() {
        let mut out = Vec::new();
        let mut err = Vec::new();

        let code = run_streaming(
            sh("wc -c"),
            Vec::new(),
            None,
            &mut out,
            &mut err,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(code, 0);
        assert_eq!(String::from_utf8(out).unwrap().trim(), "0");
    }

    #[tokio::test]
    async fn stderr_is_kept_separate() {
        let mut out = Vec::new();
        let mut err = Vec::new();

        let code = run_streaming(
            sh("echo out; echo err >&2"),
            Vec::new(),
            None,
            &mut out,
            &mut err,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(code, 0);
        assert_eq!(out, b"out\n");
        assert_eq!(err, b"err\n");
    }

    #[tokio::test]
    async fn cancellation_kills_the_child() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let mut out = Vec::new();
        let mut err = Vec::new();
        let result = tokio::time::timeout(
            Duration::from_secs(5),
            run_streaming(sh("sleep 30"), Vec::new(), None, &mut out, &mut err, &cancel),
        )
        .await
        .expect("cancellation should return promptly");

        assert!(matches!(result, Err(RunError::Cancelled)));
    }

    #[tokio::test]
    async fn cancellation_lets_the_child_clean_up() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("cleaned");
        let script = format!(
            "trap 'echo cleaned > {}; exit 130' INT TERM; sleep 30 & wait",
            marker.display()
        );

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            trigger.cancel();
        });

        let mut out = Vec::new();
        let mut err = Vec::new();
        let result = tokio::time::timeout(
            Duration::from_secs(5),
            run_streaming(sh(&script), Vec::new(), None, &mut out, &mut err, &cancel),
        )
        .await
        .expect("interrupted child should exit within the grace period");

        assert!(matches!(result, Err(RunError::Cancelled)));
        assert_eq!(std::fs::read_to_string(&marker).unwrap(), "cleaned\n");
    }

    #[tokio::test]
    async fn child_ignoring_interrupt_is_killed_after_grace() {
        let mut child = sh("trap '' INT; sleep 30 & wait")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        tokio::time::timeout(
            Duration::from_secs(5),
            stop(&mut child, Duration::from_millis(200)),
        )
        .await
        .expect("kill fallback should finish promptly");

        let status = child.try_wait().unwrap().expect("child was reaped");
        assert_eq!(status.code(), None, "terminated by a signal");
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let result = run_streaming(
            Command::new("/nonexistent/rwinrm-test-binary"),
            Vec::new(),
            None,
            &mut out,
            &mut err,
            &CancellationToken::new(),
        )
        .await;

        assert!(matches!(result, Err(RunError::Spawn(_))));
    }
}
