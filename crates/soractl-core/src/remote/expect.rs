//! Minimal expect-style protocol over a child process.
//!
//! Drives an interactive command (in practice `ssh`/`sshpass`) through a
//! pipe: write a line, then scan merged stdout+stderr for the first line
//! containing one of a set of patterns, with a deadline. There is no pty,
//! so the protocol never waits on shell prompts; callers signal completion
//! with explicit marker lines instead.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, trace};

use crate::error::CoreError;

/// What `expect_any` observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpectEvent {
    /// A line containing one of the patterns arrived.
    Matched { pattern: String, line: String },
    /// The child's output closed (process exited or connection dropped).
    Eof,
    /// The deadline passed with no matching line.
    TimedOut,
}

/// Line-oriented session with a spawned child process.
pub struct LineSession {
    child: Child,
    stdin: ChildStdin,
    lines: Lines<BufReader<ChildStdout>>,
}

impl LineSession {
    /// Spawn `command` under `sh -c` with stderr folded into stdout.
    ///
    /// The child is killed on drop, so an abandoned session cannot leave
    /// an ssh process behind.
    pub fn spawn(command: &str) -> Result<Self, CoreError> {
        // The group makes the redirect apply before the command's own
        // redirections, so stderr lands in the pipe either way.
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(format!("{{ {command}; }} 2>&1"))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child.stdin.take().ok_or_else(|| {
            CoreError::Io(std::io::Error::other("child stdin not captured"))
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            CoreError::Io(std::io::Error::other("child stdout not captured"))
        })?;

        debug!(command, pid = child.id(), "spawned line session");
        Ok(Self {
            child,
            stdin,
            lines: BufReader::new(stdout).lines(),
        })
    }

    /// Write one line to the child's stdin.
    pub async fn send_line(&mut self, line: &str) -> Result<(), CoreError> {
        trace!(line, "send");
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await?;
        Ok(())
    }

    /// Read lines until one contains any of `patterns` (case-insensitive
    /// substring match), output ends, or `timeout` elapses.
    pub async fn expect_any(
        &mut self,
        patterns: &[&str],
        timeout: Duration,
    ) -> Result<ExpectEvent, CoreError> {
        let lowered: Vec<String> = patterns.iter().map(|p| p.to_lowercase()).collect();
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            let next = tokio::time::timeout_at(deadline, self.lines.next_line()).await;
            match next {
                Err(_) => return Ok(ExpectEvent::TimedOut),
                Ok(Err(e)) => return Err(e.into()),
                Ok(Ok(None)) => return Ok(ExpectEvent::Eof),
                Ok(Ok(Some(line))) => {
                    trace!(line, "recv");
                    let haystack = line.to_lowercase();
                    if let Some(idx) = lowered.iter().position(|p| haystack.contains(p)) {
                        return Ok(ExpectEvent::Matched {
                            pattern: patterns[idx].to_owned(),
                            line,
                        });
                    }
                }
            }
        }
    }

    /// Close stdin and wait for the child to exit, with a deadline.
    pub async fn finish(mut self, timeout: Duration) -> Result<(), CoreError> {
        drop(self.stdin);
        match tokio::time::timeout(timeout, self.child.wait()).await {
            Ok(status) => {
                let status = status?;
                debug!(?status, "line session finished");
                Ok(())
            }
            Err(_) => {
                self.child.kill().await?;
                Ok(())
            }
        }
    }
}
