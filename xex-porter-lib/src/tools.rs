//! Subprocess invocation for the external tools.

use std::ffi::OsString;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use wait_timeout::ChildExt;

use crate::error::ToolError;

/// Captured result of one tool run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// `None` when the process was ended by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Stdout followed by stderr.
    pub fn combined(&self) -> String {
        let mut out = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&self.stderr);
        }
        out
    }

    /// Turn a non-zero exit into [`ToolError::Failed`].
    pub fn check(self, tool: &Path) -> Result<Self, ToolError> {
        if self.success() {
            Ok(self)
        } else {
            Err(ToolError::Failed {
                tool: tool_name(tool),
                code: self.exit_code,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

/// Runs an external program to completion or until `timeout`.
pub trait ToolRunner {
    fn invoke(
        &self,
        tool: &Path,
        args: &[OsString],
        cwd: Option<&Path>,
        timeout: Duration,
    ) -> Result<ToolOutput, ToolError>;
}

/// [`ToolRunner`] backed by `std::process`.
///
/// Stdout and stderr are drained on helper threads while the caller waits,
/// so a chatty tool cannot fill a pipe and stall. On timeout the child is
/// killed and reaped, and its output is discarded.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemToolRunner;

impl ToolRunner for SystemToolRunner {
    fn invoke(
        &self,
        tool: &Path,
        args: &[OsString],
        cwd: Option<&Path>,
        timeout: Duration,
    ) -> Result<ToolOutput, ToolError> {
        let name = tool_name(tool);
        log::debug!("Executing: {} {:?} (cwd={:?})", tool.display(), args, cwd);

        let mut command = Command::new(tool);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ToolError::Missing { tool: name.clone() }
            } else {
                ToolError::Spawn {
                    tool: name.clone(),
                    source: e,
                }
            }
        })?;

        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let status = match child.wait_timeout(timeout)? {
            Some(status) => status,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                // A grandchild may still hold the pipes open; leave the
                // drain threads detached instead of joining them.
                drop(stdout);
                drop(stderr);
                return Err(ToolError::Timeout {
                    tool: name,
                    seconds: timeout.as_secs(),
                });
            }
        };

        let output = ToolOutput {
            exit_code: status.code(),
            stdout: join(stdout),
            stderr: join(stderr),
        };
        for line in output.stderr.lines() {
            log::debug!("[{}] {}", name, line);
        }
        Ok(output)
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn join(handle: Option<thread::JoinHandle<String>>) -> String {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

/// File name of a tool path, for messages.
pub fn tool_name(tool: &Path) -> String {
    tool.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| tool.display().to_string())
}

#[cfg(test)]
#[path = "tests/tools_tests.rs"]
mod tests;
