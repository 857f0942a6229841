//! Target process invocation with a bounded timeout.
//!
//! The target is an opaque executable: a program, a fixed prefix of tokens,
//! then the rendered per-iteration tokens. Stdout and stderr share one pipe so
//! the captured text keeps the interleaving the process produced.

use std::future::Future;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::errors::{SoakError, SoakResult};
use crate::util::mask_sensitive_command;

/// Default jar for the order-manager client.
pub const DEFAULT_JAR: &str = "target/order-manager-1.0.0.jar";

/// Executable plus the fixed tokens that precede every rendered command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetCommand {
    pub program: String,
    #[serde(default)]
    pub prefix: Vec<String>,
}

impl TargetCommand {
    /// `java -jar <jar>`.
    pub fn java_jar(java: impl Into<String>, jar: impl Into<String>) -> Self {
        Self {
            program: java.into(),
            prefix: vec!["-jar".to_string(), jar.into()],
        }
    }

    /// Run `program` directly with no prefix.
    pub fn direct(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            prefix: Vec::new(),
        }
    }

    /// Full argument vector (excluding the program) for `args`.
    pub fn argv(&self, args: &[String]) -> Vec<String> {
        self.prefix.iter().chain(args).cloned().collect()
    }

    /// Shell-like rendering for logs.
    pub fn display(&self, args: &[String]) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.prefix.iter().map(String::as_str))
            .chain(args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for TargetCommand {
    fn default() -> Self {
        Self::java_jar("java", DEFAULT_JAR)
    }
}

/// A run that finished on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct Completed {
    pub exit_code: i32,
    /// Merged stdout and stderr.
    pub output: String,
    pub duration: Duration,
}

/// Result of one invocation attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Invocation {
    Completed(Completed),
    /// Killed after exceeding the timeout; nothing was captured.
    TimedOut,
}

/// Something that can run the target once.
pub trait TargetRunner {
    /// Run the target with `args`, killing it once `timeout` elapses.
    fn run(
        &self,
        args: &[String],
        timeout: Duration,
    ) -> impl Future<Output = SoakResult<Invocation>>;

    /// Label of the program for log lines.
    fn program(&self) -> &str;
}

/// Runs the target as a real child process.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    command: TargetCommand,
}

impl ProcessRunner {
    pub fn new(command: TargetCommand) -> Self {
        Self { command }
    }

    pub fn command(&self) -> &TargetCommand {
        &self.command
    }
}

impl TargetRunner for ProcessRunner {
    async fn run(&self, args: &[String], timeout: Duration) -> SoakResult<Invocation> {
        debug!(
            command = %mask_sensitive_command(&self.command.display(args)),
            timeout_secs = timeout.as_secs_f64(),
            "spawning target"
        );

        let (reader, writer) = std::io::pipe()?;
        let mut cmd = Command::new(&self.command.program);
        cmd.args(self.command.argv(args))
            .stdin(Stdio::null())
            .stdout(writer.try_clone()?)
            .stderr(writer)
            .kill_on_drop(true);
        // Own process group, so a timeout can take down anything the target spawned.
        #[cfg(unix)]
        cmd.process_group(0);

        let start = Instant::now();
        let mut child = cmd.spawn().map_err(|source| SoakError::Spawn {
            program: self.command.program.clone(),
            source,
        })?;
        // The command still owns the parent's write ends; drop them so the
        // reader sees EOF once the child exits.
        drop(cmd);

        let pid = child.id();
        // The read end lives inside this future: a timeout drops it, so no
        // reader outlives the invocation.
        let finished = tokio::time::timeout(timeout, async {
            let (status, output) = tokio::join!(child.wait(), read_merged(reader));
            Ok::<_, std::io::Error>((status?, output?))
        })
        .await;

        match finished {
            Ok(result) => {
                let (status, output) = result?;
                let duration = start.elapsed();
                let exit_code = exit_code(status);
                debug!(exit_code, duration_ms = duration.as_millis() as u64, "target exited");
                Ok(Invocation::Completed(Completed {
                    exit_code,
                    output,
                    duration,
                }))
            }
            Err(_) => {
                warn!(
                    program = %self.command.program,
                    timeout_secs = timeout.as_secs_f64(),
                    "target timed out, killing"
                );
                if let Some(pid) = pid {
                    kill_process_group(pid).await;
                }
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill timed-out target: {}", e);
                }
                Ok(Invocation::TimedOut)
            }
        }
    }

    fn program(&self) -> &str {
        &self.command.program
    }
}

/// Read the merged output pipe to EOF.
#[cfg(unix)]
async fn read_merged(reader: std::io::PipeReader) -> std::io::Result<String> {
    use tokio::io::AsyncReadExt;

    let mut receiver =
        tokio::net::unix::pipe::Receiver::from_owned_fd(std::os::fd::OwnedFd::from(reader))?;
    let mut buf = Vec::new();
    receiver.read_to_end(&mut buf).await?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(not(unix))]
async fn read_merged(mut reader: std::io::PipeReader) -> std::io::Result<String> {
    use std::io::Read;

    tokio::task::spawn_blocking(move || {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    })
    .await
    .map_err(std::io::Error::other)?
}

/// SIGKILL every process in the group led by `pid`.
#[cfg(unix)]
async fn kill_process_group(pid: u32) {
    match Command::new("kill")
        .arg("-KILL")
        .arg("--")
        .arg(format!("-{}", pid))
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
    {
        Ok(status) if !status.success() => {
            debug!(pid, "process group already gone");
        }
        Ok(_) => {}
        Err(e) => warn!(pid, "Failed to signal process group: {}", e),
    }
}

#[cfg(not(unix))]
async fn kill_process_group(_pid: u32) {}

/// Exit code of a finished process; signal deaths map to `-signal` on unix.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }
    -1
}
