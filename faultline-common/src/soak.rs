//! Soak-test driver.
//!
//! Runs the target N times in sequence, classifies every iteration, and
//! aggregates a [`RunSummary`]. A single failed iteration never aborts the
//! run: timeouts, crashes and spawn failures are all tallied and the loop
//! moves on. The summary's exit code is the pass/fail gate for automation.
//!
//! Per-iteration lifecycle:
//!
//! ```text
//! PENDING -> RUNNING -> COMPLETED  (duration recorded, output classified)
//!                    \-> TIMED_OUT (killed, no duration, counted as crash)
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::classify::{DisplayStatus, Outcome, classify};
use crate::errors::{SoakError, SoakResult};
use crate::runner::{Completed, Invocation, ProcessRunner, TargetCommand, TargetRunner};
use crate::stats::TimingStats;
use crate::template::{now_millis, render_args};
use crate::util::log_label;

/// Exit code reported when any iteration crashed, or nothing could be run.
pub const CRASH_EXIT_CODE: i32 = 2;

/// Soak run configuration.
#[derive(Debug, Clone)]
pub struct SoakConfig {
    /// Executable and fixed prefix.
    pub target: TargetCommand,
    /// Command template tokens; may contain `{i}` and `{ts}`.
    pub command: Vec<String>,
    pub iterations: u32,
    /// Fixed pause between iterations.
    pub sleep: Duration,
    /// Per-iteration bound; the process is killed once it elapses.
    pub timeout: Duration,
    /// Directory for raw per-iteration output, if any.
    pub log_dir: Option<PathBuf>,
    /// Echo raw output after each iteration.
    pub verbose: bool,
}

impl SoakConfig {
    pub fn new(target: TargetCommand, command: Vec<String>) -> Self {
        Self {
            target,
            command: strip_separator(command),
            iterations: 50,
            sleep: Duration::from_millis(200),
            timeout: Duration::from_secs(30),
            log_dir: None,
            verbose: false,
        }
    }

    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_sleep(mut self, sleep: Duration) -> Self {
        self.sleep = sleep;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Path of the raw-output log for iteration `index`.
    pub fn log_path(&self, index: u32) -> Option<PathBuf> {
        self.log_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}-{:04}.log", log_label(&self.command), index)))
    }
}

/// Drop a leading `--` separator left over from argument parsing.
pub fn strip_separator(mut command: Vec<String>) -> Vec<String> {
    if command.first().is_some_and(|t| t == "--") {
        command.remove(0);
    }
    command
}

/// One finished iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationResult {
    /// 1-indexed iteration number.
    pub index: u32,
    /// `None` when the process timed out.
    pub exit_code: Option<i32>,
    /// Wall-clock seconds; `None` when no sample was recorded.
    pub duration_secs: Option<f64>,
    pub outcome: Outcome,
}

impl IterationResult {
    fn completed(index: u32, done: &Completed) -> Self {
        Self {
            index,
            exit_code: Some(done.exit_code),
            duration_secs: Some(done.duration.as_secs_f64()),
            outcome: classify(done.exit_code, &done.output, false),
        }
    }

    fn timed_out(index: u32) -> Self {
        Self {
            index,
            exit_code: None,
            duration_secs: None,
            outcome: classify(-1, "", true),
        }
    }

    fn not_started(index: u32) -> Self {
        Self {
            index,
            exit_code: Some(-1),
            duration_secs: None,
            outcome: classify(-1, "", false),
        }
    }
}

/// Aggregate over a whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Command template as given, joined by spaces.
    pub command: String,
    pub iterations: u32,
    pub successes: u32,
    pub rate_limits: u32,
    pub retriable_seen: u32,
    /// Non-zero exits plus timeouts.
    pub crashes: u32,
    /// Number of duration samples behind `timing`.
    pub samples: usize,
    pub timing: TimingStats,
}

impl RunSummary {
    /// 2 if anything crashed, else 0.
    pub fn exit_code(&self) -> i32 {
        if self.crashes > 0 { CRASH_EXIT_CODE } else { 0 }
    }

    /// Human-readable report.
    pub fn render(&self) -> String {
        let t = &self.timing;
        format!(
            "\nSummary:\n  \
             command: {}\n  \
             iterations: {}\n  \
             successes: {}\n  \
             rate_limits: {}\n  \
             retriable_seen: {}\n  \
             crashes (non-zero or timeout): {}\n  \
             timing (seconds):\n    \
             avg: {:.2}\n    \
             p50: {:.2}\n    \
             p95: {:.2}\n    \
             min: {:.2}\n    \
             max: {:.2}\n",
            self.command,
            self.iterations,
            self.successes,
            self.rate_limits,
            self.retriable_seen,
            self.crashes,
            t.avg,
            t.p50,
            t.p95,
            t.min,
            t.max,
        )
    }
}

#[derive(Debug, Default)]
struct Tally {
    successes: u32,
    rate_limits: u32,
    retriable_seen: u32,
    crashes: u32,
    durations: Vec<f64>,
}

impl Tally {
    fn record(&mut self, result: &IterationResult) {
        let outcome = &result.outcome;
        if let Some(secs) = result.duration_secs {
            self.durations.push(secs);
        }
        if outcome.crashed {
            self.crashes += 1;
        }
        if outcome.retriable {
            self.retriable_seen += 1;
        }
        if outcome.status == DisplayStatus::RateLimit {
            self.rate_limits += 1;
        }
        if outcome.is_success() {
            self.successes += 1;
        }
    }

    fn finish(self, config: &SoakConfig) -> RunSummary {
        RunSummary {
            command: config.command.join(" "),
            iterations: config.iterations,
            successes: self.successes,
            rate_limits: self.rate_limits,
            retriable_seen: self.retriable_seen,
            crashes: self.crashes,
            samples: self.durations.len(),
            timing: TimingStats::from_samples(&self.durations),
        }
    }
}

/// Drives a soak run against a [`TargetRunner`].
pub struct SoakDriver<R = ProcessRunner> {
    config: SoakConfig,
    runner: R,
}

impl SoakDriver<ProcessRunner> {
    /// Driver that spawns `config.target` as a real process.
    pub fn new(config: SoakConfig) -> Self {
        let runner = ProcessRunner::new(config.target.clone());
        Self { config, runner }
    }
}

impl<R: TargetRunner> SoakDriver<R> {
    pub fn with_runner(config: SoakConfig, runner: R) -> Self {
        Self { config, runner }
    }

    pub fn config(&self) -> &SoakConfig {
        &self.config
    }

    /// Run every iteration, writing progress lines and the final report to `out`.
    ///
    /// Only an empty command, an unusable log directory, or a failing `out`
    /// writer end the run early.
    pub async fn run<W: Write>(&self, out: &mut W) -> SoakResult<RunSummary> {
        if self.config.command.is_empty() {
            return Err(SoakError::EmptyCommand);
        }
        if let Some(dir) = &self.config.log_dir {
            tokio::fs::create_dir_all(dir).await?;
        }

        info!(
            program = self.runner.program(),
            iterations = self.config.iterations,
            timeout_secs = self.config.timeout.as_secs_f64(),
            "starting soak run"
        );

        let mut tally = Tally::default();
        for index in 1..=self.config.iterations {
            let (result, pace) = self.run_iteration(index, out).await?;
            tally.record(&result);

            if pace && index < self.config.iterations && !self.config.sleep.is_zero() {
                tokio::time::sleep(self.config.sleep).await;
            }
        }

        let summary = tally.finish(&self.config);
        out.write_all(summary.render().as_bytes())?;
        out.flush()?;

        info!(
            crashes = summary.crashes,
            successes = summary.successes,
            exit_code = summary.exit_code(),
            "soak run finished"
        );
        Ok(summary)
    }

    /// Run one iteration. The flag says whether to pace before the next one;
    /// a timeout already consumed its bound, so it continues immediately.
    async fn run_iteration<W: Write>(
        &self,
        index: u32,
        out: &mut W,
    ) -> SoakResult<(IterationResult, bool)> {
        let args = render_args(&self.config.command, index, now_millis());
        debug!(iteration = index, ?args, "iteration pending");

        let done = match self.runner.run(&args, self.config.timeout).await {
            Ok(Invocation::Completed(done)) => done,
            Ok(Invocation::TimedOut) => {
                writeln!(
                    out,
                    "[{:03}] TIMEOUT after {:.1}s",
                    index,
                    self.config.timeout.as_secs_f64()
                )?;
                return Ok((IterationResult::timed_out(index), false));
            }
            Err(e) => {
                warn!(iteration = index, "Iteration could not run: {}", e);
                writeln!(out, "[{:03}] FAIL exit=-1 error={}", index, e)?;
                return Ok((IterationResult::not_started(index), true));
            }
        };

        if let Some(path) = self.config.log_path(index)
            && let Err(e) = write_log(&path, &done.output).await
        {
            warn!("{}", e);
        }

        if self.config.verbose {
            writeln!(out, "{}", done.output)?;
        }

        let result = IterationResult::completed(index, &done);
        writeln!(
            out,
            "[{:03}] {} exit={} elapsed={:.2}s retriable={}",
            index,
            result.outcome.status,
            done.exit_code,
            done.duration.as_secs_f64(),
            if result.outcome.retriable { "Y" } else { "N" },
        )?;
        Ok((result, true))
    }
}

async fn write_log(path: &Path, output: &str) -> SoakResult<()> {
    tokio::fs::write(path, output)
        .await
        .map_err(|source| SoakError::LogWrite {
            path: path.to_path_buf(),
            source,
        })
}
