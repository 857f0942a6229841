//! Faultline - soak-test a CLI client against a scripted unreliable API.
//!
//! Runs the client repeatedly, classifies each run from its exit code and
//! output, and prints a timing summary. Exit code 2 means at least one run
//! crashed or timed out.

#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::debug;

use faultline_common::soak::strip_separator;
use faultline_common::{
    CRASH_EXIT_CODE, DEFAULT_JAR, LogConfig, SoakConfig, SoakDriver, SoakError, TargetCommand,
    init_logging, mask_sensitive_command,
};

#[derive(Parser)]
#[command(name = "faultline")]
#[command(author, version, about = "Soak-test a CLI client against an unreliable API")]
#[command(after_help = "Examples:\n  \
    faultline --iterations 20 -- balances\n  \
    faultline --log-dir logs -- add --symbol BTCUSDT --client-id soak-{i}-{ts}\n  \
    faultline --exec ./client --timeout 5 -- list")]
struct Cli {
    /// Client jar, run as `<java> -jar <jar>`
    #[arg(long, env = "FAULTLINE_JAR", default_value = DEFAULT_JAR)]
    jar: String,

    /// Java launcher used with --jar
    #[arg(long, env = "FAULTLINE_JAVA", default_value = "java")]
    java: String,

    /// Run this program directly instead of `java -jar`
    #[arg(long, env = "FAULTLINE_EXEC")]
    exec: Option<String>,

    /// Number of iterations
    #[arg(short = 'n', long, env = "FAULTLINE_ITERATIONS", default_value_t = 50)]
    iterations: u32,

    /// Pause between iterations, in seconds
    #[arg(long, env = "FAULTLINE_SLEEP", default_value = "0.2", value_parser = parse_seconds)]
    sleep: Duration,

    /// Per-iteration timeout, in seconds
    #[arg(long, env = "FAULTLINE_TIMEOUT", default_value = "30.0", value_parser = parse_timeout)]
    timeout: Duration,

    /// Write each iteration's raw output under this directory
    #[arg(long, env = "FAULTLINE_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Echo each iteration's raw output
    #[arg(short, long)]
    verbose: bool,

    /// Client command; `{i}` and `{ts}` are replaced per iteration
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "COMMAND")]
    command: Vec<String>,
}

impl Cli {
    fn target(&self) -> TargetCommand {
        match &self.exec {
            Some(program) => TargetCommand::direct(program),
            None => TargetCommand::java_jar(&self.java, &self.jar),
        }
    }

    fn into_config(self) -> SoakConfig {
        let mut config = SoakConfig::new(self.target(), self.command)
            .with_iterations(self.iterations)
            .with_sleep(self.sleep)
            .with_timeout(self.timeout)
            .with_verbose(self.verbose);
        if let Some(dir) = self.log_dir {
            config = config.with_log_dir(dir);
        }
        config
    }
}

fn parse_seconds(value: &str) -> Result<Duration, String> {
    let secs: f64 = value
        .parse()
        .map_err(|_| format!("'{}' is not a number of seconds", value))?;
    Duration::try_from_secs_f64(secs)
        .map_err(|_| format!("'{}' must be a finite, non-negative number of seconds", value))
}

fn parse_timeout(value: &str) -> Result<Duration, String> {
    let timeout = parse_seconds(value)?;
    if timeout.is_zero() {
        return Err("timeout must be greater than zero".to_string());
    }
    Ok(timeout)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let code = run(cli).await?;
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<i32> {
    let log_config = LogConfig::from_env("warn").with_stderr();
    let _logging_guards = init_logging(&log_config)?;

    if strip_separator(cli.command.clone()).is_empty() {
        eprintln!("ERROR: {}", SoakError::EmptyCommand);
        return Ok(CRASH_EXIT_CODE);
    }

    let config = cli.into_config();
    debug!(
        target_command = %mask_sensitive_command(&config.target.display(&config.command)),
        iterations = config.iterations,
        "soak configuration"
    );

    let driver = SoakDriver::new(config);
    let mut out = std::io::stdout();
    let summary = driver.run(&mut out).await?;
    Ok(summary.exit_code())
}
