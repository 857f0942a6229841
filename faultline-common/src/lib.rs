//! Faultline shared library.
//!
//! Scripted fault-injection policies for the mock exchange server, and the
//! soak-test driver that hammers a client binary against it.

pub mod classify;
pub mod config;
pub mod errors;
pub mod injector;
pub mod logging;
pub mod policy;
pub mod runner;
pub mod soak;
pub mod stats;
pub mod template;
pub mod testing;
pub mod util;

pub use classify::{DisplayStatus, Outcome, RATE_LIMIT_MARKER, RETRIABLE_MARKER, classify};
pub use config::{ConfigSource, EnvError, EnvParser, Sourced};
pub use errors::{SoakError, SoakResult};
pub use injector::{AttemptCounters, FaultInjector, Served};
pub use logging::{LogConfig, LogFormat, LoggingGuards, init_logging};
pub use policy::{Endpoint, PolicyResponse, RequestContext, evaluate};
pub use runner::{Completed, DEFAULT_JAR, Invocation, ProcessRunner, TargetCommand, TargetRunner};
pub use soak::{CRASH_EXIT_CODE, IterationResult, RunSummary, SoakConfig, SoakDriver};
pub use stats::{TimingStats, percentile};
pub use template::render_args;
pub use util::mask_sensitive_command;

#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    testing::init_global_test_logging();
}
