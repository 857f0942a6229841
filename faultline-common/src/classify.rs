//! Outcome classification for a single soak iteration.
//!
//! Classification only looks at the exit code, the captured output text and
//! whether the run timed out. It never touches a process, so every rule is
//! testable from literal inputs.

use memchr::memmem;
use serde::{Deserialize, Serialize};

/// Phrase the client prints when it retries a transient failure.
pub const RETRIABLE_MARKER: &str = "Retriable error";

/// Phrase the client prints when it hits a rate limit.
pub const RATE_LIMIT_MARKER: &str = "Rate limit exceeded";

/// Human-readable per-iteration status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DisplayStatus {
    /// Exited zero with no rate-limit marker.
    Ok,
    /// Exited non-zero with no rate-limit marker.
    Fail,
    /// Output carried the rate-limit marker, whatever the exit code.
    RateLimit,
    /// Killed after exceeding the per-iteration timeout.
    Timeout,
}

impl DisplayStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Fail => "FAIL",
            Self::RateLimit => "RATE_LIMIT",
            Self::Timeout => "TIMEOUT",
        }
    }
}

impl std::fmt::Display for DisplayStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured outcome of one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub status: DisplayStatus,
    /// Output contained [`RETRIABLE_MARKER`].
    pub retriable: bool,
    /// Output contained [`RATE_LIMIT_MARKER`].
    pub rate_limited: bool,
    /// Counts toward the crash tally (timeout or non-zero exit).
    pub crashed: bool,
}

impl Outcome {
    /// Only a clean `OK` counts as a success.
    pub fn is_success(&self) -> bool {
        self.status == DisplayStatus::Ok
    }
}

/// Classify a finished or timed-out invocation.
///
/// Precedence: timeout, then rate limit, then exit code. The crash flag is
/// decided by timeout and exit code alone.
pub fn classify(exit_code: i32, output: &str, timed_out: bool) -> Outcome {
    let retriable = contains(output, RETRIABLE_MARKER);
    let rate_limited = contains(output, RATE_LIMIT_MARKER);

    let status = if timed_out {
        DisplayStatus::Timeout
    } else if rate_limited {
        DisplayStatus::RateLimit
    } else if exit_code == 0 {
        DisplayStatus::Ok
    } else {
        DisplayStatus::Fail
    };

    Outcome {
        status,
        retriable,
        rate_limited,
        crashed: timed_out || exit_code != 0,
    }
}

fn contains(haystack: &str, needle: &str) -> bool {
    memmem::find(haystack.as_bytes(), needle.as_bytes()).is_some()
}
