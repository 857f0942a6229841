//! Per-iteration argument rendering.
//!
//! Placeholders are plain substring substitutions:
//! - `{i}` - 1-indexed iteration number
//! - `{ts}` - timestamp in epoch milliseconds
//!
//! Tokens without placeholders pass through unchanged.

/// Iteration-number placeholder.
pub const ITERATION_PLACEHOLDER: &str = "{i}";

/// Timestamp placeholder.
pub const TIMESTAMP_PLACEHOLDER: &str = "{ts}";

/// Render every token of `template` for iteration `iteration` at `timestamp_ms`.
pub fn render_args(template: &[String], iteration: u32, timestamp_ms: i64) -> Vec<String> {
    let iteration = iteration.to_string();
    let timestamp = timestamp_ms.to_string();
    template
        .iter()
        .map(|token| {
            token
                .replace(ITERATION_PLACEHOLDER, &iteration)
                .replace(TIMESTAMP_PLACEHOLDER, &timestamp)
        })
        .collect()
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
