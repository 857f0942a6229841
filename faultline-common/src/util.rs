//! Shared utilities for Faultline.

fn find_value_end(s: &str) -> usize {
    let mut end = 0;
    let mut in_quote = None;
    let mut escaped = false;

    for c in s.chars() {
        let char_len = c.len_utf8();

        if escaped {
            escaped = false;
            end += char_len;
            continue;
        }

        if c == '\\' {
            escaped = true;
            end += char_len;
            continue;
        }

        if let Some(q) = in_quote {
            if c == q {
                in_quote = None;
            }
            end += char_len;
            continue;
        }

        if c == '"' || c == '\'' {
            in_quote = Some(c);
            end += char_len;
            continue;
        }

        if c.is_whitespace() {
            break;
        }

        end += char_len;
    }
    end
}

/// Mask credentials in a command line before it is logged.
///
/// Target clients are usually configured with exchange API keys, either as
/// environment assignments or as flags; the value part is replaced with `***`
/// while the key or flag is kept.
pub fn mask_sensitive_command(cmd: &str) -> String {
    let patterns = [
        ("BINANCE_API_KEY=", "BINANCE_API_KEY=***"),
        ("BINANCE_API_SECRET=", "BINANCE_API_SECRET=***"),
        ("API_KEY=", "API_KEY=***"),
        ("API_SECRET=", "API_SECRET=***"),
        ("SECRET=", "SECRET=***"),
        ("PASSWORD=", "PASSWORD=***"),
        ("TOKEN=", "TOKEN=***"),
        ("--api-key ", "--api-key ***"),
        ("--api-key=", "--api-key=***"),
        ("--api-secret ", "--api-secret ***"),
        ("--api-secret=", "--api-secret=***"),
        ("--secret ", "--secret ***"),
        ("--secret=", "--secret=***"),
        ("--token ", "--token ***"),
        ("--token=", "--token=***"),
        ("--password ", "--password ***"),
        ("--password=", "--password=***"),
    ];

    let mut result = cmd.to_string();
    for (pattern, replacement) in patterns {
        // Track search position; the replacement contains the pattern.
        let mut search_start = 0;
        while search_start < result.len() {
            let Some(start) = result[search_start..].find(pattern) else {
                break;
            };
            let abs_start = search_start + start;
            let value_start = abs_start + pattern.len();

            let rest = &result[value_start..];
            let value_end = value_start + find_value_end(rest);

            let prefix = &result[..abs_start];
            let suffix = &result[value_end..];
            result = format!("{}{}{}", prefix, replacement, suffix);

            search_start = abs_start + replacement.len();
        }
    }

    result
}

/// File-name-safe label derived from the first command token.
///
/// Keeps `[A-Za-z0-9_-]`; falls back to `run` when nothing survives.
pub fn log_label(command: &[String]) -> String {
    let label: String = command
        .first()
        .map(|token| {
            token
                .chars()
                .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
                .collect()
        })
        .unwrap_or_default();

    if label.is_empty() {
        "run".to_string()
    } else {
        label
    }
}
