//! # Utility Functions Module
//!
//! Small helpers for building external command lines.

/// Builds a `Vec<String>` of command arguments from mixed literals and values.
///
/// ```rust
/// use shrink_movies::args;
///
/// let preset = "slow";
/// let args = args!["-preset", preset, "-crf", 28];
/// assert_eq!(args, vec!["-preset", "slow", "-crf", "28"]);
/// ```
#[macro_export]
macro_rules! args {
    [$($item:expr),* $(,)?] => {
        vec![$($item.to_string()),*]
    };
}

/// Last `max_lines` non-empty lines of a tool's stderr, for error messages.
pub fn stderr_tail(stderr: &[u8], max_lines: usize) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .collect();
    let start = lines.len().saturating_sub(max_lines);
    lines[start..].join("\n")
}
