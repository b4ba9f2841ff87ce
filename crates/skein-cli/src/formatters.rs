//! Output formatters for CLI commands.
//!
//! Provides consistent formatting across all CLI commands for JSON, text,
//! and pretty output modes.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use skein_core::cli::OutputFormat;

/// Format data according to the specified output format.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
///
/// # Examples
///
/// ```
/// use skein_cli::formatters::format_output;
/// use skein_core::cli::OutputFormat;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Report {
///     name: String,
/// }
///
/// let report = Report { name: "exec".to_string() };
/// let output = format_output(&report, OutputFormat::Json)?;
/// assert!(output.contains("\"name\""));
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn format_output<T: Serialize>(data: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => json::format(data),
        OutputFormat::Text => text::format(data),
        OutputFormat::Pretty => pretty::format(data),
    }
}

/// JSON output formatting.
pub mod json {
    use super::{Result, Serialize};

    /// Format data as pretty-printed JSON.
    pub fn format<T: Serialize>(data: &T) -> Result<String> {
        Ok(serde_json::to_string_pretty(data)?)
    }

    /// Format data as compact JSON (no formatting).
    pub fn format_compact<T: Serialize>(data: &T) -> Result<String> {
        Ok(serde_json::to_string(data)?)
    }
}

/// Plain text output formatting.
pub mod text {
    use super::{json, Result, Serialize};

    /// Format data as a single line suitable for piping to other commands.
    pub fn format<T: Serialize>(data: &T) -> Result<String> {
        json::format_compact(data)
    }
}

/// Pretty (human-readable) output formatting.
pub mod pretty {
    use super::{Colorize, Result, Serialize};

    /// Format data as colorized, human-readable output.
    pub fn format<T: Serialize>(data: &T) -> Result<String> {
        let value = serde_json::to_value(data)?;
        Ok(format_value(&value, 0))
    }

    /// Recursively format a JSON value with colors and indentation.
    fn format_value(value: &serde_json::Value, indent: usize) -> String {
        use serde_json::Value;

        let pad = "  ".repeat(indent);
        match value {
            Value::Null => "null".dimmed().to_string(),
            Value::Bool(b) => b.to_string().yellow().to_string(),
            Value::Number(n) => n.to_string().cyan().to_string(),
            Value::String(s) => s.green().to_string(),
            Value::Array(items) => {
                if items.is_empty() {
                    return "[]".to_string();
                }
                let mut out = String::new();
                for item in items {
                    out.push('\n');
                    out.push_str(&pad);
                    out.push_str("- ");
                    out.push_str(format_value(item, indent + 1).trim_start());
                }
                out
            }
            Value::Object(map) => {
                let mut out = String::new();
                for (i, (key, item)) in map.iter().enumerate() {
                    if i > 0 || indent > 0 {
                        out.push('\n');
                    }
                    out.push_str(&pad);
                    out.push_str(&key.bold().to_string());
                    out.push_str(": ");
                    out.push_str(&format_value(item, indent + 1));
                }
                out
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Sample {
        name: String,
        count: usize,
        optional: Option<String>,
    }

    fn sample() -> Sample {
        Sample {
            name: "@yarnpkg/plugin-exec".to_string(),
            count: 2,
            optional: None,
        }
    }

    #[test]
    fn test_json_format() {
        let output = format_output(&sample(), OutputFormat::Json).unwrap();
        assert!(output.contains("\"name\""));
        assert!(output.contains("@yarnpkg/plugin-exec"));
    }

    #[test]
    fn test_text_format_is_single_line() {
        let output = format_output(&sample(), OutputFormat::Text).unwrap();
        assert_eq!(output.lines().count(), 1);
    }

    #[test]
    fn test_pretty_format_contains_fields() {
        colored::control::set_override(false);
        let output = format_output(&sample(), OutputFormat::Pretty).unwrap();
        assert!(output.contains("name"));
        assert!(output.contains("@yarnpkg/plugin-exec"));
        colored::control::unset_override();
    }
}
