//! Output formatting for CLI

use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde_json::{json, Value};

use cloudscale_common::Outcome;

/// Output format
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    /// Machine-readable JSON
    #[default]
    Json,
    /// YAML
    Yaml,
    /// Human-readable field table
    Table,
}

/// Print the result of a run
pub fn print_outcome(outcome: &Outcome, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(outcome).unwrap_or_default());
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yaml::to_string(outcome).unwrap_or_default());
        }
        OutputFormat::Table => {
            let status = if outcome.changed {
                "changed".yellow()
            } else {
                "ok".green()
            };
            println!("{}", status);

            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec!["Field", "Value"]);
            for (key, value) in &outcome.resource {
                table.add_row(vec![key.clone(), render(value)]);
            }
            println!("{table}");

            if outcome.changed {
                let mut diff = Table::new();
                diff.load_preset(UTF8_FULL)
                    .set_content_arrangement(ContentArrangement::Dynamic);
                diff.set_header(vec!["Field", "Before", "After"]);
                for (key, after) in &outcome.diff.after {
                    let before = outcome.diff.before.get(key).unwrap_or(&Value::Null);
                    diff.add_row(vec![key.clone(), render(before), render(after)]);
                }
                println!("{diff}");
            }
        }
    }
}

/// Print a failure the way results are printed, so callers can parse it
pub fn print_failure(error: &anyhow::Error, format: OutputFormat) {
    let msg = format!("{:#}", error);
    match format {
        OutputFormat::Json => {
            let body = json!({"failed": true, "msg": msg});
            println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
        }
        OutputFormat::Yaml => {
            let body = json!({"failed": true, "msg": msg});
            print!("{}", serde_yaml::to_string(&body).unwrap_or_default());
        }
        OutputFormat::Table => {
            eprintln!("{}", failure_line(&msg));
        }
    }
}

fn failure_line(msg: &str) -> String {
    format!("{} {}", "error:".red(), msg)
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_plain_strings_and_json() {
        assert_eq!(render(&json!("lpg1")), "lpg1");
        assert_eq!(render(&Value::Null), "");
        assert_eq!(render(&json!({"a": "b"})), "{\"a\":\"b\"}");
        assert_eq!(render(&json!(true)), "true");
    }

    #[test]
    fn test_failure_line_is_plain_prefix() {
        colored::control::set_override(false);
        assert_eq!(failure_line("missing url"), "error: missing url");
    }
}
