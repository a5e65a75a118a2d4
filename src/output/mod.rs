//! Terminal rendering for command results
//!
//! JSON output goes straight to stdout from `main`. This module covers the
//! `--output pretty` mode.

use crate::commands::CommandResult;
use owo_colors::OwoColorize;
use serde_json::Value;

/// Print a result for humans
pub fn print_result(command: &str, result: &CommandResult) {
    println!("{}", render_result(command, result));
}

/// Render a result as styled lines: a status line, the message, then each field
pub fn render_result(command: &str, result: &CommandResult) -> String {
    let mut lines = Vec::new();

    // Pastel lavender: RGB(181, 174, 254)
    lines.push(format!("{}", command.truecolor(181, 174, 254).bold()));
    lines.push(format!("{}", "─".repeat(50).truecolor(160, 160, 160)));

    if result.is_success() {
        let state = if result.changed { "changed" } else { "ok" };
        // Pastel mint green: RGB(152, 225, 152)
        lines.push(format!(
            "{} {}",
            "✓".truecolor(152, 225, 152).bold(),
            state.bright_white()
        ));
    } else {
        lines.push(format!(
            "{} {}",
            "✗".truecolor(255, 160, 160).bold(),
            format!("failed (rc={})", result.rc).bright_white()
        ));
    }

    if let Some(msg) = &result.msg {
        lines.push(key_value("msg", msg));
    }

    for (key, value) in &result.fields {
        lines.push(key_value(key, &display_value(value)));
    }

    if let Some(trace) = &result.stack_trace {
        // Brighter grey: RGB(160, 160, 160)
        lines.push(format!("{}", trace.truecolor(160, 160, 160)));
    }

    lines.join("\n")
}

fn key_value(key: &str, value: &str) -> String {
    format!(
        "  {} {}",
        format!("{}:", key).truecolor(160, 160, 160),
        value.bright_white()
    )
}

/// Bare strings, comma-joined string lists, and pretty JSON for anything else
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) if items.iter().all(Value::is_string) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(", "),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}
