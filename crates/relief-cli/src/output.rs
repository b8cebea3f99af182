//! Output formatting utilities for the CLI.

use std::io::Write;

use colored::Colorize;
use serde::Serialize;

use crate::OutputFormat;

/// Print a serializable summary; text mode prints nothing here.
pub fn print<T: Serialize>(value: &T, format: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }

    match format {
        OutputFormat::Text => {
            // Text output is handled by the caller
        }
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string_pretty(value) {
                println!("{}", json);
            }
        }
    }
}

/// Print a success message.
pub fn success(msg: &str, format: OutputFormat, quiet: bool) {
    if quiet || format == OutputFormat::Json {
        return;
    }
    println!("{} {}", "✓".green().bold(), msg);
}

/// Print an info message.
pub fn info(msg: &str, format: OutputFormat, quiet: bool) {
    if quiet || format == OutputFormat::Json {
        return;
    }
    println!("{}", msg);
}

/// Print a warning message.
pub fn warning(msg: &str, format: OutputFormat, quiet: bool) {
    if quiet || format == OutputFormat::Json {
        return;
    }
    eprintln!("{} {}", "⚠".yellow().bold(), msg);
}

/// Redraw a single-line progress indicator on stderr.
pub fn progress(stage: &str, percentage: u8, format: OutputFormat, quiet: bool) {
    if quiet || format == OutputFormat::Json {
        return;
    }
    let mut stderr = std::io::stderr();
    let _ = write!(stderr, "\r{} {:>3}%", stage.dimmed(), percentage);
    if percentage >= 100 {
        let _ = writeln!(stderr);
    }
    let _ = stderr.flush();
}

/// Report a fatal error. Errors are shown even in quiet mode.
pub fn error(err: &anyhow::Error, format: OutputFormat) {
    match format {
        OutputFormat::Text => {
            eprintln!("{} {}", "✗".red().bold(), err);
            for cause in err.chain().skip(1) {
                eprintln!("  {} {}", "caused by:".dimmed(), cause);
            }
        }
        OutputFormat::Json => {
            let causes: Vec<String> = err.chain().skip(1).map(|c| c.to_string()).collect();
            let value = serde_json::json!({ "error": err.to_string(), "causes": causes });
            if let Ok(json) = serde_json::to_string_pretty(&value) {
                println!("{}", json);
            }
        }
    }
}
