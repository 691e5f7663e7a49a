use crate::index::ErrorRecord;
use crate::scope::{IgnoreEntry, SkipRule};
use colored::*;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// An error placed in its buffer, ready for display.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorReport {
    pub word: String,
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
    pub context: String,
    pub suggestions: Vec<String>,
}

impl ErrorReport {
    pub fn new(text: &str, record: &ErrorRecord, suggestions: Vec<String>) -> Self {
        let (line, column) = line_col(text, record.start);
        let line_start = text[..record.start].rfind('\n').map_or(0, |i| i + 1);
        let line_end = text[record.start..]
            .find('\n')
            .map_or(text.len(), |i| record.start + i);
        Self {
            word: record.word.clone(),
            start: record.start,
            end: record.end,
            line,
            column,
            context: text[line_start..line_end].trim().to_string(),
            suggestions,
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonOutput<'a> {
    file: &'a str,
    skipped: bool,
    total_errors: usize,
    errors: &'a [ErrorReport],
}

/// 1-based line and column (in chars) of a byte offset.
pub fn line_col(text: &str, offset: usize) -> (usize, usize) {
    let before = &text[..offset.min(text.len())];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}

pub fn render_errors(
    file: &str,
    skipped: bool,
    errors: &[ErrorReport],
    colored_output: bool,
    format: OutputFormat,
) -> String {
    match format {
        OutputFormat::Text => render_text_errors(file, skipped, errors, colored_output),
        OutputFormat::Json => {
            let output = JsonOutput {
                file,
                skipped,
                total_errors: errors.len(),
                errors,
            };
            serde_json::to_string_pretty(&output).unwrap_or_default()
        }
    }
}

fn render_text_errors(file: &str, skipped: bool, errors: &[ErrorReport], colored_output: bool) -> String {
    let mut out = String::new();
    if skipped {
        let line = format!("{} skipped", file);
        if colored_output {
            out.push_str(&line.dimmed().to_string());
        } else {
            out.push_str(&line);
        }
        out.push('\n');
        return out;
    }
    if errors.is_empty() {
        return out;
    }

    if colored_output {
        out.push_str(&format!("{}\n", file.bold().underline()));
    } else {
        out.push_str(&format!("{}\n", file));
    }

    for error in errors {
        let line_info = format!("{}:{}", error.line, error.column);
        if colored_output {
            out.push_str(&format!(
                "  {} {} {}\n",
                line_info.blue().bold(),
                error.word.red().bold(),
                error.context.replace(&error.word, &error.word.red().bold().to_string())
            ));
        } else {
            out.push_str(&format!("  {} {} {}\n", line_info, error.word, error.context));
        }

        if !error.suggestions.is_empty() {
            let suggestions = error.suggestions.join(", ");
            if colored_output {
                out.push_str(&format!("    {} {}\n", "→".dimmed(), suggestions.green()));
            } else {
                out.push_str(&format!("    → {}\n", suggestions));
            }
        }
    }
    out
}

pub fn render_entries(entries: &[IgnoreEntry], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => entries
            .iter()
            .map(|e| format!("{}\t{}\n", e.scope, e.word))
            .collect(),
        OutputFormat::Json => {
            let rows: Vec<_> = entries
                .iter()
                .map(|e| {
                    serde_json::json!({
                        "scope": e.scope.kind(),
                        "key": e.scope.key(),
                        "word": e.word,
                    })
                })
                .collect();
            serde_json::to_string_pretty(&rows).unwrap_or_default()
        }
    }
}

pub fn render_skip_rules(rules: &[SkipRule]) -> String {
    rules.iter().map(|r| format!("{}\n", r)).collect()
}

pub fn print_check_summary(total_errors: usize, colored: bool) {
    if total_errors == 0 {
        if colored {
            println!("{}", "✓ No spelling errors found!".green().bold());
        } else {
            println!("✓ No spelling errors found!");
        }
    } else {
        let error_word = if total_errors == 1 { "error" } else { "errors" };
        if colored {
            println!(
                "{} {} {} found",
                "✗".red().bold(),
                total_errors.to_string().red().bold(),
                error_word
            );
        } else {
            println!("✗ {} {} found", total_errors, error_word);
        }
    }
}
