// Output formatting for CLI

use std::io::Write;

use anyhow::Result;

use crate::cli::config::OutputFormat;

/// Format and output data
pub struct OutputFormatter {
    format: OutputFormat,
    quiet: bool,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Output metadata
    pub fn output_metadata(&self, metadata: &serde_json::Value, writer: &mut dyn Write) -> Result<()> {
        match self.format {
            OutputFormat::Pretty => {
                writeln!(writer, "{}", serde_json::to_string_pretty(metadata)?)?;
            }
            OutputFormat::Json => {
                writeln!(writer, "{}", serde_json::to_string(metadata)?)?;
            }
            OutputFormat::KeyValue => {
                self.output_key_value(metadata, writer)?;
            }
            OutputFormat::Table => {
                self.output_table(metadata, writer)?;
            }
        }
        Ok(())
    }

    /// Output as key-value pairs
    fn output_key_value(&self, metadata: &serde_json::Value, writer: &mut dyn Write) -> Result<()> {
        if let Some(obj) = metadata.as_object() {
            let mut items: Vec<_> = obj.iter().collect();
            items.sort_by(|a, b| a.0.cmp(b.0));

            for (key, value) in items {
                writeln!(writer, "{}: {}", key, format_value(value))?;
            }
        }
        Ok(())
    }

    /// Output as table
    fn output_table(&self, metadata: &serde_json::Value, writer: &mut dyn Write) -> Result<()> {
        if let Some(obj) = metadata.as_object() {
            let max_key_len = obj.keys().map(|k| k.len()).max().unwrap_or(0);

            writeln!(writer, "{}", "=".repeat(max_key_len + 30))?;

            for (key, value) in obj {
                writeln!(
                    writer,
                    "{:<width$}: {}",
                    format!("{}:", key),
                    format_value(value),
                    width = max_key_len + 2
                )?;
            }

            writeln!(writer, "{}", "=".repeat(max_key_len + 30))?;
        }
        Ok(())
    }

    /// Print success message
    pub fn print_success(&self, message: &str) {
        if !self.quiet {
            println!("✓ {}", message);
        }
    }

    /// Print error message
    pub fn print_error(&self, message: &str) {
        eprintln!("✗ {}", message);
    }

    /// Print info message
    pub fn print_info(&self, message: &str) {
        if !self.quiet {
            println!("  {}", message);
        }
    }
}

/// Format a JSON value for display
pub fn format_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) if s.chars().count() > 60 => {
            let head: String = s.chars().take(57).collect();
            format!("{}... ({} chars)", head, s.chars().count())
        }
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => "(null)".to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Array(arr) => format!("[{} items]", arr.len()),
        serde_json::Value::Object(obj) => format!("{{{} items}}", obj.len()),
    }
}
