//! Output formatting utilities

use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use console::style;
use featurekv_core::FeatureValue;
use serde::Serialize;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

impl OutputFormat {
    /// Parse output format from string
    /// Unlike FromStr trait, this never fails - unknown values default to Table
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            "yaml" | "yml" => Self::Yaml,
            _ => Self::Table,
        }
    }
}

/// Print a serializable report as JSON or YAML
///
/// Commands draw their own tables; a table request here falls back to JSON.
pub fn print_output<T: Serialize>(data: &T, format: OutputFormat) -> Result<()> {
    let rendered = match format {
        OutputFormat::Yaml => serde_yaml::to_string(data)?,
        OutputFormat::Json | OutputFormat::Table => serde_json::to_string_pretty(data)?,
    };
    println!("{}", rendered);
    Ok(())
}

/// Create a styled table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Print success message
pub fn print_success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Print error message
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("✗").red().bold(), msg);
}

/// Print warning message
pub fn print_warning(msg: &str) {
    println!("{} {}", style("⚠").yellow().bold(), msg);
}

/// Print info message
pub fn print_info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}

/// Render a feature value for a table cell
pub fn format_value(value: &FeatureValue) -> String {
    fn join<T: ToString>(items: &[T]) -> String {
        let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
        format!("[{}]", parts.join(", "))
    }

    match value {
        FeatureValue::Null => "null".to_string(),
        FeatureValue::Int(v) => v.to_string(),
        FeatureValue::Float(v) => v.to_string(),
        FeatureValue::String(v) => v.clone(),
        FeatureValue::Bool(v) => v.to_string(),
        FeatureValue::Bytes(v) => {
            let hex: String = v.iter().map(|b| format!("{:02x}", b)).collect();
            format!("0x{}", hex)
        }
        FeatureValue::ArrayInt(v) => join(v),
        FeatureValue::ArrayFloat(v) => join(v),
        FeatureValue::ArrayString(v) => join(v),
        FeatureValue::Date(v) => v.to_string(),
    }
}

/// Table cell for a feature value, dimmed when null
pub fn value_cell(value: &FeatureValue) -> Cell {
    let cell = Cell::new(format_value(value));
    if value.is_null() {
        cell.fg(Color::DarkGrey)
    } else {
        cell
    }
}

/// Format count in human-readable form
pub fn format_count(count: u64) -> String {
    if count < 1000 {
        count.to_string()
    } else if count < 1_000_000 {
        format!("{:.1}K", count as f64 / 1000.0)
    } else if count < 1_000_000_000 {
        format!("{:.1}M", count as f64 / 1_000_000.0)
    } else {
        format!("{:.1}B", count as f64 / 1_000_000_000.0)
    }
}
