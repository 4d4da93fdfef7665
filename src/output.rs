//! Rendering of emitted values on stdout

use anyhow::Result;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Pretty-printed JSON, one document per value
    #[default]
    Json,
    /// YAML documents separated by `---`
    Yaml,
    /// Scalars as-is, one line each; objects as compact JSON
    Text,
}

pub fn write_value(w: &mut dyn Write, value: &Value, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => writeln!(w, "{}", serde_json::to_string_pretty(value)?)?,
        OutputFormat::Yaml => {
            writeln!(w, "---")?;
            write!(w, "{}", serde_yaml::to_string(value)?)?;
        }
        OutputFormat::Text => write_text(w, value)?,
    }
    Ok(())
}

fn write_text(w: &mut dyn Write, value: &Value) -> Result<()> {
    match value {
        Value::Null => {}
        Value::String(s) => writeln!(w, "{}", s)?,
        Value::Array(items) => {
            for item in items {
                write_text(w, item)?;
            }
        }
        other => writeln!(w, "{}", other)?,
    }
    Ok(())
}
