//! Legends board export.
//!
//! Provides JSON and CSV export.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::legends::LegendEntry;

/// Current export format version.
pub const EXPORT_VERSION: &str = "1.0";

/// Export envelope for the legends board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegendsExport {
    pub entries: Vec<LegendEntry>,
    pub exported_at: DateTime<Utc>,
    pub export_version: String,
}

impl LegendsExport {
    pub fn new(entries: Vec<LegendEntry>) -> Self {
        Self {
            entries,
            exported_at: Utc::now(),
            export_version: EXPORT_VERSION.to_string(),
        }
    }
}

/// Export the board to JSON.
pub fn export_json(entries: &[LegendEntry]) -> Result<String, ExportError> {
    let export = LegendsExport::new(entries.to_vec());
    serde_json::to_string_pretty(&export).map_err(|e| ExportError::SerializationFailed(e.to_string()))
}

/// Parse a JSON export.
pub fn import_json(content: &str) -> Result<LegendsExport, ExportError> {
    let export: LegendsExport =
        serde_json::from_str(content).map_err(|e| ExportError::ParseError(e.to_string()))?;

    if export.export_version != EXPORT_VERSION {
        return Err(ExportError::UnsupportedVersion(export.export_version));
    }

    Ok(export)
}

/// Export the board to CSV, one row per user in board order.
pub fn export_csv(entries: &[LegendEntry]) -> String {
    let mut csv = String::new();
    csv.push_str("position,user_id,display_name,count_koms,count_top10,total_segments\n");

    for (position, entry) in entries.iter().enumerate() {
        csv.push_str(&format!(
            "{},{},{},{},{},{}\n",
            position + 1,
            entry.user_id,
            escape_csv(&entry.display_name),
            entry.count_koms,
            entry.count_top10,
            entry.total_segments,
        ));
    }

    csv
}

/// Escape a string for CSV.
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Export errors.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Unsupported export version: {0}")]
    UnsupportedVersion(String),
}
