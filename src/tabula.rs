use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;

use crate::error::ConvertError;
use crate::model::{RawRow, Rect};

/// External table-extraction capability: one call per page, returning the raw
/// cell grid inside the given rectangle with the first row treated as data.
/// Failures are surfaced as [`ConvertError::ExternalTool`]; no retry happens
/// here.
pub trait TableGrid {
    fn extract_rows(&self, page: u32, area: Rect) -> Result<Vec<RawRow>, ConvertError>;
}

#[derive(Debug, Deserialize)]
struct JsonTable {
    data: Vec<Vec<JsonCell>>,
}

#[derive(Debug, Deserialize)]
struct JsonCell {
    text: String,
}

/// tabula-java driven as a subprocess, one invocation per page.
pub struct TabulaTool {
    jar: PathBuf,
    pdf: PathBuf,
}

impl TabulaTool {
    pub fn new(jar: impl Into<PathBuf>, pdf: impl Into<PathBuf>) -> Self {
        Self {
            jar: jar.into(),
            pdf: pdf.into(),
        }
    }
}

impl TableGrid for TabulaTool {
    fn extract_rows(&self, page: u32, area: Rect) -> Result<Vec<RawRow>, ConvertError> {
        let output = Command::new("java")
            .arg("-jar")
            .arg(&self.jar)
            .arg("--pages")
            .arg(page.to_string())
            .arg("--area")
            .arg(format!(
                "{:.2},{:.2},{:.2},{:.2}",
                area.top, area.left, area.bottom, area.right
            ))
            .arg("--format")
            .arg("JSON")
            .arg("--silent")
            .arg(&self.pdf)
            .output()
            .map_err(|error| ConvertError::ExternalTool {
                page,
                message: format!("failed to launch tabula: {error}"),
            })?;

        if !output.status.success() {
            return Err(ConvertError::ExternalTool {
                page,
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let tables: Vec<JsonTable> =
            serde_json::from_slice(&output.stdout).map_err(|error| ConvertError::ExternalTool {
                page,
                message: format!("undecodable tabula output: {error}"),
            })?;

        Ok(grid_rows(tables))
    }
}

fn grid_rows(tables: Vec<JsonTable>) -> Vec<RawRow> {
    tables
        .into_iter()
        .flat_map(|table| table.data)
        .map(|row| row.into_iter().map(|cell| normalize_cell(&cell.text)).collect())
        .collect()
}

/// Trims cell text and maps empty cells to a missing marker, keeping "cell
/// absent" distinct from any later parse failure.
pub(crate) fn normalize_cell(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{JsonTable, grid_rows, normalize_cell};

    #[test]
    fn normalizes_blank_cells_to_missing() {
        assert_eq!(normalize_cell("  Alice "), Some("Alice".to_string()));
        assert_eq!(normalize_cell("   "), None);
        assert_eq!(normalize_cell(""), None);
    }

    #[test]
    fn decodes_tabula_json_into_raw_rows() {
        let payload = r#"[
            {
                "extraction_method": "stream",
                "page_number": 1,
                "top": 80.0, "left": 0.0, "width": 612.0, "height": 400.0,
                "right": 612.0, "bottom": 480.0,
                "data": [
                    [{"top": 0, "left": 0, "width": 10, "height": 10, "text": "Bob"},
                     {"top": 0, "left": 0, "width": 10, "height": 10, "text": "10 USD"},
                     {"top": 0, "left": 0, "width": 10, "height": 10, "text": ""}],
                    [{"top": 0, "left": 0, "width": 10, "height": 10, "text": ""},
                     {"top": 0, "left": 0, "width": 10, "height": 10, "text": "late"}]
                ]
            }
        ]"#;

        let tables: Vec<JsonTable> = serde_json::from_str(payload).expect("JSON should decode");
        let rows = grid_rows(tables);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], Some("Bob".to_string()));
        assert_eq!(rows[0][2], None);
        assert_eq!(rows[1][0], None);
        assert_eq!(rows[1][1], Some("late".to_string()));
    }
}
