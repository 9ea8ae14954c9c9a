mod area;
mod csv_out;
mod error;
mod merge;
mod model;
mod options;
mod page_text;
mod tabula;
mod value;
mod warning;
mod word_search;

use std::path::Path;

pub use crate::area::resolve_table_areas;
pub use crate::error::{ConvertError, ParseError};
pub use crate::model::{RawRow, Rect, Table, TextRun, WordHit};
pub use crate::options::{
    ColumnOptions, ColumnType, ConvertOptions, CsvOptions, JoinOptions, MergeOptions,
    MergeStrategy, PdfOptions, ReadOptions, TableOptions, WriteOptions, load_options,
};
pub use crate::page_text::{PageText, PdfPages};
pub use crate::tabula::{TableGrid, TabulaTool};
pub use crate::value::Value;
pub use crate::warning::{ConvertWarning, WarningCode};
pub use crate::word_search::{WordQuery, WordSearch, search_words};

/// Result of extracting one document's table.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub table: Table,
    /// Pages on which a table area was resolved.
    pub pages: usize,
    pub warnings: Vec<ConvertWarning>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversionSummary {
    pub rows: usize,
    pub pages: usize,
    pub warnings: Vec<ConvertWarning>,
}

/// Extracts one table from a document: per page with a resolved area, crop,
/// pull the raw grid, and merge multiline rows, concatenating pages in
/// ascending order.
pub fn extract_table<S: PageText, G: TableGrid>(
    source: &S,
    grid: &G,
    options: &TableOptions,
) -> Result<Extraction, ConvertError> {
    // Configuration problems must surface before any row is processed.
    let plan = merge::plan_columns(&options.columns)?;
    let headers = options
        .columns
        .iter()
        .map(|column| column.output_name().to_string())
        .collect();

    let areas = resolve_table_areas(source, options)?;

    let mut warnings = Vec::new();
    let mut rows = Vec::new();
    for (&page, &page_area) in &areas {
        let cropped = area::offset_area(page_area, options.offset);
        let raw_rows = grid.extract_rows(page, cropped)?;
        tracing::debug!(page, raw_rows = raw_rows.len(), "extracted raw grid");

        let mut page_warnings = Vec::new();
        rows.extend(merge::merge_rows(raw_rows, &plan, &mut page_warnings));
        for warning in page_warnings {
            let warning = warning.with_page(page);
            tracing::warn!("{warning}");
            warnings.push(warning);
        }
    }

    Ok(Extraction {
        table: Table { headers, rows },
        pages: areas.len(),
        warnings,
    })
}

pub fn read_report(
    input: &Path,
    options: &ReadOptions,
    tabula_jar: &Path,
) -> Result<Extraction, ConvertError> {
    let table_options = options
        .pdf
        .as_ref()
        .and_then(|pdf| pdf.table.as_ref())
        .ok_or_else(|| {
            ConvertError::Config("read options do not specify a pdf table".to_string())
        })?;

    let source = PdfPages::open(input)?;
    let grid = TabulaTool::new(tabula_jar, input);
    extract_table(&source, &grid, table_options)
}

pub fn write_report(
    output: &Path,
    table: &Table,
    options: &WriteOptions,
) -> Result<(), ConvertError> {
    let csv_options = options.csv.as_ref().ok_or_else(|| {
        ConvertError::Config("write options do not specify a csv target".to_string())
    })?;
    csv_out::write_csv(output, table, csv_options)
}

pub fn render_report_csv(table: &Table, options: &WriteOptions) -> Result<String, ConvertError> {
    let csv_options = options.csv.as_ref().ok_or_else(|| {
        ConvertError::Config("write options do not specify a csv target".to_string())
    })?;
    csv_out::write_csv_to_string(table, csv_options)
}

/// Reads the table out of `input` and writes `<input>.csv` next to it.
pub fn convert_report(
    input: &Path,
    options: &ConvertOptions,
    tabula_jar: &Path,
) -> Result<ConversionSummary, ConvertError> {
    let extraction = read_report(input, &options.read, tabula_jar)?;
    write_report(
        &input.with_extension("csv"),
        &extraction.table,
        &options.write,
    )?;

    Ok(ConversionSummary {
        rows: extraction.table.rows.len(),
        pages: extraction.pages,
        warnings: extraction.warnings,
    })
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{ConvertError, ReadOptions, read_report};

    #[test]
    fn read_without_table_options_is_a_configuration_error() {
        let options = ReadOptions { pdf: None };
        let error = read_report(Path::new("unused.pdf"), &options, Path::new("tabula.jar"))
            .expect_err("missing table options should fail");
        assert!(matches!(error, ConvertError::Config(_)), "error: {error}");
    }
}
