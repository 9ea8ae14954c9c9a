use std::cmp::Ordering;
use std::path::Path;

use csv::WriterBuilder;

use crate::error::ConvertError;
use crate::model::Table;
use crate::options::CsvOptions;
use crate::value::Value;

fn column_indices(table: &Table, names: &[String]) -> Result<Vec<usize>, ConvertError> {
    names
        .iter()
        .map(|name| {
            table.column_index(name).ok_or_else(|| {
                ConvertError::Config(format!("unknown output column '{name}'"))
            })
        })
        .collect()
}

fn cell_cmp(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match (a, b) {
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (Value::Money(a), Value::Money(b)) => a.cmp(b),
            (a, b) => a.to_string().cmp(&b.to_string()),
        },
    }
}

fn render(cell: Option<&Value>) -> String {
    cell.map(Value::to_string).unwrap_or_default()
}

/// Row order after applying the sort keys; each row keeps its original
/// ordinal for the optional index column.
fn output_order(table: &Table, options: &CsvOptions) -> Result<Vec<usize>, ConvertError> {
    let mut order = (0..table.rows.len()).collect::<Vec<_>>();
    if let Some(sort_by) = &options.sort_by {
        let keys = column_indices(table, sort_by)?;
        order.sort_by(|&a, &b| {
            keys.iter()
                .map(|&key| {
                    cell_cmp(
                        table.rows[a][key].as_ref(),
                        table.rows[b][key].as_ref(),
                    )
                })
                .find(|ordering| *ordering != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });
    }
    Ok(order)
}

fn write_rows<W: std::io::Write>(
    writer: &mut csv::Writer<W>,
    table: &Table,
    options: &CsvOptions,
) -> Result<(), ConvertError> {
    let selected = match &options.columns {
        Some(names) => column_indices(table, names)?,
        None => (0..table.headers.len()).collect(),
    };
    let order = output_order(table, options)?;

    let mut header = Vec::with_capacity(selected.len() + 1);
    if options.index {
        header.push(String::new());
    }
    header.extend(selected.iter().map(|&index| table.headers[index].clone()));
    writer.write_record(&header)?;

    for row_index in order {
        let row = &table.rows[row_index];
        let mut record = Vec::with_capacity(selected.len() + 1);
        if options.index {
            record.push(row_index.to_string());
        }
        record.extend(selected.iter().map(|&index| render(row[index].as_ref())));
        writer.write_record(&record)?;
    }

    Ok(())
}

pub(crate) fn write_csv(
    path: &Path,
    table: &Table,
    options: &CsvOptions,
) -> Result<(), ConvertError> {
    let mut writer = WriterBuilder::new().from_path(path)?;
    write_rows(&mut writer, table, options)?;
    writer.flush()?;
    Ok(())
}

pub(crate) fn write_csv_to_string(
    table: &Table,
    options: &CsvOptions,
) -> Result<String, ConvertError> {
    let mut writer = WriterBuilder::new().from_writer(Vec::<u8>::new());
    write_rows(&mut writer, table, options)?;
    writer.flush()?;

    let bytes = writer
        .into_inner()
        .map_err(|error| ConvertError::Csv(error.into_error().into()))?;
    String::from_utf8(bytes)
        .map_err(|error| ConvertError::Config(format!("invalid utf-8 csv output: {error}")))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::write_csv_to_string;
    use crate::model::Table;
    use crate::options::CsvOptions;
    use crate::value::Value;

    fn sample_table() -> Table {
        Table {
            headers: vec!["Name".to_string(), "Score".to_string(), "Note".to_string()],
            rows: vec![
                vec![
                    Some(Value::Str("Bob".to_string())),
                    Some(Value::Int(20)),
                    None,
                ],
                vec![
                    Some(Value::Str("Ann".to_string())),
                    Some(Value::Int(10)),
                    Some(Value::Str("late".to_string())),
                ],
            ],
        }
    }

    #[test]
    fn writes_all_columns_with_missing_cells_empty() {
        let csv = write_csv_to_string(&sample_table(), &CsvOptions {
            columns: None,
            sort_by: None,
            index: false,
        })
        .expect("csv should render");
        assert_eq!(csv, "Name,Score,Note\nBob,20,\nAnn,10,late\n");
    }

    #[test]
    fn selects_sorts_and_indexes() {
        let csv = write_csv_to_string(&sample_table(), &CsvOptions {
            columns: Some(vec!["Name".to_string(), "Score".to_string()]),
            sort_by: Some(vec!["Score".to_string()]),
            index: true,
        })
        .expect("csv should render");
        // Index keeps the pre-sort ordinal of each row.
        assert_eq!(csv, ",Name,Score\n1,Ann,10\n0,Bob,20\n");
    }

    #[test]
    fn unknown_column_is_a_configuration_error() {
        let error = write_csv_to_string(&sample_table(), &CsvOptions {
            columns: Some(vec!["Missing".to_string()]),
            sort_by: None,
            index: false,
        })
        .expect_err("unknown column should fail");
        assert!(error.to_string().contains("unknown output column"));
    }
}
