use crate::error::{ConvertError, ParseError};
use crate::model::RawRow;
use crate::options::{ColumnOptions, ColumnType, MergeStrategy};
use crate::value::Value;
use crate::warning::{ConvertWarning, WarningCode};

/// Validated per-column merge plan, fixed before any row is processed.
#[derive(Debug, Clone)]
pub(crate) struct ColumnPlan {
    pub name: String,
    pub column_type: ColumnType,
    pub required: bool,
    pub ignore_values: Vec<String>,
    pub strategy: MergeStrategy,
}

pub(crate) fn plan_columns(columns: &[ColumnOptions]) -> Result<Vec<ColumnPlan>, ConvertError> {
    columns
        .iter()
        .map(|column| {
            Ok(ColumnPlan {
                name: column.name.clone(),
                column_type: column.column_type,
                required: column.required,
                ignore_values: column.ignore_values.clone().unwrap_or_default(),
                strategy: column.merge_strategy()?,
            })
        })
        .collect()
}

/// Per-record state: one value list per column, plus the boundary row kept
/// for diagnostics. Owned exclusively by the merge loop and never visible
/// outside it.
#[derive(Debug)]
struct Accumulator {
    values: Vec<Vec<Value>>,
    opened_by: RawRow,
}

impl Accumulator {
    fn seed(row: &RawRow, plan: &[ColumnPlan]) -> Result<Self, ParseError> {
        let mut values = Vec::with_capacity(plan.len());
        for (column, cell) in plan.iter().zip(row) {
            match cell {
                Some(raw) => values.push(vec![Value::parse(raw, column.column_type)?]),
                None => values.push(Vec::new()),
            }
        }
        Ok(Self {
            values,
            opened_by: row.clone(),
        })
    }

    fn accumulate(&mut self, row: &RawRow, plan: &[ColumnPlan]) {
        for (index, (column, cell)) in plan.iter().zip(row).enumerate() {
            // Join columns are validated to be str-typed, so continuation
            // values never fail to parse.
            if let (MergeStrategy::Join(_), Some(raw)) = (&column.strategy, cell) {
                self.values[index].push(Value::Str(raw.clone()));
            }
        }
    }
}

fn is_complete(row: &RawRow, plan: &[ColumnPlan]) -> bool {
    plan.iter()
        .zip(row)
        .all(|(column, cell)| !column.required || cell.is_some())
}

fn should_ignore(row: &RawRow, plan: &[ColumnPlan]) -> bool {
    plan.iter().zip(row).any(|(column, cell)| match cell {
        Some(value) => {
            let trimmed = value.trim();
            column.ignore_values.iter().any(|ignored| ignored == trimmed)
        }
        None => false,
    })
}

fn flush(
    accumulator: Accumulator,
    plan: &[ColumnPlan],
    warnings: &mut Vec<ConvertWarning>,
    out: &mut Vec<Vec<Option<Value>>>,
) {
    let Accumulator { values, opened_by } = accumulator;

    let mut cells = Vec::with_capacity(plan.len());
    let mut any_value = false;
    for (column, collected) in plan.iter().zip(values) {
        let cell = match &column.strategy {
            MergeStrategy::KeepFirst => collected.into_iter().next(),
            MergeStrategy::Join(separator) => {
                if collected.is_empty() {
                    None
                } else {
                    let parts = collected
                        .iter()
                        .filter_map(Value::as_str)
                        .collect::<Vec<_>>();
                    Some(Value::Str(parts.join(separator)))
                }
            }
        };

        if column.required && cell.is_none() {
            warnings.push(
                ConvertWarning::new(
                    WarningCode::MissingRequired,
                    format!("required column '{}' is empty after merge", column.name),
                )
                .with_raw(&opened_by),
            );
            return;
        }

        any_value |= cell.is_some();
        cells.push(cell);
    }

    if !any_value {
        warnings.push(
            ConvertWarning::new(WarningCode::EmptyRecord, "record has no values")
                .with_raw(&opened_by),
        );
        return;
    }

    out.push(cells);
}

/// Reconstructs logical records from physical grid rows, holding at most one
/// open accumulator. Dropped records are reported through `warnings`; the
/// output never contains a partial record.
pub(crate) fn merge_rows(
    rows: Vec<RawRow>,
    plan: &[ColumnPlan],
    warnings: &mut Vec<ConvertWarning>,
) -> Vec<Vec<Option<Value>>> {
    let mut out = Vec::new();
    let mut open: Option<Accumulator> = None;

    for mut row in rows {
        row.resize(plan.len(), None);

        if should_ignore(&row, plan) {
            continue;
        }

        let starts_record = open.is_none() || is_complete(&row, plan);
        if starts_record {
            if let Some(previous) = open.take() {
                flush(previous, plan, warnings, &mut out);
            }
            match Accumulator::seed(&row, plan) {
                Ok(accumulator) => open = Some(accumulator),
                Err(error) => {
                    // A parse failure on the boundary row poisons the whole
                    // record: nothing is opened.
                    warnings.push(
                        ConvertWarning::new(WarningCode::UnparsedValue, error.to_string())
                            .with_raw(&row),
                    );
                }
            }
        } else if let Some(accumulator) = open.as_mut() {
            accumulator.accumulate(&row, plan);
        }
    }

    if let Some(last) = open.take() {
        flush(last, plan, warnings, &mut out);
    }

    out
}
