use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConvertError;
use crate::model::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Bool,
    Int,
    Float,
    #[serde(alias = "string")]
    Str,
    Date,
    Money,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "str",
            Self::Date => "date",
            Self::Money => "money",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JoinOptions {
    pub separator: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MergeOptions {
    #[serde(default)]
    pub join: Option<JoinOptions>,
}

/// How a column reduces the values collected across one logical record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeStrategy {
    KeepFirst,
    Join(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnOptions {
    pub name: String,
    #[serde(rename = "type", default = "default_column_type")]
    pub column_type: ColumnType,
    #[serde(default = "default_true")]
    pub required: bool,
    #[serde(default)]
    pub rename: Option<String>,
    #[serde(default)]
    pub ignore_values: Option<Vec<String>>,
    #[serde(default)]
    pub merge: Option<MergeOptions>,
}

impl ColumnOptions {
    #[must_use]
    pub fn output_name(&self) -> &str {
        self.rename.as_deref().unwrap_or(&self.name)
    }

    /// Resolves the merge block into a strategy, rejecting configurations
    /// that cannot be applied to this column.
    pub fn merge_strategy(&self) -> Result<MergeStrategy, ConvertError> {
        match &self.merge {
            None => Ok(MergeStrategy::KeepFirst),
            Some(MergeOptions { join: Some(join) }) => {
                if self.column_type == ColumnType::Str {
                    Ok(MergeStrategy::Join(join.separator.clone()))
                } else {
                    Err(ConvertError::Config(format!(
                        "column '{}' uses a join merge but is typed {}; join merges require str",
                        self.name, self.column_type
                    )))
                }
            }
            Some(MergeOptions { join: None }) => Err(ConvertError::Config(format!(
                "column '{}' has a merge block without a strategy",
                self.name
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableOptions {
    pub columns: Vec<ColumnOptions>,
    #[serde(default)]
    pub footers: Vec<String>,
    #[serde(default)]
    pub include_footer: bool,
    #[serde(default)]
    pub offset: Rect,
    #[serde(default = "default_join_tolerance")]
    pub word_join_tolerance: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PdfOptions {
    #[serde(default)]
    pub table: Option<TableOptions>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReadOptions {
    #[serde(default)]
    pub pdf: Option<PdfOptions>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CsvOptions {
    #[serde(default)]
    pub columns: Option<Vec<String>>,
    #[serde(default)]
    pub sort_by: Option<Vec<String>>,
    #[serde(default)]
    pub index: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WriteOptions {
    #[serde(default)]
    pub csv: Option<CsvOptions>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConvertOptions {
    pub read: ReadOptions,
    pub write: WriteOptions,
}

pub fn load_options(path: &Path) -> Result<ConvertOptions, ConvertError> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&text)?)
}

fn default_column_type() -> ColumnType {
    ColumnType::Str
}

fn default_true() -> bool {
    true
}

fn default_join_tolerance() -> f64 {
    3.0
}
