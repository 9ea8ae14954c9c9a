use serde::Deserialize;

use crate::value::Value;

/// Rectangle in top-left page coordinates: `top`/`bottom` grow downwards.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub rect: Rect,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WordHit {
    pub text: String,
    pub page: u32,
    pub rect: Rect,
}

/// One physical grid line, positionally aligned with the column list.
/// `None` marks a cell the extractor left empty.
pub type RawRow = Vec<Option<String>>;

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<Value>>>,
}

impl Table {
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }
}
