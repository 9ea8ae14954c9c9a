use std::fmt;

use crate::model::RawRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningCode {
    UnparsedValue,
    MissingRequired,
    EmptyRecord,
}

/// Diagnostic for a dropped or skipped record, carrying the raw cells that
/// triggered it.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertWarning {
    pub code: WarningCode,
    pub message: String,
    pub page: Option<u32>,
    pub raw: RawRow,
}

impl ConvertWarning {
    #[must_use]
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            page: None,
            raw: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    #[must_use]
    pub fn with_raw(mut self, raw: &[Option<String>]) -> Self {
        self.raw = raw.to_vec();
        self
    }
}

impl fmt::Display for ConvertWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)?;
        if let Some(page) = self.page {
            write!(f, " (page {page})")?;
        }
        if !self.raw.is_empty() {
            write!(f, " row=[")?;
            for (index, cell) in self.raw.iter().enumerate() {
                if index > 0 {
                    write!(f, ", ")?;
                }
                match cell {
                    Some(value) => write!(f, "{value:?}")?,
                    None => write!(f, "-")?,
                }
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}
