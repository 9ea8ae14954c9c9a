use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::ParseError;
use crate::options::ColumnType;

pub(crate) const DATE_FORMAT: &str = "%d.%m.%Y";

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Date(NaiveDate),
    Money(Decimal),
}

impl Value {
    /// Parses a raw cell as the declared column type.
    pub fn parse(raw: &str, column_type: ColumnType) -> Result<Self, ParseError> {
        let fail = || ParseError {
            column_type,
            raw: raw.to_string(),
        };

        match column_type {
            ColumnType::Bool => match raw.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(Self::Bool(true)),
                "false" => Ok(Self::Bool(false)),
                _ => Err(fail()),
            },
            ColumnType::Int => raw.parse().map(Self::Int).map_err(|_| fail()),
            ColumnType::Float => raw.parse().map(Self::Float).map_err(|_| fail()),
            ColumnType::Str => Ok(Self::Str(raw.to_string())),
            ColumnType::Date => NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .map(Self::Date)
                .map_err(|_| fail()),
            ColumnType::Money => {
                // "1,234.56 USD": amount before the first space, grouping
                // commas stripped. The currency token is not retained.
                let (amount, _currency) = raw.split_once(' ').unwrap_or((raw, ""));
                amount
                    .replace(',', "")
                    .parse::<Decimal>()
                    .map(Self::Money)
                    .map_err(|_| fail())
            }
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Str(value) => f.write_str(value),
            Self::Date(value) => write!(f, "{value}"),
            Self::Money(value) => write!(f, "{value}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::Value;
    use crate::options::ColumnType;

    #[test]
    fn parses_bool_case_insensitively() {
        assert_eq!(
            Value::parse("TRUE", ColumnType::Bool).expect("bool should parse"),
            Value::Bool(true)
        );
        let error = Value::parse("yes", ColumnType::Bool).expect_err("non-bool should fail");
        assert_eq!(error.raw, "yes");
        assert_eq!(error.column_type, ColumnType::Bool);
    }

    #[test]
    fn parses_numbers_strictly() {
        assert_eq!(
            Value::parse("42", ColumnType::Int).expect("int should parse"),
            Value::Int(42)
        );
        assert_eq!(
            Value::parse("2.5", ColumnType::Float).expect("float should parse"),
            Value::Float(2.5)
        );
        assert!(Value::parse("1,000", ColumnType::Int).is_err());
    }

    #[test]
    fn parses_dotted_dates_only() {
        let date = NaiveDate::from_ymd_opt(2023, 12, 31).expect("valid date");
        assert_eq!(
            Value::parse("31.12.2023", ColumnType::Date).expect("date should parse"),
            Value::Date(date)
        );
        assert!(Value::parse("2023-12-31", ColumnType::Date).is_err());
    }

    #[test]
    fn parses_money_and_drops_currency_token() {
        let amount: Decimal = "1234.56".parse().expect("valid decimal");
        assert_eq!(
            Value::parse("1,234.56 USD", ColumnType::Money).expect("money should parse"),
            Value::Money(amount)
        );
        assert_eq!(
            Value::parse("10 USD", ColumnType::Money).expect("money should parse"),
            Value::Money("10".parse().expect("valid decimal"))
        );
    }

    #[test]
    fn renders_dates_iso_and_money_as_amount() {
        let date = Value::parse("31.12.2023", ColumnType::Date).expect("date should parse");
        assert_eq!(date.to_string(), "2023-12-31");

        let money = Value::parse("1,234.56 USD", ColumnType::Money).expect("money should parse");
        assert_eq!(money.to_string(), "1234.56");
    }
}
