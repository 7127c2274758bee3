//! Decimal column stored as text.
//!
//! SeaORM maps `Decimal` to `real` on SQLite and binds it through an `f64`, which
//! loses digits. `ExactDecimal` writes the decimal's canonical string instead and
//! parses it back, so what is read equals what was written, scale included.

use rust_decimal::Decimal;
use sea_orm::{
    ColIdx, DbErr, QueryResult, TryGetError, TryGetable, Value,
    sea_query::{ArrayType, ColumnType, ValueType, ValueTypeErr},
};
use serde::{Deserialize, Serialize};
use std::{fmt, ops::Deref};

/// A `Decimal` persisted as its exact text representation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExactDecimal(pub Decimal);

impl ExactDecimal {
    /// The wrapped value.
    #[must_use]
    pub const fn get(self) -> Decimal {
        self.0
    }
}

impl Deref for ExactDecimal {
    type Target = Decimal;

    fn deref(&self) -> &Decimal {
        &self.0
    }
}

impl From<Decimal> for ExactDecimal {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl From<ExactDecimal> for Decimal {
    fn from(value: ExactDecimal) -> Self {
        value.0
    }
}

impl PartialEq<Decimal> for ExactDecimal {
    fn eq(&self, other: &Decimal) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for ExactDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<ExactDecimal> for Value {
    fn from(value: ExactDecimal) -> Self {
        Self::String(Some(Box::new(value.0.to_string())))
    }
}

impl TryGetable for ExactDecimal {
    fn try_get_by<I: ColIdx>(res: &QueryResult, index: I) -> Result<Self, TryGetError> {
        let text = String::try_get_by(res, index)?;
        text.parse::<Decimal>().map(Self).map_err(|e| {
            TryGetError::DbErr(DbErr::Type(format!(
                "Stored decimal '{text}' is not a valid number: {e}"
            )))
        })
    }
}

impl ValueType for ExactDecimal {
    fn try_from(value: Value) -> Result<Self, ValueTypeErr> {
        match value {
            Value::String(Some(text)) => text.parse().map(Self).map_err(|_| ValueTypeErr),
            _ => Err(ValueTypeErr),
        }
    }

    fn type_name() -> String {
        "ExactDecimal".to_string()
    }

    fn array_type() -> ArrayType {
        ArrayType::String
    }

    fn column_type() -> ColumnType {
        ColumnType::Text
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_value_keeps_every_digit() {
        let value = ExactDecimal(dec!(0.333333333333333333));
        let stored = Value::from(value);
        assert_eq!(
            stored,
            Value::String(Some(Box::new("0.333333333333333333".to_string())))
        );
        assert_eq!(<ExactDecimal as ValueType>::try_from(stored).unwrap(), value);
    }

    #[test]
    fn test_scale_survives() {
        let stored = Value::from(ExactDecimal(dec!(25.00)));
        let back = <ExactDecimal as ValueType>::try_from(stored).unwrap();
        assert_eq!(back.0.scale(), 2);
        assert_eq!(back.to_string(), "25.00");
    }

    #[test]
    fn test_rejects_non_text() {
        assert!(<ExactDecimal as ValueType>::try_from(Value::Double(Some(1.5))).is_err());
    }
}
