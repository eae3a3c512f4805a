//! Table and column descriptors.
//!
//! The planner core sees a narrow slice of the catalog: a column knows its
//! owning table, ordinal, name, and declared type, and can coerce an
//! arbitrary [`Value`] to that type. The owning table contributes only its
//! kind, which gates IN-condition pushdown on non-regular tables.

use std::fmt::{self, Display};
use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, Result};
use crate::value::{Value, decimal_text};

const NANOS_PER_DAY: i64 = 86_400_000_000_000;

/// SQL data types supported by the planner core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    /// 8-bit signed integer.
    TinyInt,
    /// 16-bit signed integer.
    SmallInt,
    /// 32-bit signed integer.
    Integer,
    /// 64-bit signed integer.
    BigInt,
    /// 64-bit floating point.
    Real,
    /// Fixed-precision decimal.
    Decimal {
        /// Total number of digits.
        precision: u8,
        /// Digits after the decimal point.
        scale: u8,
    },
    /// UTF-8 text.
    Text,
    /// Raw bytes.
    Bytes,
    /// Boolean.
    Boolean,
    /// Date (days since Unix epoch).
    Date,
    /// Time of day (nanoseconds within day).
    Time,
    /// Timestamp (nanoseconds since Unix epoch).
    Timestamp,
}

impl Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::TinyInt => write!(f, "TINYINT"),
            DataType::SmallInt => write!(f, "SMALLINT"),
            DataType::Integer => write!(f, "INTEGER"),
            DataType::BigInt => write!(f, "BIGINT"),
            DataType::Real => write!(f, "REAL"),
            DataType::Decimal { precision, scale } => {
                write!(f, "DECIMAL({precision}, {scale})")
            }
            DataType::Text => write!(f, "TEXT"),
            DataType::Bytes => write!(f, "BYTES"),
            DataType::Boolean => write!(f, "BOOLEAN"),
            DataType::Date => write!(f, "DATE"),
            DataType::Time => write!(f, "TIME"),
            DataType::Timestamp => write!(f, "TIMESTAMP"),
        }
    }
}

/// What kind of relation owns a column.
///
/// Only `Regular` tables permit IN conditions to keep index access when
/// other conditions apply to the same index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    /// A physical base table.
    Regular,
    /// A view over other relations.
    View,
    /// A table produced by a table function.
    FunctionTable,
    /// A system catalog table.
    SystemTable,
    /// A table living on a remote data node.
    External,
}

/// A table descriptor, as seen by the planner core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    name: String,
    kind: TableKind,
}

impl Table {
    /// Creates a table descriptor.
    pub fn new(name: impl Into<String>, kind: TableKind) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            kind,
        })
    }

    /// Returns the table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the table kind.
    pub fn kind(&self) -> TableKind {
        self.kind
    }
}

/// A column descriptor: identity plus declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    table: Arc<Table>,
    ordinal: usize,
    name: String,
    data_type: DataType,
}

impl Column {
    /// Creates a column owned by `table`.
    pub fn new(
        table: &Arc<Table>,
        ordinal: usize,
        name: impl Into<String>,
        data_type: DataType,
    ) -> Self {
        Self {
            table: Arc::clone(table),
            ordinal,
            name: name.into(),
            data_type,
        }
    }

    /// Returns the owning table.
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Returns the column's position in its table.
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// Returns the column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared type.
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Renders the column identifier for explain output.
    ///
    /// Plain uppercase identifiers stay bare; anything else is quoted.
    pub fn sql(&self) -> String {
        let mut chars = self.name.chars();
        let plain = chars
            .next()
            .is_some_and(|c| c.is_ascii_uppercase())
            && self
                .name
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
        if plain {
            self.name.clone()
        } else {
            format!("\"{}\"", self.name.replace('"', "\"\""))
        }
    }

    /// Coerces a value to this column's declared type.
    ///
    /// NULL passes through unchanged. Unsupported source/target pairs fail
    /// with `InvalidValueClass`; values that do not fit the target fail
    /// with `OutOfRange`, and unparseable text fails with `DataConversion`.
    pub fn convert(&self, value: Value) -> Result<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        let target = self.data_type;
        match target {
            DataType::TinyInt | DataType::SmallInt | DataType::Integer | DataType::BigInt => {
                self.convert_integer(value, target)
            }
            DataType::Real => self.convert_real(value),
            DataType::Decimal { scale, .. } => self.convert_decimal(value, scale),
            DataType::Text => self.convert_text(value),
            DataType::Boolean => self.convert_boolean(value),
            DataType::Bytes => match value {
                Value::Bytes(_) => Ok(value),
                other => Err(self.invalid_class(&other)),
            },
            DataType::Date => match value {
                Value::Date(_) => Ok(value),
                Value::Timestamp(n) => {
                    let days = n.div_euclid(NANOS_PER_DAY);
                    i32::try_from(days)
                        .map(Value::Date)
                        .map_err(|_| self.out_of_range(&Value::Timestamp(n)))
                }
                other => Err(self.invalid_class(&other)),
            },
            DataType::Time => match value {
                Value::Time(_) => Ok(value),
                Value::Timestamp(n) => Ok(Value::Time(n.rem_euclid(NANOS_PER_DAY))),
                other => Err(self.invalid_class(&other)),
            },
            DataType::Timestamp => match value {
                Value::Timestamp(_) => Ok(value),
                Value::Date(d) => i64::from(d)
                    .checked_mul(NANOS_PER_DAY)
                    .map(Value::Timestamp)
                    .ok_or_else(|| self.out_of_range(&Value::Date(d))),
                other => Err(self.invalid_class(&other)),
            },
        }
    }

    fn convert_integer(&self, value: Value, target: DataType) -> Result<Value> {
        let wide = match &value {
            Value::TinyInt(_) | Value::SmallInt(_) | Value::Integer(_) | Value::BigInt(_) => {
                match value.as_int_family() {
                    Some(v) => v,
                    None => return Err(self.invalid_class(&value)),
                }
            }
            Value::Real(f) => {
                let r = f.round();
                if !r.is_finite() {
                    return Err(self.out_of_range(&value));
                }
                r as i128
            }
            Value::Decimal(v, s) => match Decimal::try_from_i128_with_scale(*v, u32::from(*s)) {
                Ok(d) => match d.round().to_i128() {
                    Some(i) => i,
                    None => return Err(self.out_of_range(&value)),
                },
                Err(_) => v.div_euclid(10i128.pow(u32::from(*s))),
            },
            Value::Text(s) => match s.trim().parse::<i128>() {
                Ok(i) => i,
                Err(_) => {
                    return Err(PlannerError::DataConversion {
                        value: s.clone(),
                        target,
                    });
                }
            },
            Value::Boolean(b) => i128::from(*b),
            other => return Err(self.invalid_class(other)),
        };
        self.narrow_integer(wide, target, &value)
    }

    fn narrow_integer(&self, wide: i128, target: DataType, source: &Value) -> Result<Value> {
        let out_of_range = || self.out_of_range(source);
        match target {
            DataType::TinyInt => i8::try_from(wide)
                .map(Value::TinyInt)
                .map_err(|_| out_of_range()),
            DataType::SmallInt => i16::try_from(wide)
                .map(Value::SmallInt)
                .map_err(|_| out_of_range()),
            DataType::Integer => i32::try_from(wide)
                .map(Value::Integer)
                .map_err(|_| out_of_range()),
            _ => i64::try_from(wide)
                .map(Value::BigInt)
                .map_err(|_| out_of_range()),
        }
    }

    fn convert_real(&self, value: Value) -> Result<Value> {
        match &value {
            Value::Real(_) => Ok(value),
            Value::TinyInt(_) | Value::SmallInt(_) | Value::Integer(_) | Value::BigInt(_) => {
                match value.as_int_family() {
                    Some(v) => Ok(Value::Real(v as f64)),
                    None => Err(self.invalid_class(&value)),
                }
            }
            Value::Decimal(v, s) => {
                let real = Decimal::try_from_i128_with_scale(*v, u32::from(*s))
                    .ok()
                    .and_then(|d| d.to_f64())
                    .unwrap_or_else(|| *v as f64 / 10f64.powi(i32::from(*s)));
                Ok(Value::Real(real))
            }
            Value::Text(s) => s.trim().parse::<f64>().map(Value::Real).map_err(|_| {
                PlannerError::DataConversion {
                    value: s.clone(),
                    target: DataType::Real,
                }
            }),
            Value::Boolean(b) => Ok(Value::Real(if *b { 1.0 } else { 0.0 })),
            other => Err(self.invalid_class(other)),
        }
    }

    fn convert_decimal(&self, value: Value, scale: u8) -> Result<Value> {
        let rescaled = |mut d: Decimal| {
            d.rescale(u32::from(scale));
            Value::Decimal(d.mantissa(), scale)
        };
        match &value {
            Value::Decimal(v, s) if *s == scale => Ok(Value::Decimal(*v, *s)),
            Value::Decimal(v, s) => match Decimal::try_from_i128_with_scale(*v, u32::from(*s)) {
                Ok(d) => Ok(rescaled(d)),
                Err(_) => {
                    // Outside rust_decimal's range: shift the mantissa directly.
                    if scale >= *s {
                        v.checked_mul(10i128.pow(u32::from(scale - *s)))
                            .map(|m| Value::Decimal(m, scale))
                            .ok_or_else(|| self.out_of_range(&value))
                    } else {
                        Ok(Value::Decimal(
                            v.div_euclid(10i128.pow(u32::from(*s - scale))),
                            scale,
                        ))
                    }
                }
            },
            Value::TinyInt(_) | Value::SmallInt(_) | Value::Integer(_) | Value::BigInt(_) => {
                match value.as_int_family() {
                    Some(v) => v
                        .checked_mul(10i128.pow(u32::from(scale)))
                        .map(|m| Value::Decimal(m, scale))
                        .ok_or_else(|| self.out_of_range(&value)),
                    None => Err(self.invalid_class(&value)),
                }
            }
            Value::Real(f) => Decimal::from_f64(*f)
                .map(rescaled)
                .ok_or_else(|| self.out_of_range(&value)),
            Value::Text(s) => s.trim().parse::<Decimal>().map(rescaled).map_err(|_| {
                PlannerError::DataConversion {
                    value: s.clone(),
                    target: self.data_type,
                }
            }),
            other => Err(self.invalid_class(other)),
        }
    }

    fn convert_text(&self, value: Value) -> Result<Value> {
        match &value {
            Value::Text(_) => Ok(value),
            Value::TinyInt(_) | Value::SmallInt(_) | Value::Integer(_) | Value::BigInt(_) => {
                match value.as_int_family() {
                    Some(v) => Ok(Value::Text(v.to_string())),
                    None => Err(self.invalid_class(&value)),
                }
            }
            Value::Real(f) => Ok(Value::Text(f.to_string())),
            Value::Decimal(v, s) => Ok(Value::Text(decimal_text(*v, *s))),
            Value::Boolean(b) => Ok(Value::Text(
                if *b { "TRUE" } else { "FALSE" }.to_string(),
            )),
            Value::Date(_) | Value::Time(_) | Value::Timestamp(_) => {
                Ok(Value::Text(value.to_string()))
            }
            other => Err(self.invalid_class(other)),
        }
    }

    fn convert_boolean(&self, value: Value) -> Result<Value> {
        match &value {
            Value::Boolean(_) => Ok(value),
            Value::TinyInt(_) | Value::SmallInt(_) | Value::Integer(_) | Value::BigInt(_) => {
                match value.as_int_family() {
                    Some(v) => Ok(Value::Boolean(v != 0)),
                    None => Err(self.invalid_class(&value)),
                }
            }
            Value::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "t" | "1" => Ok(Value::Boolean(true)),
                "false" | "f" | "0" => Ok(Value::Boolean(false)),
                _ => Err(PlannerError::DataConversion {
                    value: s.clone(),
                    target: DataType::Boolean,
                }),
            },
            other => Err(self.invalid_class(other)),
        }
    }

    fn invalid_class(&self, value: &Value) -> PlannerError {
        PlannerError::InvalidValueClass {
            expected: self.data_type,
            actual: value.type_name(),
        }
    }

    fn out_of_range(&self, value: &Value) -> PlannerError {
        PlannerError::OutOfRange {
            value: value.to_string(),
            target: self.data_type,
        }
    }
}

/// A candidate index over one table's columns, in index order.
#[derive(Debug, Clone)]
pub struct IndexDef {
    /// Index name (for explain output and selection logging).
    pub name: String,
    /// Indexed columns, leading column first.
    pub columns: Vec<Column>,
}

impl IndexDef {
    /// Creates an index definition.
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    /// Returns the position of `column` within this index, if indexed.
    pub fn position_of(&self, column: &Column) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }
}
