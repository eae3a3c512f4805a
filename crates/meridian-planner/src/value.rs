//! Typed SQL values.

#![allow(clippy::match_same_arms)]

use std::cmp::Ordering;
use std::fmt::{self, Display};

use bytes::Bytes;
use chrono::{DateTime, NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::compare::CompareMode;
use crate::schema::DataType;

/// A typed SQL value.
///
/// Represents values that can appear in comparison predicates, IN lists,
/// and subquery result rows.
///
/// Note: `Real` equality and ordering follow the IEEE 754 total order
/// (`f64::total_cmp`), so NaN equals itself and floats can serve as index
/// bound keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// SQL NULL.
    #[default]
    Null,

    // ===== Integer Types =====
    /// 8-bit signed integer (-128 to 127).
    TinyInt(i8),
    /// 16-bit signed integer (-32,768 to 32,767).
    SmallInt(i16),
    /// 32-bit signed integer (-2^31 to 2^31-1).
    Integer(i32),
    /// 64-bit signed integer (-2^63 to 2^63-1).
    BigInt(i64),

    // ===== Numeric Types =====
    /// 64-bit floating point (IEEE 754 double precision).
    Real(f64),
    /// Fixed-precision decimal (value in smallest units, scale).
    ///
    /// Stored as (i128, u8) where the second field is the scale.
    /// Example: Decimal(12345, 2) represents 123.45
    #[serde(skip)] // Complex serialization, handled separately
    Decimal(i128, u8),

    // ===== String Types =====
    /// UTF-8 text string, ordered by the active collation.
    Text(String),

    // ===== Binary Types =====
    /// Raw bytes (base64 encoded in JSON).
    #[serde(with = "bytes_base64")]
    Bytes(Bytes),

    // ===== Boolean Type =====
    /// Boolean value.
    Boolean(bool),

    // ===== Date/Time Types =====
    /// Date (days since Unix epoch).
    Date(i32),
    /// Time of day (nanoseconds within day).
    Time(i64),
    /// Timestamp (nanoseconds since Unix epoch).
    Timestamp(i64),
}

/// Borrowed identity view backing `PartialEq` and `Hash`.
///
/// Floats appear by bit pattern, so NaN equals itself and `+0.0` stays
/// distinct from `-0.0`, consistent with the total order.
#[derive(PartialEq, Eq, Hash)]
enum ValueKey<'a> {
    Null,
    TinyInt(i8),
    SmallInt(i16),
    Integer(i32),
    BigInt(i64),
    RealBits(u64),
    Decimal(i128, u8),
    Text(&'a str),
    Bytes(&'a [u8]),
    Boolean(bool),
    Date(i32),
    Time(i64),
    Timestamp(i64),
}

impl Value {
    fn key(&self) -> ValueKey<'_> {
        match self {
            Value::Null => ValueKey::Null,
            Value::TinyInt(v) => ValueKey::TinyInt(*v),
            Value::SmallInt(v) => ValueKey::SmallInt(*v),
            Value::Integer(v) => ValueKey::Integer(*v),
            Value::BigInt(v) => ValueKey::BigInt(*v),
            Value::Real(v) => ValueKey::RealBits(v.to_bits()),
            Value::Decimal(mantissa, scale) => ValueKey::Decimal(*mantissa, *scale),
            Value::Text(s) => ValueKey::Text(s),
            Value::Bytes(b) => ValueKey::Bytes(b),
            Value::Boolean(b) => ValueKey::Boolean(*b),
            Value::Date(d) => ValueKey::Date(*d),
            Value::Time(t) => ValueKey::Time(*t),
            Value::Timestamp(ts) => ValueKey::Timestamp(*ts),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Value {}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

/// Exact ordering for decimal mantissa/scale pairs, across scales.
pub(crate) fn compare_decimal(a: i128, a_scale: u8, b: i128, b_scale: u8) -> Ordering {
    match (
        Decimal::try_from_i128_with_scale(a, u32::from(a_scale)),
        Decimal::try_from_i128_with_scale(b, u32::from(b_scale)),
    ) {
        (Ok(da), Ok(db)) => da.cmp(&db),
        // Outside rust_decimal's 96-bit range: approximate, then break ties
        // on the raw representation to keep the order total.
        _ => {
            let fa = approx_f64(a, a_scale);
            let fb = approx_f64(b, b_scale);
            fa.total_cmp(&fb)
                .then_with(|| a.cmp(&b))
                .then_with(|| a_scale.cmp(&b_scale))
        }
    }
}

fn approx_f64(mantissa: i128, scale: u8) -> f64 {
    mantissa as f64 / 10f64.powi(i32::from(scale))
}

/// Renders a decimal mantissa/scale pair as plain digits.
pub(crate) fn decimal_text(mantissa: i128, scale: u8) -> String {
    if let Ok(d) = Decimal::try_from_i128_with_scale(mantissa, u32::from(scale)) {
        return d.to_string();
    }
    if scale == 0 {
        return mantissa.to_string();
    }
    let sign = if mantissa < 0 { "-" } else { "" };
    let abs = mantissa.unsigned_abs();
    let divisor = 10u128.pow(u32::from(scale));
    let int_part = abs / divisor;
    let frac_part = abs % divisor;
    format!("{sign}{int_part}.{frac_part:0width$}", width = scale as usize)
}

/// Days between 0001-01-01 (CE) and the Unix epoch.
const UNIX_EPOCH_CE_DAYS: i32 = 719_163;

fn date_text(days: i32) -> String {
    NaiveDate::from_num_days_from_ce_opt(days.saturating_add(UNIX_EPOCH_CE_DAYS))
        .map_or_else(|| days.to_string(), |d| d.to_string())
}

fn time_text(nanos: i64) -> String {
    let secs = nanos.div_euclid(1_000_000_000);
    let frac = nanos.rem_euclid(1_000_000_000) as u32;
    u32::try_from(secs)
        .ok()
        .and_then(|s| NaiveTime::from_num_seconds_from_midnight_opt(s, frac))
        .map_or_else(|| nanos.to_string(), |t| t.to_string())
}

fn timestamp_text(nanos: i64) -> String {
    DateTime::from_timestamp_nanos(nanos)
        .naive_utc()
        .format("%Y-%m-%d %H:%M:%S%.f")
        .to_string()
}

impl Value {
    /// Returns the data type of this value.
    ///
    /// Returns `None` for `Null` since it has no concrete type.
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Null => None,
            Value::TinyInt(_) => Some(DataType::TinyInt),
            Value::SmallInt(_) => Some(DataType::SmallInt),
            Value::Integer(_) => Some(DataType::Integer),
            Value::BigInt(_) => Some(DataType::BigInt),
            Value::Real(_) => Some(DataType::Real),
            Value::Decimal(_, scale) => Some(DataType::Decimal {
                precision: 38, // Max precision for i128
                scale: *scale,
            }),
            Value::Text(_) => Some(DataType::Text),
            Value::Bytes(_) => Some(DataType::Bytes),
            Value::Boolean(_) => Some(DataType::Boolean),
            Value::Date(_) => Some(DataType::Date),
            Value::Time(_) => Some(DataType::Time),
            Value::Timestamp(_) => Some(DataType::Timestamp),
        }
    }

    /// Returns a short name for the value's kind, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::TinyInt(_) => "TINYINT",
            Value::SmallInt(_) => "SMALLINT",
            Value::Integer(_) => "INTEGER",
            Value::BigInt(_) => "BIGINT",
            Value::Real(_) => "REAL",
            Value::Decimal(_, _) => "DECIMAL",
            Value::Text(_) => "TEXT",
            Value::Bytes(_) => "BYTES",
            Value::Boolean(_) => "BOOLEAN",
            Value::Date(_) => "DATE",
            Value::Time(_) => "TIME",
            Value::Timestamp(_) => "TIMESTAMP",
        }
    }

    /// Returns true if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the integer payload widened to i128, for any integer width.
    pub(crate) fn as_int_family(&self) -> Option<i128> {
        match self {
            Value::TinyInt(v) => Some(i128::from(*v)),
            Value::SmallInt(v) => Some(i128::from(*v)),
            Value::Integer(v) => Some(i128::from(*v)),
            Value::BigInt(v) => Some(i128::from(*v)),
            _ => None,
        }
    }

    /// Returns the value as an i64, if it is a `BigInt`.
    pub fn as_bigint(&self) -> Option<i64> {
        match self {
            Value::BigInt(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a string slice, if it is Text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as a bool, if it is Boolean.
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the value as bytes, if it is Bytes.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the value as an f64, if it is a `Real`.
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Real(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a `Decimal` (value, scale), if it is a `Decimal`.
    pub fn as_decimal(&self) -> Option<(i128, u8)> {
        match self {
            Value::Decimal(v, s) => Some((*v, *s)),
            _ => None,
        }
    }

    /// Rank used to order values of different type families.
    ///
    /// The cross-family order is stable but carries no SQL meaning; within
    /// the integer family all widths share one rank and compare numerically.
    fn family_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Boolean(_) => 1,
            Value::TinyInt(_) | Value::SmallInt(_) | Value::Integer(_) | Value::BigInt(_) => 2,
            Value::Decimal(_, _) => 3,
            Value::Real(_) => 4,
            Value::Text(_) => 5,
            Value::Bytes(_) => 6,
            Value::Date(_) => 7,
            Value::Time(_) => 8,
            Value::Timestamp(_) => 9,
        }
    }

    /// Orders two values under the given compare mode.
    ///
    /// Total order: NULL sorts first and equals NULL; values of one type
    /// family compare by their natural order (text per collation, bytes per
    /// the binary mode); different families order by a fixed rank.
    pub fn compare_in(&self, other: &Value, mode: &CompareMode) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Less,
            (_, Value::Null) => Ordering::Greater,
            (Value::Real(a), Value::Real(b)) => a.total_cmp(b),
            (Value::Decimal(av, asc), Value::Decimal(bv, bsc)) => {
                compare_decimal(*av, *asc, *bv, *bsc)
            }
            (Value::Text(a), Value::Text(b)) => mode.compare_text(a, b),
            (Value::Bytes(a), Value::Bytes(b)) => mode.compare_bytes(a, b),
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (Value::Time(a), Value::Time(b)) => a.cmp(b),
            (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
            (a, b) => match (a.as_int_family(), b.as_int_family()) {
                (Some(x), Some(y)) => x.cmp(&y),
                _ => a.family_rank().cmp(&b.family_rank()),
            },
        }
    }

    /// Renders this value as a SQL literal for explain output.
    pub fn sql(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::TinyInt(v) => v.to_string(),
            Value::SmallInt(v) => v.to_string(),
            Value::Integer(v) => v.to_string(),
            Value::BigInt(v) => v.to_string(),
            Value::Real(v) => format!("{v:?}"),
            Value::Decimal(val, scale) => decimal_text(*val, *scale),
            Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
            Value::Bytes(b) => {
                let hex: String = b.iter().map(|byte| format!("{byte:02X}")).collect();
                format!("X'{hex}'")
            }
            Value::Boolean(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            Value::Date(d) => format!("DATE '{}'", date_text(*d)),
            Value::Time(t) => format!("TIME '{}'", time_text(*t)),
            Value::Timestamp(ts) => format!("TIMESTAMP '{}'", timestamp_text(*ts)),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::TinyInt(v) => write!(f, "{v}"),
            Value::SmallInt(v) => write!(f, "{v}"),
            Value::Integer(v) => write!(f, "{v}"),
            Value::BigInt(v) => write!(f, "{v}"),
            Value::Real(v) => write!(f, "{v}"),
            Value::Decimal(val, scale) => write!(f, "{}", decimal_text(*val, *scale)),
            Value::Text(s) => write!(f, "'{s}'"),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Date(d) => write!(f, "{}", date_text(*d)),
            Value::Time(t) => write!(f, "{}", time_text(*t)),
            Value::Timestamp(ts) => write!(f, "{}", timestamp_text(*ts)),
        }
    }
}

impl From<i8> for Value {
    fn from(v: i8) -> Self {
        Value::TinyInt(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::SmallInt(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::BigInt(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<Bytes> for Value {
    fn from(b: Bytes) -> Self {
        Value::Bytes(b)
    }
}

/// Base64 transport encoding for the `Bytes` payload in JSON.
mod bytes_base64 {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(&encoded)
            .map(Bytes::from)
            .map_err(serde::de::Error::custom)
    }
}
