//! Scalar cell values and the normalization rules used to compare them
//!
//! Datasets coming from a database driver and from an uploaded file rarely
//! agree on representation: `1750` vs `"1750.00"`, `2025-11-01` vs
//! `"2025-11-01 00:00:00"`, `NULL` vs `""`. The [`Normalizer`] maps every
//! [`Value`] onto a [`NormalizedValue`] so that such pairs compare equal,
//! while the original value is kept for display.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Strings treated as null when they are the whole (trimmed) cell
pub const DEFAULT_NULL_MARKERS: &[&str] = &["", "None", "null", "NULL", "nan", "NaN", "NaT", "<NA>"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// A single cell of a dataset row
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    String(String),
    /// Exact integer, as read from integer columns
    Integer(i128),
    Number(f64),
    /// Exact fixed-point number in its source spelling, e.g. `"1.50"`
    Decimal(String),
    Boolean(bool),
    DateTime(NaiveDateTime),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Render the value the way it is shown to the operator and exported
    pub fn display(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            Value::Number(n) if n.is_nan() => String::new(),
            Value::Number(n) => n.to_string(),
            Value::Integer(n) => n.to_string(),
            Value::Decimal(s) => s.clone(),
            Value::Boolean(b) => b.to_string(),
            Value::DateTime(dt) => format_datetime(dt),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n.into())
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(n.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Integer(n.into())
    }
}

impl From<i128> for Value {
    fn from(n: i128) -> Self {
        Value::Integer(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::DateTime(dt)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::DateTime(d.and_time(NaiveTime::MIN))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Canonical comparison form of a [`Value`]
///
/// Hashable, so it can be used inside composite match keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NormalizedValue {
    Null,
    Number(ExactNumber),
    Boolean(bool),
    DateTime(NaiveDateTime),
    Text(String),
}

/// Exact decimal `±digits × 10^exponent`
///
/// `digits` has no leading or trailing zeros and zero is the empty digit
/// string, so equal numbers have exactly one representation whatever their
/// spelling (`1750`, `1750.00`, `1.75e3`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExactNumber {
    negative: bool,
    digits: String,
    exponent: i64,
}

impl ExactNumber {
    fn zero() -> Self {
        Self {
            negative: false,
            digits: String::new(),
            exponent: 0,
        }
    }

    fn from_digits(negative: bool, digits: &str, exponent: i64) -> Option<Self> {
        let digits = digits.trim_start_matches('0');
        if digits.is_empty() {
            return Some(Self::zero());
        }
        let significant = digits.trim_end_matches('0');
        let exponent = exponent.checked_add((digits.len() - significant.len()) as i64)?;
        Some(Self {
            negative,
            digits: significant.to_string(),
            exponent,
        })
    }

    pub fn from_integer(n: i128) -> Self {
        if n == 0 {
            return Self::zero();
        }
        let digits = n.unsigned_abs().to_string();
        let significant = digits.trim_end_matches('0');
        Self {
            negative: n < 0,
            digits: significant.to_string(),
            exponent: (digits.len() - significant.len()) as i64,
        }
    }

    /// The shortest decimal that round-trips to `n`; `None` for NaN and infinities
    pub fn from_float(n: f64) -> Option<Self> {
        if !n.is_finite() {
            return None;
        }
        Self::parse(&format!("{:e}", n))
    }

    /// Parse `[+-]digits[.digits][(e|E)[+-]digits]`
    pub fn parse(s: &str) -> Option<Self> {
        let (negative, unsigned) = match s.as_bytes().first()? {
            b'-' => (true, &s[1..]),
            b'+' => (false, &s[1..]),
            _ => (false, s),
        };

        let (mantissa, exponent) = match unsigned.find(|c: char| c == 'e' || c == 'E') {
            Some(pos) => (&unsigned[..pos], unsigned[pos + 1..].parse::<i64>().ok()?),
            None => (unsigned, 0),
        };
        let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));

        if whole.is_empty() && fraction.is_empty() {
            return None;
        }
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(whole) || !all_digits(fraction) {
            return None;
        }

        let exponent = exponent.checked_sub(fraction.len() as i64)?;
        Self::from_digits(negative, &format!("{}{}", whole, fraction), exponent)
    }
}

/// Comparison policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Compare text cells ignoring case
    pub case_insensitive: bool,
    /// Whole-cell strings that mean "no value"
    pub null_markers: Vec<String>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            case_insensitive: false,
            null_markers: DEFAULT_NULL_MARKERS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Maps values onto their canonical comparison form
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    config: NormalizerConfig,
}

impl Normalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    pub fn normalize(&self, value: &Value) -> NormalizedValue {
        match value {
            Value::Null => NormalizedValue::Null,
            Value::Integer(n) => NormalizedValue::Number(ExactNumber::from_integer(*n)),
            Value::Number(n) => ExactNumber::from_float(*n)
                .map(NormalizedValue::Number)
                .unwrap_or(NormalizedValue::Null),
            Value::Decimal(s) => self.normalize_str(s),
            Value::Boolean(b) => NormalizedValue::Boolean(*b),
            Value::DateTime(dt) => NormalizedValue::DateTime(*dt),
            Value::String(s) => self.normalize_str(s),
        }
    }

    /// True iff both values have the same canonical form
    pub fn equals(&self, a: &Value, b: &Value) -> bool {
        self.normalize(a) == self.normalize(b)
    }

    fn normalize_str(&self, raw: &str) -> NormalizedValue {
        let trimmed = raw.trim();

        if self.config.null_markers.iter().any(|m| m == trimmed) {
            return NormalizedValue::Null;
        }

        if trimmed.eq_ignore_ascii_case("true") {
            return NormalizedValue::Boolean(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return NormalizedValue::Boolean(false);
        }

        if let Some(n) = ExactNumber::parse(trimmed) {
            return NormalizedValue::Number(n);
        }

        if let Some(dt) = parse_datetime(trimmed) {
            return NormalizedValue::DateTime(dt);
        }

        log::trace!("Comparing '{}' as raw text", trimmed);
        if self.config.case_insensitive {
            NormalizedValue::Text(trimmed.to_lowercase())
        } else {
            NormalizedValue::Text(trimmed.to_string())
        }
    }
}


/// Parse an ISO date or date-time; a bare date means midnight
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d.and_time(NaiveTime::MIN));
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

fn format_datetime(dt: &NaiveDateTime) -> String {
    if dt.time() == NaiveTime::MIN {
        dt.format("%Y-%m-%d").to_string()
    } else if dt.nanosecond() == 0 {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S%.f").to_string()
    }
}
