// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Partition key literals

use fe_common::{DataType, FeError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Literal value of one partition key.
///
/// Values are totally ordered: NULL sorts first, then values of the same kind
/// by their natural order. Values of different kinds never share a column in
/// practice, so cross-kind order only needs to be stable.
///
/// Decimals compare numerically, so `1` (scale 0) equals `1.0` (scale 1)
/// while their string forms differ. Tables store decimal keys at the
/// column's scale (see [`PartitionValue::with_scale`]), which keeps equal
/// keys rendering the same partition name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PartitionValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Decimal { unscaled: i128, scale: u8 },
    String(String),
}

impl PartitionValue {
    pub fn is_null(&self) -> bool {
        matches!(self, PartitionValue::Null)
    }

    fn kind_rank(&self) -> u8 {
        match self {
            PartitionValue::Null => 0,
            PartitionValue::Boolean(_) => 1,
            PartitionValue::Integer(_) => 2,
            PartitionValue::Float(_) => 3,
            PartitionValue::Decimal { .. } => 4,
            PartitionValue::String(_) => 5,
        }
    }

    /// Hive string form of the value; NULL renders as `NULL`
    pub fn string_value(&self) -> String {
        match self {
            PartitionValue::Null => "NULL".to_string(),
            PartitionValue::Boolean(b) => b.to_string(),
            PartitionValue::Integer(i) => i.to_string(),
            PartitionValue::Float(f) => format!("{:?}", f),
            PartitionValue::Decimal { unscaled, scale } => format_decimal(*unscaled, *scale),
            PartitionValue::String(s) => s.clone(),
        }
    }

    /// String form used in partition directory names
    pub fn to_partition_key_string(&self, null_partition_key_value: &str) -> String {
        match self {
            PartitionValue::Null => null_partition_key_value.to_string(),
            _ => self.string_value(),
        }
    }

    /// The same decimal at `scale`; `None` if it cannot be represented
    /// exactly. Non-decimal values are returned unchanged.
    pub fn with_scale(&self, scale: u8) -> Option<Self> {
        let PartitionValue::Decimal {
            unscaled,
            scale: from,
        } = self
        else {
            return Some(self.clone());
        };
        let unscaled = if scale >= *from {
            unscaled.checked_mul(10i128.checked_pow((scale - from) as u32)?)?
        } else {
            let divisor = 10i128.checked_pow((from - scale) as u32)?;
            if unscaled % divisor != 0 {
                return None;
            }
            unscaled / divisor
        };
        Some(PartitionValue::Decimal { unscaled, scale })
    }

    /// Converts a partition directory value into a literal of the column type.
    pub fn parse(text: &str, data_type: &DataType, null_partition_key_value: &str) -> Result<Self> {
        if text == null_partition_key_value {
            return Ok(PartitionValue::Null);
        }
        let invalid = || {
            FeError::InvalidArgument(format!(
                "invalid partition key value '{}' for type {}",
                text, data_type
            ))
        };
        match data_type {
            DataType::Boolean => match text.to_lowercase().as_str() {
                "true" => Ok(PartitionValue::Boolean(true)),
                "false" => Ok(PartitionValue::Boolean(false)),
                _ => Err(invalid()),
            },
            DataType::TinyInt | DataType::SmallInt | DataType::Int | DataType::BigInt => {
                let value: i64 = text.trim().parse().map_err(|_| invalid())?;
                let (min, max) = match data_type {
                    DataType::TinyInt => (i8::MIN as i64, i8::MAX as i64),
                    DataType::SmallInt => (i16::MIN as i64, i16::MAX as i64),
                    DataType::Int => (i32::MIN as i64, i32::MAX as i64),
                    _ => (i64::MIN, i64::MAX),
                };
                if value < min || value > max {
                    return Err(invalid());
                }
                Ok(PartitionValue::Integer(value))
            }
            DataType::Float | DataType::Double => {
                let value: f64 = text.trim().parse().map_err(|_| invalid())?;
                Ok(PartitionValue::Float(value))
            }
            DataType::Decimal { scale, .. } => {
                let unscaled = parse_decimal(text.trim(), *scale).ok_or_else(invalid)?;
                Ok(PartitionValue::Decimal {
                    unscaled,
                    scale: *scale,
                })
            }
            DataType::String | DataType::Varchar { .. } | DataType::Char { .. } => {
                Ok(PartitionValue::String(text.to_string()))
            }
            other => Err(FeError::NotSupported(format!(
                "partition key of type {}",
                other
            ))),
        }
    }
}

fn format_decimal(unscaled: i128, scale: u8) -> String {
    if scale == 0 {
        return unscaled.to_string();
    }
    let sign = if unscaled < 0 { "-" } else { "" };
    let digits = unscaled.unsigned_abs().to_string();
    let scale = scale as usize;
    let padded = if digits.len() <= scale {
        format!("{}{}", "0".repeat(scale + 1 - digits.len()), digits)
    } else {
        digits
    };
    let (int_part, frac_part) = padded.split_at(padded.len() - scale);
    format!("{}{}.{}", sign, int_part, frac_part)
}

fn parse_decimal(text: &str, scale: u8) -> Option<i128> {
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (int_part, frac_part) = match body.split_once('.') {
        Some((i, f)) => (i, f),
        None => (body, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if frac_part.len() > scale as usize {
        return None;
    }
    if !int_part.chars().chain(frac_part.chars()).all(|c| c.is_ascii_digit()) {
        return None;
    }
    let mut digits = String::with_capacity(int_part.len() + scale as usize);
    digits.push_str(int_part);
    digits.push_str(frac_part);
    for _ in frac_part.len()..scale as usize {
        digits.push('0');
    }
    let magnitude: i128 = if digits.is_empty() { 0 } else { digits.parse().ok()? };
    Some(if negative { -magnitude } else { magnitude })
}

fn compare_decimal(a: i128, a_scale: u8, b: i128, b_scale: u8) -> Ordering {
    if a_scale == b_scale {
        return a.cmp(&b);
    }
    let rescale = |v: i128, by: u8| 10i128.checked_pow(by as u32).and_then(|m| v.checked_mul(m));
    let (lhs, rhs) = if a_scale < b_scale {
        (rescale(a, b_scale - a_scale), Some(b))
    } else {
        (Some(a), rescale(b, a_scale - b_scale))
    };
    match (lhs, rhs) {
        (Some(l), Some(r)) => l.cmp(&r),
        _ => {
            let l = a as f64 / 10f64.powi(a_scale as i32);
            let r = b as f64 / 10f64.powi(b_scale as i32);
            l.total_cmp(&r)
        }
    }
}

impl Ord for PartitionValue {
    fn cmp(&self, other: &Self) -> Ordering {
        use PartitionValue::*;
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Boolean(a), Boolean(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (
                Decimal {
                    unscaled: a,
                    scale: sa,
                },
                Decimal {
                    unscaled: b,
                    scale: sb,
                },
            ) => compare_decimal(*a, *sa, *b, *sb),
            (String(a), String(b)) => a.cmp(b),
            _ => self.kind_rank().cmp(&other.kind_rank()),
        }
    }
}

impl PartialOrd for PartitionValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for PartitionValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PartitionValue {}

impl fmt::Display for PartitionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartitionValue::String(s) => write!(f, "'{}'", s),
            other => write!(f, "{}", other.string_value()),
        }
    }
}

impl From<i64> for PartitionValue {
    fn from(value: i64) -> Self {
        PartitionValue::Integer(value)
    }
}

impl From<i32> for PartitionValue {
    fn from(value: i32) -> Self {
        PartitionValue::Integer(value as i64)
    }
}

impl From<&str> for PartitionValue {
    fn from(value: &str) -> Self {
        PartitionValue::String(value.to_string())
    }
}

impl From<bool> for PartitionValue {
    fn from(value: bool) -> Self {
        PartitionValue::Boolean(value)
    }
}
