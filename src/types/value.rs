//! Host-typed values decoded from cell bytes.

use std::fmt;
use std::net::IpAddr;

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use uuid::Uuid;

/// A decoded host value.
///
/// `Display` renders the canonical string form used when a value becomes
/// part of a field name (map keys) or a text term. TIMEUUIDs render in a
/// time-ordered form so lexicographic order equals creation order.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Int(i32),
    BigInt(i64),
    VarInt(i128),
    Decimal(Decimal),
    Float(f32),
    Double(f64),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
    Uuid(Uuid),
    TimeUuid(Uuid),
    Inet(IpAddr),
    Blob(Vec<u8>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Integral view, when the value fits in an i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v as i64),
            Value::BigInt(v) => Some(*v),
            Value::VarInt(v) => i64::try_from(*v).ok(),
            Value::Timestamp(ts) => Some(ts.timestamp_millis()),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v as f64),
            Value::Double(v) => Some(*v),
            Value::Decimal(d) => d.to_f64(),
            other => other.as_i64().map(|v| v as f64),
        }
    }
}

/// Render a version-1 UUID so that byte-wise string order follows its
/// embedded timestamp.
///
/// Layout: `{time_hi:03x}{time_mid:04x}{time_low:08x}-{clock_seq:04x}-{node:012x}`.
/// The version nibble is dropped from `time_hi`; the variant bits are dropped
/// from the clock sequence. Every part is fixed width.
pub fn time_ordered_string(uuid: &Uuid) -> String {
    let (time_low, time_mid, time_hi_and_version, rest) = uuid.as_fields();
    let time_hi = time_hi_and_version & 0x0fff;
    let clock_seq = u16::from_be_bytes([rest[0], rest[1]]) & 0x3fff;
    let node = rest[2..]
        .iter()
        .fold(0u64, |acc, b| (acc << 8) | *b as u64);
    format!(
        "{:03x}{:04x}{:08x}-{:04x}-{:012x}",
        time_hi, time_mid, time_low, clock_seq, node
    )
}

fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2 + 2);
    out.push_str("0x");
    for b in bytes {
        out.push_str(&format!("{:02x}", b));
    }
    out
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Int(v) => write!(f, "{}", v),
            Value::BigInt(v) => write!(f, "{}", v),
            Value::VarInt(v) => write!(f, "{}", v),
            Value::Decimal(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::Boolean(v) => write!(f, "{}", v),
            Value::Timestamp(ts) => f.write_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Value::Uuid(u) => write!(f, "{}", u.hyphenated()),
            Value::TimeUuid(u) => f.write_str(&time_ordered_string(u)),
            Value::Inet(ip) => write!(f, "{}", ip),
            Value::Blob(b) => f.write_str(&hex(b)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time_uuid(timestamp: u64, clock: u16, node: u64) -> Uuid {
        let time_low = (timestamp & 0xffff_ffff) as u32;
        let time_mid = ((timestamp >> 32) & 0xffff) as u16;
        let time_hi = (((timestamp >> 48) & 0x0fff) as u16) | 0x1000;
        let clock = (clock & 0x3fff) | 0x8000;
        let mut rest = [0u8; 8];
        rest[0..2].copy_from_slice(&clock.to_be_bytes());
        rest[2..8].copy_from_slice(&node.to_be_bytes()[2..8]);
        Uuid::from_fields(time_low, time_mid, time_hi, &rest)
    }

    #[test]
    fn test_time_ordered_string_follows_timestamp() {
        // time_low differs in the high bits; canonical form would sort wrong.
        let earlier = time_uuid(0x0001_0000_ffff_ffff, 1, 0xabc);
        let later = time_uuid(0x0001_0001_0000_0000, 1, 0xabc);
        assert!(earlier.to_string() > later.to_string());
        assert!(time_ordered_string(&earlier) < time_ordered_string(&later));
    }

    #[test]
    fn test_time_ordered_string_is_fixed_width() {
        let a = time_uuid(1, 0, 0);
        let b = time_uuid(0x0fff_ffff_ffff_ffff, 0x3fff, 0xffff_ffff_ffff);
        assert_eq!(time_ordered_string(&a).len(), time_ordered_string(&b).len());
        assert_eq!(time_ordered_string(&a), "000000000000001-0000-000000000000");
    }

    #[test]
    fn test_display_canonical_forms() {
        assert_eq!(Value::Int(42).to_string(), "42");
        assert_eq!(Value::Text("size".into()).to_string(), "size");
        assert_eq!(Value::Boolean(true).to_string(), "true");
        assert_eq!(Value::Blob(vec![0xca, 0xfe]).to_string(), "0xcafe");
        let ts = DateTime::<Utc>::from_timestamp_millis(1_700_000_000_123).unwrap();
        assert_eq!(Value::Timestamp(ts).to_string(), "2023-11-14T22:13:20.123Z");
    }

    #[test]
    fn test_numeric_views() {
        assert_eq!(Value::Int(7).as_i64(), Some(7));
        assert_eq!(Value::VarInt(i128::MAX).as_i64(), None);
        assert_eq!(Value::Float(1.5).as_f64(), Some(1.5));
        assert_eq!(Value::Text("x".into()).as_f64(), None);
    }
}
