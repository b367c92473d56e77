//! Column validators: host type descriptors with their byte codecs.
//!
//! A validator is a tagged variant over native types and the collection and
//! composite wrappers. Cell values are decoded with `decode`, cell names and
//! keys are ordered with `compare`.

use std::cmp::Ordering;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex_lite::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::codec::composite;
use crate::error::{IndexError, Result};
use crate::types::value::Value;

/// Native (non-collection) host types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NativeType {
    Ascii,
    BigInt,
    Blob,
    Boolean,
    Counter,
    Decimal,
    Double,
    Float,
    Inet,
    Int,
    Text,
    Timestamp,
    TimeUuid,
    Uuid,
    Varchar,
    VarInt,
}

impl NativeType {
    pub fn cql_name(&self) -> &'static str {
        match self {
            NativeType::Ascii => "ascii",
            NativeType::BigInt => "bigint",
            NativeType::Blob => "blob",
            NativeType::Boolean => "boolean",
            NativeType::Counter => "counter",
            NativeType::Decimal => "decimal",
            NativeType::Double => "double",
            NativeType::Float => "float",
            NativeType::Inet => "inet",
            NativeType::Int => "int",
            NativeType::Text => "text",
            NativeType::Timestamp => "timestamp",
            NativeType::TimeUuid => "timeuuid",
            NativeType::Uuid => "uuid",
            NativeType::Varchar => "varchar",
            NativeType::VarInt => "varint",
        }
    }

    fn from_cql_name(name: &str) -> Option<Self> {
        let native = match name.to_ascii_lowercase().as_str() {
            "ascii" => NativeType::Ascii,
            "bigint" => NativeType::BigInt,
            "blob" => NativeType::Blob,
            "boolean" => NativeType::Boolean,
            "counter" => NativeType::Counter,
            "decimal" => NativeType::Decimal,
            "double" => NativeType::Double,
            "float" => NativeType::Float,
            "inet" => NativeType::Inet,
            "int" => NativeType::Int,
            "text" => NativeType::Text,
            "timestamp" => NativeType::Timestamp,
            "timeuuid" => NativeType::TimeUuid,
            "uuid" => NativeType::Uuid,
            "varchar" => NativeType::Varchar,
            "varint" => NativeType::VarInt,
            _ => return None,
        };
        Some(native)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value> {
        let fixed = |n: usize| -> Result<()> {
            if bytes.len() != n {
                return Err(IndexError::decoding(
                    self.cql_name(),
                    format!("expected {} bytes, got {}", n, bytes.len()),
                ));
            }
            Ok(())
        };

        let value = match self {
            NativeType::Int => {
                fixed(4)?;
                Value::Int(i32::from_be_bytes(bytes.try_into().unwrap()))
            }
            NativeType::BigInt | NativeType::Counter => {
                fixed(8)?;
                Value::BigInt(i64::from_be_bytes(bytes.try_into().unwrap()))
            }
            NativeType::VarInt => Value::VarInt(decode_varint(bytes, self.cql_name())?),
            NativeType::Decimal => {
                if bytes.len() < 5 {
                    return Err(IndexError::decoding("decimal", "too short for scale + unscaled"));
                }
                let scale = i32::from_be_bytes(bytes[0..4].try_into().unwrap());
                let unscaled = decode_varint(&bytes[4..], "decimal")?;
                Value::Decimal(decimal_from_parts(unscaled, scale)?)
            }
            NativeType::Float => {
                fixed(4)?;
                Value::Float(f32::from_be_bytes(bytes.try_into().unwrap()))
            }
            NativeType::Double => {
                fixed(8)?;
                Value::Double(f64::from_be_bytes(bytes.try_into().unwrap()))
            }
            NativeType::Boolean => {
                fixed(1)?;
                Value::Boolean(bytes[0] != 0)
            }
            NativeType::Timestamp => {
                fixed(8)?;
                let millis = i64::from_be_bytes(bytes.try_into().unwrap());
                let ts = DateTime::<Utc>::from_timestamp_millis(millis).ok_or_else(|| {
                    IndexError::decoding("timestamp", format!("out of range: {}", millis))
                })?;
                Value::Timestamp(ts)
            }
            NativeType::Uuid => {
                fixed(16)?;
                Value::Uuid(Uuid::from_slice(bytes).map_err(|e| IndexError::decoding("uuid", e.to_string()))?)
            }
            NativeType::TimeUuid => {
                fixed(16)?;
                let uuid = Uuid::from_slice(bytes)
                    .map_err(|e| IndexError::decoding("timeuuid", e.to_string()))?;
                if uuid.get_version_num() != 1 {
                    return Err(IndexError::decoding(
                        "timeuuid",
                        format!("version {} is not time-based", uuid.get_version_num()),
                    ));
                }
                Value::TimeUuid(uuid)
            }
            NativeType::Inet => match bytes.len() {
                4 => Value::Inet(IpAddr::V4(Ipv4Addr::from(<[u8; 4]>::try_from(bytes).unwrap()))),
                16 => Value::Inet(IpAddr::V6(Ipv6Addr::from(<[u8; 16]>::try_from(bytes).unwrap()))),
                n => return Err(IndexError::decoding("inet", format!("invalid address length {}", n))),
            },
            NativeType::Text | NativeType::Varchar => Value::Text(
                std::str::from_utf8(bytes)
                    .map_err(|e| IndexError::decoding(self.cql_name(), e.to_string()))?
                    .to_string(),
            ),
            NativeType::Ascii => {
                if !bytes.is_ascii() {
                    return Err(IndexError::decoding("ascii", "non-ASCII byte"));
                }
                Value::Text(String::from_utf8_lossy(bytes).into_owned())
            }
            NativeType::Blob => Value::Blob(bytes.to_vec()),
        };
        Ok(value)
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>> {
        let mismatch = || {
            IndexError::InvalidType(format!("cannot encode {:?} as {}", value, self.cql_name()))
        };
        let bytes = match (self, value) {
            (NativeType::Int, Value::Int(v)) => v.to_be_bytes().to_vec(),
            (NativeType::BigInt | NativeType::Counter, Value::BigInt(v)) => v.to_be_bytes().to_vec(),
            (NativeType::VarInt, Value::VarInt(v)) => encode_varint(*v),
            (NativeType::Decimal, Value::Decimal(d)) => {
                let mut out = (d.scale() as i32).to_be_bytes().to_vec();
                out.extend(encode_varint(d.mantissa()));
                out
            }
            (NativeType::Float, Value::Float(v)) => v.to_be_bytes().to_vec(),
            (NativeType::Double, Value::Double(v)) => v.to_be_bytes().to_vec(),
            (NativeType::Boolean, Value::Boolean(v)) => vec![*v as u8],
            (NativeType::Timestamp, Value::Timestamp(ts)) => ts.timestamp_millis().to_be_bytes().to_vec(),
            (NativeType::Uuid, Value::Uuid(u)) | (NativeType::TimeUuid, Value::TimeUuid(u)) => {
                u.as_bytes().to_vec()
            }
            (NativeType::Inet, Value::Inet(IpAddr::V4(ip))) => ip.octets().to_vec(),
            (NativeType::Inet, Value::Inet(IpAddr::V6(ip))) => ip.octets().to_vec(),
            (NativeType::Text | NativeType::Varchar, Value::Text(s)) => s.as_bytes().to_vec(),
            (NativeType::Ascii, Value::Text(s)) if s.is_ascii() => s.as_bytes().to_vec(),
            (NativeType::Blob, Value::Blob(b)) => b.clone(),
            _ => return Err(mismatch()),
        };
        Ok(bytes)
    }

    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        if a.is_empty() || b.is_empty() {
            return a.len().cmp(&b.len());
        }
        match self {
            NativeType::TimeUuid => match (self.decode(a), self.decode(b)) {
                (Ok(Value::TimeUuid(ua)), Ok(Value::TimeUuid(ub))) => time_ordered_key(&ua)
                    .cmp(&time_ordered_key(&ub))
                    .then_with(|| a.cmp(b)),
                _ => a.cmp(b),
            },
            NativeType::Float | NativeType::Double => match (self.decode(a), self.decode(b)) {
                (Ok(va), Ok(vb)) => match (va.as_f64(), vb.as_f64()) {
                    (Some(x), Some(y)) => x.total_cmp(&y),
                    _ => a.cmp(b),
                },
                _ => a.cmp(b),
            },
            NativeType::Decimal => match (self.decode(a), self.decode(b)) {
                (Ok(Value::Decimal(x)), Ok(Value::Decimal(y))) => x.cmp(&y),
                _ => a.cmp(b),
            },
            NativeType::Int
            | NativeType::BigInt
            | NativeType::Counter
            | NativeType::VarInt
            | NativeType::Timestamp => match (self.decode(a), self.decode(b)) {
                (Ok(va), Ok(vb)) => match (va, vb) {
                    (Value::VarInt(x), Value::VarInt(y)) => x.cmp(&y),
                    (va, vb) => va.as_i64().cmp(&vb.as_i64()),
                },
                _ => a.cmp(b),
            },
            _ => a.cmp(b),
        }
    }
}

fn time_ordered_key(uuid: &Uuid) -> u64 {
    let (time_low, time_mid, time_hi_and_version, _) = uuid.as_fields();
    ((time_hi_and_version as u64 & 0x0fff) << 48) | ((time_mid as u64) << 32) | time_low as u64
}

/// Big-endian two's complement, minimal length.
fn decode_varint(bytes: &[u8], validator: &str) -> Result<i128> {
    if bytes.is_empty() {
        return Err(IndexError::decoding(validator, "empty varint"));
    }
    if bytes.len() > 16 {
        return Err(IndexError::decoding(
            validator,
            format!("varint of {} bytes exceeds 128 bits", bytes.len()),
        ));
    }
    let fill = if bytes[0] & 0x80 != 0 { 0xff } else { 0x00 };
    let mut buf = [fill; 16];
    buf[16 - bytes.len()..].copy_from_slice(bytes);
    Ok(i128::from_be_bytes(buf))
}

fn encode_varint(v: i128) -> Vec<u8> {
    let bytes = v.to_be_bytes();
    let mut start = 0;
    // Drop redundant sign-extension bytes.
    while start < 15 {
        let (b, next) = (bytes[start], bytes[start + 1]);
        if (b == 0x00 && next & 0x80 == 0) || (b == 0xff && next & 0x80 != 0) {
            start += 1;
        } else {
            break;
        }
    }
    bytes[start..].to_vec()
}

fn decimal_from_parts(unscaled: i128, scale: i32) -> Result<Decimal> {
    if scale >= 0 {
        return Decimal::try_from_i128_with_scale(unscaled, scale as u32)
            .map_err(|e| IndexError::decoding("decimal", e.to_string()));
    }
    let factor = 10i128
        .checked_pow(scale.unsigned_abs())
        .and_then(|f| unscaled.checked_mul(f))
        .ok_or_else(|| IndexError::decoding("decimal", "negative scale overflows"))?;
    Decimal::try_from_i128_with_scale(factor, 0)
        .map_err(|e| IndexError::decoding("decimal", e.to_string()))
}

/// Host type descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Validator {
    Native(NativeType),
    Map(Box<Validator>, Box<Validator>),
    Set(Box<Validator>),
    List(Box<Validator>),
    Composite(Vec<Validator>),
}

impl Validator {
    pub fn native(t: NativeType) -> Self {
        Validator::Native(t)
    }

    pub fn map(key: Validator, value: Validator) -> Self {
        Validator::Map(Box::new(key), Box::new(value))
    }

    pub fn set(element: Validator) -> Self {
        Validator::Set(Box::new(element))
    }

    pub fn list(element: Validator) -> Self {
        Validator::List(Box::new(element))
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, Validator::Map(..) | Validator::Set(_) | Validator::List(_))
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, Validator::Composite(_))
    }

    pub fn as_native(&self) -> Option<NativeType> {
        match self {
            Validator::Native(t) => Some(*t),
            _ => None,
        }
    }

    /// Type of the collection element key held in the cell name: map key,
    /// set element, or the list index (a TIMEUUID).
    pub fn name_comparator(&self) -> &Validator {
        static LIST_INDEX: Validator = Validator::Native(NativeType::TimeUuid);
        match self {
            Validator::Map(k, _) => k,
            Validator::Set(e) => e,
            Validator::List(_) => &LIST_INDEX,
            other => other,
        }
    }

    /// Type of the collection value held in the cell value. Set cells carry
    /// no value; their element lives in the cell name.
    pub fn value_comparator(&self) -> &Validator {
        static EMPTY: Validator = Validator::Native(NativeType::Blob);
        match self {
            Validator::Map(_, v) => v,
            Validator::Set(_) => &EMPTY,
            Validator::List(e) => e,
            other => other,
        }
    }

    /// The validator whose type tag stands for the whole column: map value,
    /// set element, list element, or the validator itself for scalars.
    pub fn value_validator(&self) -> &Validator {
        match self {
            Validator::Map(_, v) => v,
            Validator::Set(e) | Validator::List(e) => e,
            other => other,
        }
    }

    /// Components of a composite, or a single-element slice otherwise.
    pub fn components(&self) -> &[Validator] {
        match self {
            Validator::Composite(c) => c,
            other => std::slice::from_ref(other),
        }
    }

    /// Decode cell bytes into a host value. Collections are decoded per
    /// element, so only native validators decode directly.
    pub fn decode(&self, bytes: &[u8]) -> Result<Value> {
        match self {
            Validator::Native(t) => t.decode(bytes),
            other => Err(IndexError::decoding(
                other,
                "only native values decode directly",
            )),
        }
    }

    pub fn encode(&self, value: &Value) -> Result<Vec<u8>> {
        match self {
            Validator::Native(t) => t.encode(value),
            other => Err(IndexError::InvalidType(format!(
                "cannot encode a single value as {}",
                other
            ))),
        }
    }

    pub fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        match self {
            Validator::Native(t) => t.compare(a, b),
            Validator::Composite(types) => composite::compare(types, a, b),
            _ => a.cmp(b),
        }
    }
}

impl fmt::Display for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Validator::Native(t) => f.write_str(t.cql_name()),
            Validator::Map(k, v) => write!(f, "map<{}, {}>", k, v),
            Validator::Set(e) => write!(f, "set<{}>", e),
            Validator::List(e) => write!(f, "list<{}>", e),
            Validator::Composite(types) => {
                f.write_str("composite(")?;
                for (i, t) in types.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", t)?;
                }
                f.write_str(")")
            }
        }
    }
}

fn parametrized() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?i)(map|set|list|frozen)\s*<\s*(.+)\s*>$").expect("static regex")
    })
}

/// Split type arguments on top-level commas.
fn split_args(args: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in args.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                out.push(args[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(args[start..].trim());
    out
}

impl FromStr for Validator {
    type Err = IndexError;

    /// Parse CQL type syntax: `int`, `set<text>`, `map<text, int>`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(caps) = parametrized().captures(s) {
            let kind = caps[1].to_ascii_lowercase();
            let args = split_args(&caps[2]);
            return match (kind.as_str(), args.as_slice()) {
                ("frozen", [inner]) => inner.parse(),
                ("set", [elem]) => Ok(Validator::set(elem.parse()?)),
                ("list", [elem]) => Ok(Validator::list(elem.parse()?)),
                ("map", [key, value]) => Ok(Validator::map(key.parse()?, value.parse()?)),
                _ => Err(IndexError::InvalidType(s.to_string())),
            };
        }
        NativeType::from_cql_name(s)
            .map(Validator::Native)
            .ok_or_else(|| IndexError::InvalidType(s.to_string()))
    }
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_parse_native_and_collections() {
        assert_eq!(Validator::from_str("int").unwrap(), Validator::Native(NativeType::Int));
        assert_eq!(Validator::from_str("TEXT").unwrap(), Validator::Native(NativeType::Text));
        assert_eq!(
            Validator::from_str("map<text, int>").unwrap(),
            Validator::map(Validator::Native(NativeType::Text), Validator::Native(NativeType::Int))
        );
        assert_eq!(
            Validator::from_str("set<frozen<list<int>>>").unwrap(),
            Validator::set(Validator::list(Validator::Native(NativeType::Int)))
        );
        assert!(Validator::from_str("tuple<int>").is_err());
        assert!(Validator::from_str("map<int>").is_err());
    }

    #[test]
    fn test_display_matches_parse() {
        let v = Validator::from_str("map<text,list<bigint>>").unwrap();
        assert_eq!(v.to_string(), "map<text, list<bigint>>");
        assert_eq!(Validator::from_str(&v.to_string()).unwrap(), v);
    }

    #[test]
    fn test_collection_comparators() {
        let map = Validator::from_str("map<text,int>").unwrap();
        assert_eq!(map.name_comparator(), &Validator::Native(NativeType::Text));
        assert_eq!(map.value_comparator(), &Validator::Native(NativeType::Int));
        assert_eq!(map.value_validator(), &Validator::Native(NativeType::Int));

        let set = Validator::from_str("set<text>").unwrap();
        assert_eq!(set.name_comparator(), &Validator::Native(NativeType::Text));
        assert_eq!(set.value_validator(), &Validator::Native(NativeType::Text));

        let list = Validator::from_str("list<double>").unwrap();
        assert_eq!(list.name_comparator(), &Validator::Native(NativeType::TimeUuid));
        assert_eq!(list.value_comparator(), &Validator::Native(NativeType::Double));
    }

    #[test]
    fn test_decode_natives() {
        let int = Validator::Native(NativeType::Int);
        assert_eq!(int.decode(&42i32.to_be_bytes()).unwrap(), Value::Int(42));
        assert!(int.decode(&[0, 1]).is_err());

        let text = Validator::Native(NativeType::Text);
        assert_eq!(text.decode(b"hom").unwrap(), Value::Text("hom".into()));
        assert!(text.decode(&[0xff, 0xfe]).is_err());

        let boolean = Validator::Native(NativeType::Boolean);
        assert_eq!(boolean.decode(&[1]).unwrap(), Value::Boolean(true));

        let ascii = Validator::Native(NativeType::Ascii);
        assert!(ascii.decode("é".as_bytes()).is_err());
    }

    #[test]
    fn test_varint_and_decimal() {
        let varint = Validator::Native(NativeType::VarInt);
        for v in [0i128, 1, -1, 127, 128, -128, -129, i64::MAX as i128 * 4] {
            let bytes = varint.encode(&Value::VarInt(v)).unwrap();
            assert_eq!(varint.decode(&bytes).unwrap(), Value::VarInt(v), "varint {}", v);
        }
        assert_eq!(encode_varint(128), vec![0x00, 0x80]);
        assert_eq!(encode_varint(-1), vec![0xff]);

        let decimal = Validator::Native(NativeType::Decimal);
        // 12.34 = unscaled 1234, scale 2
        let mut bytes = 2i32.to_be_bytes().to_vec();
        bytes.extend(encode_varint(1234));
        assert_eq!(
            decimal.decode(&bytes).unwrap(),
            Value::Decimal(Decimal::new(1234, 2))
        );

        // Negative scale: 5e3
        let mut bytes = (-3i32).to_be_bytes().to_vec();
        bytes.extend(encode_varint(5));
        assert_eq!(decimal.decode(&bytes).unwrap(), Value::Decimal(Decimal::new(5000, 0)));
    }

    #[test]
    fn test_timeuuid_requires_version_one() {
        let timeuuid = Validator::Native(NativeType::TimeUuid);
        let v4 = Uuid::from_bytes([0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x47, 0x77, 0x88, 0, 0, 0, 0, 0, 0, 1]);
        assert!(timeuuid.decode(v4.as_bytes()).is_err());

        let uuid = Validator::Native(NativeType::Uuid);
        assert_eq!(uuid.decode(v4.as_bytes()).unwrap(), Value::Uuid(v4));
    }

    #[test]
    fn test_compare_numeric_not_bytewise() {
        let int = Validator::Native(NativeType::Int);
        assert_eq!(int.compare(&(-1i32).to_be_bytes(), &1i32.to_be_bytes()), Ordering::Less);

        let double = Validator::Native(NativeType::Double);
        assert_eq!(
            double.compare(&(-2.5f64).to_be_bytes(), &0.5f64.to_be_bytes()),
            Ordering::Less
        );

        let text = Validator::Native(NativeType::Text);
        assert_eq!(text.compare(b"a", b"b"), Ordering::Less);
        assert_eq!(text.compare(b"", b"a"), Ordering::Less);
    }

    #[test]
    fn test_collections_do_not_decode_directly() {
        let set = Validator::from_str("set<text>").unwrap();
        assert!(matches!(set.decode(b"a"), Err(IndexError::DecodingMismatch { .. })));
    }
}
