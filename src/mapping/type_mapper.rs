//! Host type → abstract field type.

use crate::mapping::properties::{Properties, PropertyType};
use crate::types::validator::{NativeType, Validator};

/// Field type tag for a native host type.
///
/// FLOAT maps to `decimal` and DOUBLE to `bigdecimal`; both are kept as the
/// host index has always reported them.
pub fn from_native(native: NativeType) -> PropertyType {
    match native {
        NativeType::Int => PropertyType::Integer,
        NativeType::VarInt | NativeType::BigInt | NativeType::Counter => PropertyType::Bigint,
        NativeType::Decimal | NativeType::Double => PropertyType::Bigdecimal,
        NativeType::Float => PropertyType::Decimal,
        NativeType::Text | NativeType::Ascii => PropertyType::Text,
        NativeType::Varchar | NativeType::Uuid | NativeType::TimeUuid => PropertyType::String,
        NativeType::Timestamp => PropertyType::Date,
        NativeType::Boolean => PropertyType::Bool,
        NativeType::Blob | NativeType::Inet => PropertyType::Text,
    }
}

/// Field type tag for any validator. Collections map their element (or map
/// value) type; anything without a native tag falls back to `text`.
pub fn from_validator(validator: &Validator) -> PropertyType {
    match validator {
        Validator::Native(t) => from_native(*t),
        Validator::Map(..) | Validator::Set(_) | Validator::List(_) => {
            match validator.value_validator() {
                Validator::Native(t) => from_native(*t),
                _ => PropertyType::Text,
            }
        }
        Validator::Composite(_) => PropertyType::Text,
    }
}

/// Fill `properties.field_type` from the validator unless the user set it.
pub fn set_from_validator(properties: &mut Properties, validator: &Validator) {
    if properties.field_type.is_some() {
        return;
    }
    properties.field_type = Some(from_validator(validator));
}
