//! Type compatibility matrix.
//!
//! Which inferred JSON types may be coerced to which declared variable types.

use std::str::FromStr;

use crate::mapping::types::{DataType, JsonType};

/// Declared types a value of `json_type` may be published as.
pub fn allowed_data_types(json_type: JsonType) -> &'static [DataType] {
    match json_type {
        JsonType::String => &[DataType::String, DataType::Date],
        JsonType::Number => &[DataType::Number, DataType::String],
        JsonType::Boolean => &[DataType::Boolean, DataType::String],
        JsonType::Array => &[DataType::Array],
        JsonType::Object => &[DataType::Object],
        JsonType::Null => &[DataType::String, DataType::Number, DataType::Boolean],
    }
}

pub fn is_compatible(
    json_type: JsonType,
    data_type: DataType,
) -> bool {
    allowed_data_types(json_type).contains(&data_type)
}

/// String form of [`is_compatible`]; unknown type names are never compatible.
pub fn compatibility(
    json_type: &str,
    data_type: &str,
) -> bool {
    match (JsonType::from_str(json_type), DataType::from_str(data_type)) {
        (Ok(json_type), Ok(data_type)) => is_compatible(json_type, data_type),
        _ => false,
    }
}
