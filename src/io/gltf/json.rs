//! Typed accessors over `serde_json::Value`, following the glTF conventions:
//! indices and counts are unsigned 32-bit integers, everything else numeric
//! is a 32-bit float.

use serde_json::Value;

/// A property is present but doesn't have the expected type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Invalid;

pub(crate) fn as_u32(value: &Value) -> Option<u32> {
    value.as_u64().and_then(|v| u32::try_from(v).ok())
}

/// Sizes, offsets and counts. These are 32-bit like indices, so byte
/// arithmetic on them stays in range.
pub(crate) fn as_usize(value: &Value) -> Option<usize> {
    as_u32(value).map(|v| v as usize)
}

pub(crate) fn as_f32(value: &Value) -> Option<f32> {
    value.as_f64().map(|v| v as f32)
}

pub(crate) fn as_bool(value: &Value) -> Option<bool> {
    value.as_bool()
}

pub(crate) fn as_str(value: &Value) -> Option<&str> {
    value.as_str()
}

pub(crate) fn as_u32_array(value: &Value) -> Option<Vec<u32>> {
    value.as_array()?.iter().map(as_u32).collect()
}

pub(crate) fn as_f32_array<const N: usize>(value: &Value) -> Option<[f32; N]> {
    let array = value.as_array()?;
    if array.len() != N {
        return None;
    }
    let mut out = [0.0; N];
    for (o, v) in out.iter_mut().zip(array) {
        *o = as_f32(v)?;
    }
    Some(out)
}

/// Looks up an optional property. Returns `Ok(None)` if it's absent and
/// `Err(Invalid)` if it's present but `parse` rejects it.
pub(crate) fn find<'a, T>(
    object: &'a Value,
    key: &str,
    parse: impl FnOnce(&'a Value) -> Option<T>,
) -> Result<Option<T>, Invalid> {
    match object.get(key) {
        None => Ok(None),
        Some(value) => parse(value).map(Some).ok_or(Invalid),
    }
}

/// Looks up a required property, `None` if it's absent or invalid.
pub(crate) fn get<'a, T>(
    object: &'a Value,
    key: &str,
    parse: impl FnOnce(&'a Value) -> Option<T>,
) -> Option<T> {
    object.get(key).and_then(parse)
}

/// JSON type of a value, as used in diagnostics.
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Scalar kind shared by all elements of an array. `None` for empty or
/// heterogeneous arrays.
pub(crate) fn common_array_type(array: &[Value]) -> Option<&'static str> {
    let first = type_name(array.first()?);
    array.iter().all(|v| type_name(v) == first).then_some(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_find() {
        let object = json!({"byteOffset": 16, "name": 3, "negative": -1, "huge": 5000000000u64});
        assert_eq!(find(&object, "byteOffset", as_u32), Ok(Some(16)));
        assert_eq!(find(&object, "byteStride", as_u32), Ok(None));
        assert_eq!(find(&object, "name", as_str), Err(Invalid));
        assert_eq!(find(&object, "negative", as_u32), Err(Invalid));
        assert_eq!(find(&object, "huge", as_u32), Err(Invalid));
        assert_eq!(find(&object, "huge", as_usize), Err(Invalid));
        assert_eq!(find(&object, "byteOffset", as_usize), Ok(Some(16)));
    }

    #[test]
    fn test_float_arrays() {
        assert_eq!(as_f32_array::<3>(&json!([1, 2.5, 3])), Some([1.0, 2.5, 3.0]));
        assert_eq!(as_f32_array::<3>(&json!([1, 2])), None);
        assert_eq!(as_f32_array::<2>(&json!([1, "a"])), None);
        assert_eq!(as_u32_array(&json!([0, 2, 1])), Some(vec![0, 2, 1]));
        assert_eq!(as_u32_array(&json!([0, -2])), None);
    }

    #[test]
    fn test_common_array_type() {
        assert_eq!(common_array_type(json!([1, 2.5]).as_array().unwrap()), Some("number"));
        assert_eq!(common_array_type(json!([1, "a"]).as_array().unwrap()), None);
        assert_eq!(common_array_type(json!([]).as_array().unwrap()), None);
    }
}
