use serde::de::{DeserializeOwned, Error};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Decodes `T` from a JSON object only. Derived structs otherwise also accept
/// arrays, filling fields by position.
pub fn from_object_slice<T: DeserializeOwned>(data: &[u8]) -> serde_json::Result<T> {
    serde_json::from_slice::<Map<String, Value>>(data)
        .and_then(|object| serde_json::from_value(Value::Object(object)))
}

/// `deserialize_with` counterpart of [`from_object_slice`] for nested structs.
pub fn object<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let object = Map::<String, Value>::deserialize(deserializer)?;
    serde_json::from_value(Value::Object(object)).map_err(D::Error::custom)
}

/// Like [`object`], with `null` decoding to `None`.
pub fn optional_object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Option::<Map<String, Value>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(object) => serde_json::from_value(Value::Object(object))
            .map(Some)
            .map_err(D::Error::custom),
    }
}
