//! Lenient decoding of registry payloads.
//!
//! Registries omit keys or send explicit `null`s liberally. Every record of this
//! crate therefore routes its fields through [`null_as_default`], so an absent or
//! null value becomes the declared default of the field instead of an error,
//! while a value of the wrong type is still rejected with the path of the
//! offending field.

use serde::{Deserialize, Deserializer};

use crate::errors::{RegistryError, Result};

/// Deserialize a field, replacing an explicit `null` by the field's default.
///
/// Use together with `#[serde(default)]` so that a missing key gets the same
/// treatment.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Decode a JSON payload, reporting the location of the first invalid value.
///
/// The location is dotted for object keys and bracket-indexed for sequence
/// elements, e.g. `.errors[2].detail.digest`.
pub fn from_slice<'de, T: Deserialize<'de>>(bytes: &'de [u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    let value = serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        let path = render_path(e.path());
        RegistryError::validation(path, e.into_inner())
    })?;
    deserializer
        .end()
        .map_err(|e| RegistryError::validation(".", e))?;
    Ok(value)
}

fn render_path(path: &serde_path_to_error::Path) -> String {
    let rendered = path.to_string();
    if rendered.starts_with('.') || rendered.starts_with('[') {
        rendered
    } else {
        format!(".{rendered}")
    }
}
