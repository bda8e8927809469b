//! Serde helpers for path-aware deserialization of inbound payloads.
//!
//! Node payloads are nested several levels deep, so a bare `serde_json` error
//! ("invalid type: null, expected a string") does not say which field was bad.
//! These helpers report the JSON path of the failure as well.

use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Deserialization failure with the path to the offending field.
#[derive(Debug)]
pub(crate) struct PathError {
    path: String,
    inner: serde_json::Error,
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() || self.path == "." {
            write!(f, "{}", self.inner)
        } else {
            write!(f, "{} at `{}`", self.inner, self.path)
        }
    }
}

impl std::error::Error for PathError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.inner)
    }
}

/// Deserialize `value` into `T`, keeping track of where a failure occurred.
pub(crate) fn from_value_with_path<T: DeserializeOwned>(value: Value) -> Result<T, PathError> {
    #[cfg(feature = "tracing")]
    tracing::trace!(
        type_name = %std::any::type_name::<T>(),
        json = %value,
        "deserializing JSON"
    );

    serde_path_to_error::deserialize(value).map_err(|e| PathError {
        path: e.path().to_string(),
        inner: e.into_inner(),
    })
}
