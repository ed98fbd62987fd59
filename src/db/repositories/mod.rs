pub mod assignment;
pub mod catalog;
pub mod media_file;
pub mod movie;
pub mod scan;

use serde::{Serialize, de::DeserializeOwned};

/// Rows per multi-row INSERT, below SQLite's bound-parameter limit.
pub(crate) const INSERT_CHUNK: usize = 200;

/// Lists are stored as JSON text; unreadable values decode as empty.
pub(crate) fn decode_list<T: DeserializeOwned>(raw: &str) -> Vec<T> {
    serde_json::from_str(raw).unwrap_or_default()
}

pub(crate) fn decode_opt<T: DeserializeOwned>(raw: Option<&str>) -> Option<T> {
    raw.and_then(|s| serde_json::from_str(s).ok())
}

pub(crate) fn encode<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "[]".to_string())
}

pub(crate) fn encode_opt<T: Serialize>(value: Option<&T>) -> Option<String> {
    value.and_then(|v| serde_json::to_string(v).ok())
}

pub(crate) fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}
