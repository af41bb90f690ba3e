use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::time::{Duration, Instant};

use crate::asset::{AssetHandle, AssetStatus};

/// One entry of the input file. Everything except `url` is carried through untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaDescriptor {
    pub url: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MediaDescriptor {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            extra: Map::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// How results of one batch are appended to the result set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultOrdering {
    /// In input order, regardless of which asset settled first.
    #[default]
    Input,
    /// In the order each asset reaches a terminal phase.
    Completion,
}

/// An asset that has been created remotely and still has to settle.
#[derive(Debug, Clone)]
pub struct InFlightItem {
    pub index: usize,
    pub handle: AssetHandle,
    pub source: MediaDescriptor,
    pub started_at: Instant,
}

/// Terminal status of an in-flight item, before it is merged into a result.
#[derive(Debug, Clone)]
pub struct SettledItem {
    pub index: usize,
    pub status: AssetStatus,
    pub source: MediaDescriptor,
    pub elapsed: Duration,
    pub attempts: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MediaResult {
    pub asset_id: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub seconds: f64,
    #[serde(flatten)]
    pub source: MediaDescriptor,
}

/// Cumulative, append-only list of results. This is what the checkpoint holds.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ResultSet {
    results: Vec<MediaResult>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, result: MediaResult) {
        self.results.push(result);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MediaResult> {
        self.results.iter()
    }

    pub fn as_slice(&self) -> &[MediaResult] {
        &self.results
    }

    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|result| result.success).count()
    }

    pub fn failed(&self) -> usize {
        self.len() - self.succeeded()
    }

    pub fn into_vec(self) -> Vec<MediaResult> {
        self.results
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a MediaResult;
    type IntoIter = std::slice::Iter<'a, MediaResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_keeps_pass_through_fields() {
        let raw = r#"{"url":"https://cdn/a.mp4","title":"A","tags":["x"],"duration":12.5}"#;
        let descriptor: MediaDescriptor = serde_json::from_str(raw).unwrap();
        assert_eq!(descriptor.url, "https://cdn/a.mp4");
        assert_eq!(descriptor.extra.len(), 3);
        assert_eq!(descriptor.extra["title"], Value::from("A"));
    }

    #[test]
    fn result_serializes_flat_with_camel_case_keys() {
        let result = MediaResult {
            asset_id: "x".into(),
            success: false,
            error_message: Some("transcode error".into()),
            seconds: 1.5,
            source: MediaDescriptor::new("a").with_field("title", "A"),
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["assetId"], "x");
        assert_eq!(value["success"], false);
        assert_eq!(value["errorMessage"], "transcode error");
        assert_eq!(value["seconds"], 1.5);
        assert_eq!(value["url"], "a");
        assert_eq!(value["title"], "A");

        let back: MediaResult = serde_json::from_value(value).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn absent_error_message_is_omitted() {
        let result = MediaResult {
            asset_id: "x".into(),
            success: true,
            error_message: None,
            seconds: 0.4,
            source: MediaDescriptor::new("a"),
        };
        let value = serde_json::to_value(&result).unwrap();
        assert!(value.get("errorMessage").is_none());
    }

    #[test]
    fn ordering_parses_from_snake_case() {
        let ordering: ResultOrdering = serde_json::from_str(r#""input""#).unwrap();
        assert_eq!(ordering, ResultOrdering::Input);
        assert_eq!(ResultOrdering::default(), ResultOrdering::Input);
    }
}
