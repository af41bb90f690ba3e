use std::fmt;

use serde::{Deserialize, Serialize};

/// Body sent to the create endpoint. The original url doubles as the asset name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateAssetRequest {
    pub name: String,
    pub url: String,
}

impl CreateAssetRequest {
    pub fn from_url(url: &str) -> Self {
        Self {
            name: url.to_string(),
            url: url.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AssetHandle {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playback_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl AssetHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            playback_id: None,
            name: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AssetPhase {
    Waiting,
    Uploading,
    Processing,
    Ready,
    Failed,
    Other(String),
}

impl AssetPhase {
    /// `ready` and `failed` end polling; every other phase is polled again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AssetPhase::Ready | AssetPhase::Failed)
    }

    pub fn as_str(&self) -> &str {
        match self {
            AssetPhase::Waiting => "waiting",
            AssetPhase::Uploading => "uploading",
            AssetPhase::Processing => "processing",
            AssetPhase::Ready => "ready",
            AssetPhase::Failed => "failed",
            AssetPhase::Other(value) => value,
        }
    }
}

impl From<String> for AssetPhase {
    fn from(value: String) -> Self {
        match value.as_str() {
            "waiting" => AssetPhase::Waiting,
            "uploading" => AssetPhase::Uploading,
            "processing" => AssetPhase::Processing,
            "ready" => AssetPhase::Ready,
            "failed" => AssetPhase::Failed,
            _ => AssetPhase::Other(value),
        }
    }
}

impl From<&str> for AssetPhase {
    fn from(value: &str) -> Self {
        AssetPhase::from(value.to_string())
    }
}

impl From<AssetPhase> for String {
    fn from(phase: AssetPhase) -> Self {
        match phase {
            AssetPhase::Other(value) => value,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for AssetPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a remote asset as reported by a status query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AssetStatus {
    pub id: String,
    #[serde(default)]
    pub phase: Option<AssetPhase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl AssetStatus {
    pub fn new(id: impl Into<String>, phase: AssetPhase) -> Self {
        Self {
            id: id.into(),
            phase: Some(phase),
            error_message: None,
        }
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.as_ref().is_some_and(AssetPhase::is_terminal)
    }

    /// Error text, ignoring blank messages some backends send on success.
    pub fn non_empty_error(&self) -> Option<&str> {
        self.error_message
            .as_deref()
            .filter(|message| !message.is_empty())
    }
}
