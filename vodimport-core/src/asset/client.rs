use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::config::ApiSection;

use super::error::{AssetClientError, AssetClientResult};
use super::models::{AssetHandle, AssetPhase, AssetStatus, CreateAssetRequest};

/// Remote service that registers assets and reports their processing phase.
#[async_trait]
pub trait AssetClient: Send + Sync {
    async fn create_asset(&self, request: &CreateAssetRequest) -> AssetClientResult<AssetHandle>;

    async fn get_asset(&self, id: &str) -> AssetClientResult<AssetStatus>;
}

/// HTTP client for a Livepeer Studio compatible asset API.
#[derive(Debug, Clone)]
pub struct StudioAssetClient {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl StudioAssetClient {
    pub fn new(client: Client, base_url: &str, api_key: impl Into<String>) -> AssetClientResult<Self> {
        let base_url = normalize_base(base_url)?;
        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
        })
    }

    pub fn from_config(config: &ApiSection) -> AssetClientResult<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| AssetClientError::MissingApiKey(config.api_key_env.clone()))?;
        let client = Client::builder()
            .user_agent("vodimport/0.1")
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;
        Self::new(client, &config.base_url, api_key)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn create_endpoint(&self) -> AssetClientResult<Url> {
        Ok(self.base_url.join("asset/upload/url")?)
    }

    fn asset_endpoint(&self, id: &str) -> AssetClientResult<Url> {
        Ok(self.base_url.join(&format!("asset/{id}"))?)
    }
}

#[async_trait]
impl AssetClient for StudioAssetClient {
    async fn create_asset(&self, request: &CreateAssetRequest) -> AssetClientResult<AssetHandle> {
        let endpoint = self.create_endpoint()?;
        debug!(url = %request.url, endpoint = %endpoint, "requesting asset creation");
        let response = self
            .client
            .post(endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;
        let body = read_success(response).await?;
        let created: CreatedAssetResponse = serde_json::from_str(&body)?;
        Ok(created.asset)
    }

    async fn get_asset(&self, id: &str) -> AssetClientResult<AssetStatus> {
        let endpoint = self.asset_endpoint(id)?;
        let response = self
            .client
            .get(endpoint)
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        let body = read_success(response).await?;
        let asset: StudioAsset = serde_json::from_str(&body)?;
        Ok(asset.into())
    }
}

async fn read_success(response: Response) -> AssetClientResult<String> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(AssetClientError::Api {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

fn normalize_base(raw: &str) -> AssetClientResult<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AssetClientError::Unexpected("empty api base url".into()));
    }
    // Url::join drops the last segment unless the base ends with a slash.
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    Ok(Url::parse(&with_slash)?)
}

#[derive(Debug, Deserialize)]
struct CreatedAssetResponse {
    asset: AssetHandle,
}

#[derive(Debug, Deserialize)]
struct StudioAsset {
    id: String,
    #[serde(default)]
    status: Option<StudioAssetStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StudioAssetStatus {
    #[serde(default)]
    phase: Option<AssetPhase>,
    #[serde(default)]
    error_message: Option<String>,
}

impl From<StudioAsset> for AssetStatus {
    fn from(asset: StudioAsset) -> Self {
        let (phase, error_message) = match asset.status {
            Some(status) => (status.phase, status.error_message),
            None => (None, None),
        };
        AssetStatus {
            id: asset.id,
            phase,
            error_message,
        }
    }
}
