use thiserror::Error;

pub type AssetClientResult<T> = Result<T, AssetClientError>;

#[derive(Debug, Error)]
pub enum AssetClientError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid endpoint url: {0}")]
    Url(#[from] url::ParseError),
    #[error("api key variable {0} is not set")]
    MissingApiKey(String),
    #[error("asset api responded {status}: {body}")]
    Api { status: u16, body: String },
    #[error("unexpected response: {0}")]
    Unexpected(String),
}
