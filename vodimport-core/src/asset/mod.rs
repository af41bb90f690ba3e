pub mod client;
pub mod error;
pub mod models;

pub use client::{AssetClient, StudioAssetClient};
pub use error::{AssetClientError, AssetClientResult};
pub use models::{AssetHandle, AssetPhase, AssetStatus, CreateAssetRequest};
