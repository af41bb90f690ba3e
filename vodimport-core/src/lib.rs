pub mod asset;
pub mod config;
pub mod error;
pub mod import;

pub use asset::{
    AssetClient, AssetClientError, AssetClientResult, AssetHandle, AssetPhase, AssetStatus,
    CreateAssetRequest, StudioAssetClient,
};
pub use config::{load_importer_config, ImporterConfig};
pub use error::{ConfigError, Result};
pub use import::{
    load_checkpoint, load_descriptors, ImportError, ImportEvent, ImportMetrics, ImportObserver,
    ImportOptions, ImportReport, ImportResult, Importer, MediaDescriptor, MediaResult,
    MetricsObserver, ResultOrdering, ResultSet, TracingObserver,
};
