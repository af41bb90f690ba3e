pub mod aggregate;
pub mod checkpoint;
pub mod error;
pub mod models;
pub mod observer;
pub mod poll;
pub mod scheduler;
pub mod upload;

pub use aggregate::{append_batch, build_result};
pub use checkpoint::{load_checkpoint, load_descriptors, render_checkpoint, CheckpointWriter};
pub use error::{ImportError, ImportResult};
pub use models::{
    InFlightItem, MediaDescriptor, MediaResult, ResultOrdering, ResultSet, SettledItem,
};
pub use observer::{
    CompositeObserver, ImportEvent, ImportMetrics, ImportObserver, MetricsObserver, NoopObserver,
    TracingObserver,
};
pub use poll::{poll_until_settled, PollPolicy, PollState};
pub use scheduler::{partition, resume_point, ImportOptions, ImportReport, Importer};
pub use upload::upload_batch;
