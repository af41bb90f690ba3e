use futures::future::try_join_all;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::asset::{AssetClient, CreateAssetRequest};

use super::error::{ImportError, ImportResult};
use super::models::{InFlightItem, MediaDescriptor};

/// Creates one remote asset per descriptor, all at once.
///
/// Output order follows input order. The first failing creation aborts the
/// whole batch; assets already created for it are not recorded.
pub async fn upload_batch<C>(
    client: &C,
    batch: Vec<(usize, MediaDescriptor)>,
    cancel: &CancellationToken,
) -> ImportResult<Vec<InFlightItem>>
where
    C: AssetClient + ?Sized,
{
    let uploads = batch
        .into_iter()
        .map(|(index, source)| create_one(client, index, source, cancel));
    try_join_all(uploads).await
}

async fn create_one<C>(
    client: &C,
    index: usize,
    source: MediaDescriptor,
    cancel: &CancellationToken,
) -> ImportResult<InFlightItem>
where
    C: AssetClient + ?Sized,
{
    let request = CreateAssetRequest::from_url(&source.url);
    let started_at = Instant::now();
    let handle = tokio::select! {
        _ = cancel.cancelled() => return Err(ImportError::Cancelled),
        result = client.create_asset(&request) => result.map_err(|source_error| ImportError::Create {
            url: source.url.clone(),
            source: source_error,
        })?,
    };
    debug!(index, asset_id = %handle.id, url = %source.url, "asset created");
    Ok(InFlightItem {
        index,
        handle,
        source,
        started_at,
    })
}
