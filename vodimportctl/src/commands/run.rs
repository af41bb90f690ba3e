use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, ValueEnum};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use vodimport_core::import::{
    load_checkpoint, load_descriptors, resume_point, CompositeObserver, ImportMetrics,
    ImportOptions, ImportReport, Importer, MetricsObserver, ResultOrdering, ResultSet,
    TracingObserver,
};
use vodimport_core::StudioAssetClient;

use crate::{AppContext, AppError, DisplayFallback, Result};

/// Runs the batched import against the configured asset API.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Input file with media descriptors (overrides paths.input)
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Checkpoint/result file (overrides paths.checkpoint)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Items per batch (overrides batch.size)
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Result ordering inside a batch (overrides batch.ordering)
    #[arg(long, value_enum)]
    pub ordering: Option<OrderingArg>,

    /// Keep the existing checkpoint and skip the items it already covers
    #[arg(long)]
    pub resume: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OrderingArg {
    Completion,
    Input,
}

impl From<OrderingArg> for ResultOrdering {
    fn from(value: OrderingArg) -> Self {
        match value {
            OrderingArg::Completion => ResultOrdering::Completion,
            OrderingArg::Input => ResultOrdering::Input,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RunOutcome {
    pub report: ImportReport,
    pub metrics: ImportMetrics,
}

impl DisplayFallback for RunOutcome {
    fn display(&self) -> String {
        let report = &self.report;
        let mut lines = vec![format!(
            "Imported {} items in {} batches ({} ready, {} failed)",
            report.processed, report.batches, report.succeeded, report.failed
        )];
        if report.resumed > 0 {
            lines.push(format!("  - resumed after {} recorded items", report.resumed));
        }
        lines.push(format!(
            "  - checkpoint: {} ({} results)",
            report.checkpoint_path.display(),
            report.total
        ));
        lines.push(format!(
            "  - status polls: {} | mean settle time: {:.2} s",
            self.metrics.status_polls,
            self.metrics.mean_seconds()
        ));
        let elapsed = report.finished_at - report.started_at;
        lines.push(format!("  - wall time: {} s", elapsed.num_seconds()));
        lines.join("\n")
    }
}

pub fn build_options(context: &AppContext, args: &RunArgs) -> Result<ImportOptions> {
    let mut options = ImportOptions::from_config(context.config());
    options.checkpoint_path = context.checkpoint_path(args.output.as_ref());
    if let Some(size) = args.batch_size {
        if size == 0 {
            return Err(AppError::InvalidArgument(
                "--batch-size must be at least 1".to_string(),
            ));
        }
        options.batch_size = size;
    }
    if let Some(ordering) = args.ordering {
        options.ordering = ordering.into();
    }
    Ok(options)
}

pub fn execute(context: &AppContext, args: &RunArgs) -> Result<RunOutcome> {
    let options = build_options(context, args)?;
    let input = context.input_path(args.input.as_ref());
    let descriptors = load_descriptors(&input)?;
    info!(input = %input.display(), items = descriptors.len(), "descriptors loaded");

    let recorded = if args.resume && options.checkpoint_path.exists() {
        let recorded = load_checkpoint(&options.checkpoint_path)?;
        resume_point(&descriptors, &recorded)?;
        recorded
    } else {
        ResultSet::new()
    };

    let client = Arc::new(StudioAssetClient::from_config(&context.config().api)?);
    let metrics = Arc::new(MetricsObserver::new());
    let observer = CompositeObserver::new()
        .with(Arc::new(TracingObserver))
        .with(metrics.clone());
    let cancel = CancellationToken::new();
    let importer = Importer::new(client, options)
        .with_observer(Arc::new(observer))
        .with_cancellation(cancel.clone());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let report = runtime.block_on(async {
        let interrupt = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, cancelling import");
                cancel.cancel();
            }
        });
        let result = importer.run_from(descriptors, recorded).await;
        interrupt.abort();
        result
    })?;

    Ok(RunOutcome {
        report,
        metrics: metrics.snapshot(),
    })
}
