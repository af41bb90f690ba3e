use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use vodimport_core::import::{load_checkpoint, ResultSet};

use crate::{AppContext, DisplayFallback, Result};

/// Summarizes the results recorded in a checkpoint.
#[derive(Args, Debug, Clone)]
pub struct SummaryArgs {
    /// Checkpoint file (overrides paths.checkpoint)
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct Summary {
    pub checkpoint: PathBuf,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub mean_seconds: Option<f64>,
    pub max_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FailureEntry>,
}

#[derive(Debug, Serialize)]
pub struct FailureEntry {
    pub asset_id: String,
    pub url: String,
    pub error_message: Option<String>,
}

impl Summary {
    pub fn from_results(checkpoint: PathBuf, results: &ResultSet) -> Self {
        let seconds: Vec<f64> = results.iter().map(|result| result.seconds).collect();
        let mean_seconds = if seconds.is_empty() {
            None
        } else {
            Some(seconds.iter().sum::<f64>() / seconds.len() as f64)
        };
        let max_seconds = seconds.iter().copied().reduce(f64::max);
        let failures = results
            .iter()
            .filter(|result| !result.success)
            .map(|result| FailureEntry {
                asset_id: result.asset_id.clone(),
                url: result.source.url.clone(),
                error_message: result.error_message.clone(),
            })
            .collect();
        Self {
            checkpoint,
            total: results.len(),
            succeeded: results.succeeded(),
            failed: results.failed(),
            mean_seconds,
            max_seconds,
            failures,
        }
    }
}

impl DisplayFallback for Summary {
    fn display(&self) -> String {
        let mut lines = vec![format!(
            "{}: {} results ({} ready, {} failed)",
            self.checkpoint.display(),
            self.total,
            self.succeeded,
            self.failed
        )];
        if let (Some(mean), Some(max)) = (self.mean_seconds, self.max_seconds) {
            lines.push(format!("  - settle time: mean {mean:.2} s, max {max:.2} s"));
        }
        if !self.failures.is_empty() {
            lines.push("Failures:".to_string());
            for failure in &self.failures {
                lines.push(format!(
                    "  - {} {} :: {}",
                    failure.asset_id,
                    failure.url,
                    failure.error_message.as_deref().unwrap_or("none")
                ));
            }
        }
        lines.join("\n")
    }
}

pub fn execute(context: &AppContext, args: &SummaryArgs) -> Result<Summary> {
    let path = context.checkpoint_path(args.output.as_ref());
    let results = load_checkpoint(&path)?;
    Ok(Summary::from_results(path, &results))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::test_support::prepare_context;

    #[test]
    fn summary_counts_outcomes() {
        let (temp, context) = prepare_context("UNUSED_KEY");
        fs::write(
            temp.path().join("results.json"),
            r#"[
                {"assetId":"x","success":true,"seconds":2.0,"url":"a","title":"A"},
                {"assetId":"y","success":false,"errorMessage":"transcode error","seconds":4.0,"url":"b"}
            ]"#,
        )
        .unwrap();

        let summary = execute(&context, &SummaryArgs { output: None }).unwrap();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.mean_seconds, Some(3.0));
        assert_eq!(summary.max_seconds, Some(4.0));
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].url, "b");
        assert!(summary.display().contains("transcode error"));
    }

    #[test]
    fn empty_checkpoint_has_no_timing() {
        let (temp, context) = prepare_context("UNUSED_KEY");
        fs::write(temp.path().join("results.json"), "[]").unwrap();
        let summary = execute(&context, &SummaryArgs { output: None }).unwrap();
        assert_eq!(summary.total, 0);
        assert!(summary.mean_seconds.is_none());
        assert!(summary.failures.is_empty());
    }
}
