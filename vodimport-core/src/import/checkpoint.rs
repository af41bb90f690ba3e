use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use super::error::{ImportError, ImportResult};
use super::models::{MediaDescriptor, ResultSet};

/// Overwrites the checkpoint file with the full result set after every batch.
#[derive(Debug, Clone)]
pub struct CheckpointWriter {
    path: PathBuf,
}

impl CheckpointWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes to a sibling temp file, then renames it over the target.
    pub fn write(&self, results: &ResultSet) -> ImportResult<()> {
        let payload = render_checkpoint(results)?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let checkpoint_error = |source| ImportError::Checkpoint {
            path: self.path.clone(),
            source,
        };
        let mut file = NamedTempFile::new_in(&dir).map_err(checkpoint_error)?;
        file.write_all(payload.as_bytes()).map_err(checkpoint_error)?;
        file.as_file().sync_all().map_err(checkpoint_error)?;
        file.persist(&self.path)
            .map_err(|err| checkpoint_error(err.error))?;
        debug!(path = %self.path.display(), results = results.len(), bytes = payload.len(), "checkpoint persisted");
        Ok(())
    }
}

pub fn render_checkpoint(results: &ResultSet) -> ImportResult<String> {
    Ok(serde_json::to_string_pretty(results)?)
}

pub fn load_checkpoint(path: &Path) -> ImportResult<ResultSet> {
    read_json(path)
}

pub fn load_descriptors(path: &Path) -> ImportResult<Vec<MediaDescriptor>> {
    read_json(path)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> ImportResult<T> {
    let content = std::fs::read_to_string(path).map_err(|source| ImportError::Input {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ImportError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tempfile::TempDir;

    use super::*;
    use crate::asset::{AssetPhase, AssetStatus};
    use crate::import::aggregate::append_batch;
    use crate::import::models::SettledItem;

    fn sample_results() -> ResultSet {
        let mut results = ResultSet::new();
        append_batch(
            &mut results,
            vec![
                SettledItem {
                    index: 0,
                    status: AssetStatus::new("x", AssetPhase::Ready),
                    source: MediaDescriptor::new("a")
                        .with_field("title", "First")
                        .with_field("duration", 12.25),
                    elapsed: Duration::from_millis(1250),
                    attempts: 2,
                },
                SettledItem {
                    index: 1,
                    status: AssetStatus::new("y", AssetPhase::Failed).with_error("transcode error"),
                    source: MediaDescriptor::new("b").with_field("tags", vec!["music", "live"]),
                    elapsed: Duration::from_millis(500),
                    attempts: 3,
                },
            ],
        );
        results
    }

    #[test]
    fn written_checkpoint_reads_back_identically() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.json");
        let writer = CheckpointWriter::new(&path);
        let results = sample_results();
        writer.write(&results).unwrap();

        let first = std::fs::read_to_string(&path).unwrap();
        let loaded = load_checkpoint(&path).unwrap();
        assert_eq!(loaded, results);
        assert_eq!(render_checkpoint(&loaded).unwrap(), first);
    }

    #[test]
    fn checkpoint_is_pretty_json_array() {
        let rendered = render_checkpoint(&sample_results()).unwrap();
        assert!(rendered.starts_with("[\n  {"));
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
        assert_eq!(value[1]["errorMessage"], "transcode error");
    }

    #[test]
    fn overwrite_replaces_previous_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.json");
        let writer = CheckpointWriter::new(&path);
        writer.write(&sample_results()).unwrap();
        writer.write(&ResultSet::new()).unwrap();
        assert!(load_checkpoint(&path).unwrap().is_empty());
        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn unwritable_location_is_fatal() {
        let dir = TempDir::new().unwrap();
        let writer = CheckpointWriter::new(dir.path().join("missing/nested/results.json"));
        let err = writer.write(&sample_results()).unwrap_err();
        assert!(matches!(err, ImportError::Checkpoint { .. }));
    }

    #[test]
    fn descriptors_load_from_json_array() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("output.json");
        std::fs::write(&path, r#"[{"url":"a","title":"A"},{"url":"b"}]"#).unwrap();
        let descriptors = load_descriptors(&path).unwrap();
        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[0].extra["title"], "A");

        std::fs::write(&path, r#"{"url":"a"}"#).unwrap();
        assert!(matches!(
            load_descriptors(&path),
            Err(ImportError::Decode { .. })
        ));
    }
}
