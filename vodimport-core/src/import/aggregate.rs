use tracing::warn;

use crate::asset::AssetPhase;

use super::models::{MediaResult, ResultSet, SettledItem};

const RESULT_KEYS: [&str; 4] = ["assetId", "success", "errorMessage", "seconds"];

pub fn build_result(settled: SettledItem) -> MediaResult {
    let SettledItem {
        status,
        mut source,
        elapsed,
        ..
    } = settled;

    for key in RESULT_KEYS {
        if source.extra.remove(key).is_some() {
            warn!(url = %source.url, key, "descriptor field shadows a result field, dropped");
        }
    }

    let error_message = status.non_empty_error().map(str::to_string);
    MediaResult {
        success: matches!(status.phase, Some(AssetPhase::Ready)),
        asset_id: status.id,
        error_message,
        seconds: elapsed.as_secs_f64(),
        source,
    }
}

/// Appends a settled batch to the cumulative set, in the order given.
pub fn append_batch(results: &mut ResultSet, batch: Vec<SettledItem>) {
    for settled in batch {
        results.push(build_result(settled));
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::Value;

    use super::*;
    use crate::asset::AssetStatus;
    use crate::import::models::MediaDescriptor;

    fn settled(status: AssetStatus, source: MediaDescriptor, millis: u64) -> SettledItem {
        SettledItem {
            index: 0,
            status,
            source,
            elapsed: Duration::from_millis(millis),
            attempts: 1,
        }
    }

    #[test]
    fn ready_asset_becomes_success() {
        let result = build_result(settled(
            AssetStatus::new("x", AssetPhase::Ready),
            MediaDescriptor::new("a").with_field("title", "A"),
            1500,
        ));
        assert_eq!(result.asset_id, "x");
        assert!(result.success);
        assert!(result.error_message.is_none());
        assert_eq!(result.seconds, 1.5);
        assert_eq!(result.source.url, "a");
        assert_eq!(result.source.extra["title"], Value::from("A"));
    }

    #[test]
    fn failed_asset_keeps_error_message() {
        let result = build_result(settled(
            AssetStatus::new("x", AssetPhase::Failed).with_error("transcode error"),
            MediaDescriptor::new("a"),
            250,
        ));
        assert!(!result.success);
        assert_eq!(result.error_message.as_deref(), Some("transcode error"));
    }

    #[test]
    fn ready_with_error_message_keeps_both() {
        let result = build_result(settled(
            AssetStatus::new("x", AssetPhase::Ready).with_error("partial renditions"),
            MediaDescriptor::new("a"),
            250,
        ));
        assert!(result.success);
        assert_eq!(result.error_message.as_deref(), Some("partial renditions"));
    }

    #[test]
    fn whitespace_error_message_is_recorded() {
        let result = build_result(settled(
            AssetStatus::new("x", AssetPhase::Failed).with_error("  "),
            MediaDescriptor::new("a"),
            250,
        ));
        assert_eq!(result.error_message.as_deref(), Some("  "));

        let result = build_result(settled(
            AssetStatus::new("x", AssetPhase::Failed).with_error(""),
            MediaDescriptor::new("a"),
            250,
        ));
        assert!(result.error_message.is_none());
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("errorMessage").is_none());
    }

    #[test]
    fn colliding_descriptor_fields_are_dropped() {
        let source = MediaDescriptor::new("a")
            .with_field("success", true)
            .with_field("seconds", 99)
            .with_field("title", "kept");
        let result = build_result(settled(
            AssetStatus::new("x", AssetPhase::Failed),
            source,
            100,
        ));
        assert!(!result.success);
        assert_eq!(result.source.extra.len(), 1);
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["title"], "kept");
    }

    #[test]
    fn append_keeps_given_order() {
        let mut results = ResultSet::new();
        append_batch(
            &mut results,
            vec![
                settled(AssetStatus::new("b", AssetPhase::Ready), MediaDescriptor::new("b"), 10),
                settled(AssetStatus::new("a", AssetPhase::Failed), MediaDescriptor::new("a"), 10),
            ],
        );
        let ids: Vec<_> = results.iter().map(|r| r.asset_id.as_str()).collect();
        assert_eq!(ids, ["b", "a"]);
        assert_eq!(results.succeeded(), 1);
        assert_eq!(results.failed(), 1);
    }
}
