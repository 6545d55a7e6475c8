use super::prefix::{common_prefix, trim_common_prefix};
use crate::coverage::{Bundle, UnusedJsSummary};
use crate::network::{NetworkRecord, ResourceType, TransferSizeEstimator};
use serde::{Deserialize, Serialize};

/// Most bundle sources listed under one script
pub const MAX_SUB_ITEMS: usize = 5;

/// One script row of the unused JavaScript report.
///
/// Byte figures are transfer sizes: the script's unused share of what
/// actually crossed the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WasteItem {
    pub url: String,
    pub total_bytes: u64,
    pub wasted_bytes: u64,
    pub wasted_percent: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_items: Vec<SubItem>,
}

/// Unused bytes of one original source inside a bundled script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubItem {
    pub source: String,
    /// `None` when the bundle has no size for the source
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_bytes: Option<u64>,
    pub source_wasted_bytes: u64,
}

/// Whether `bytes` is strictly above a threshold that may be negative
pub(crate) fn exceeds(bytes: u64, threshold: i64) -> bool {
    match u64::try_from(threshold) {
        Ok(threshold) => bytes > threshold,
        Err(_) => true,
    }
}

fn scale(bytes: u64, ratio: f64) -> u64 {
    (bytes as f64 * ratio).round() as u64
}

/// Turns one script's coverage summary into a transfer-scaled report row
pub struct WasteAggregator<'a> {
    estimator: &'a dyn TransferSizeEstimator,
    source_threshold: i64,
}

impl<'a> WasteAggregator<'a> {
    pub fn new(estimator: &'a dyn TransferSizeEstimator, source_threshold: i64) -> Self {
        Self {
            estimator,
            source_threshold,
        }
    }

    /// Build the row for a script. `summary.total_bytes` must be non-zero.
    pub fn aggregate(
        &self,
        url: &str,
        summary: &UnusedJsSummary,
        record: &NetworkRecord,
        bundle: Option<&Bundle>,
        entity: Option<&str>,
    ) -> WasteItem {
        debug_assert!(summary.total_bytes > 0);

        let transfer = self
            .estimator
            .estimate(Some(record), summary.total_bytes, ResourceType::Script);
        let transfer_ratio = transfer as f64 / summary.total_bytes as f64;

        tracing::debug!(
            "{}: transfer {} bytes for {} content bytes (ratio {:.3})",
            url,
            transfer,
            summary.total_bytes,
            transfer_ratio
        );

        WasteItem {
            url: url.to_string(),
            total_bytes: scale(summary.total_bytes, transfer_ratio),
            wasted_bytes: scale(summary.wasted_bytes, transfer_ratio),
            wasted_percent: summary.wasted_percent,
            entity: entity.map(str::to_string),
            sub_items: self.sub_items(url, summary, bundle, transfer_ratio),
        }
    }

    /// Largest unused bundle sources, scaled and filtered by the per-source
    /// threshold. Ties in unused bytes keep source path order.
    fn sub_items(
        &self,
        url: &str,
        summary: &UnusedJsSummary,
        bundle: Option<&Bundle>,
        transfer_ratio: f64,
    ) -> Vec<SubItem> {
        let Some(bundle) = bundle else {
            return Vec::new();
        };
        if bundle.sizes_failed() {
            tracing::warn!("{}: bundle sizes unavailable, skipping source breakdown", url);
            return Vec::new();
        }
        let Some(sources) = &summary.sources_wasted_bytes else {
            return Vec::new();
        };

        // Prefix over every mapped source, not only the listed ones
        let prefix = common_prefix(bundle.source_urls.iter().map(String::as_str));

        let mut ranked: Vec<(&String, u64)> = sources.iter().map(|(s, &w)| (s, w)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));

        ranked
            .into_iter()
            .take(MAX_SUB_ITEMS)
            .filter_map(|(source, wasted)| {
                let source_wasted_bytes = scale(wasted, transfer_ratio);
                if !exceeds(source_wasted_bytes, self.source_threshold) {
                    return None;
                }
                Some(SubItem {
                    source: trim_common_prefix(source, prefix),
                    source_bytes: bundle
                        .source_bytes(source)
                        .map(|bytes| scale(bytes, transfer_ratio)),
                    source_wasted_bytes,
                })
            })
            .collect()
    }
}
