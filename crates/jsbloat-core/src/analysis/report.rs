use super::rollup::{EntityGroup, EntityRollup};
use super::waste::{WasteAggregator, WasteItem, exceeds};
use crate::Result;
use crate::coverage::{
    Bundle, CoverageSet, ScriptCoverage, ScriptDescriptor, ScriptRegistry, SummaryProvider,
    UnusedJsSummary,
};
use crate::entity::{Entity, EntityClassifier};
use crate::network::{NetworkRecord, NetworkRecords, TransferSizeEstimator};
use futures::{StreamExt, TryStreamExt, stream};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const DEFAULT_UNUSED_THRESHOLD: i64 = 20 * 1024;
pub const DEFAULT_BUNDLE_SOURCE_UNUSED_THRESHOLD: i64 = 512;

/// Thresholds and scheduling for one audit run.
///
/// Thresholds are compared against transfer-scaled bytes and are exclusive:
/// a script is reported only when its unused bytes are strictly above
/// `unused_threshold`. Any value is accepted, including negative ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuditOptions {
    pub unused_threshold: i64,
    pub bundle_source_unused_threshold: i64,
    /// Summary requests in flight at once; 1 processes scripts one by one
    pub concurrency: usize,
}

impl Default for AuditOptions {
    fn default() -> Self {
        Self {
            unused_threshold: DEFAULT_UNUSED_THRESHOLD,
            bundle_source_unused_threshold: DEFAULT_BUNDLE_SOURCE_UNUSED_THRESHOLD,
            concurrency: 1,
        }
    }
}

impl AuditOptions {
    pub fn with_unused_threshold(mut self, threshold: i64) -> Self {
        self.unused_threshold = threshold;
        self
    }

    pub fn with_bundle_source_unused_threshold(mut self, threshold: i64) -> Self {
        self.bundle_source_unused_threshold = threshold;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }
}

/// Collected page-load data the audit reads
#[derive(Debug, Clone, Copy)]
pub struct AuditInputs<'a> {
    pub coverage: &'a CoverageSet,
    pub scripts: &'a ScriptRegistry,
    pub network: &'a NetworkRecords,
    pub bundles: &'a [Bundle],
}

/// Services the audit delegates to
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub summaries: &'a dyn SummaryProvider,
    pub classifier: &'a dyn EntityClassifier,
    pub estimator: &'a dyn TransferSizeEstimator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Url,
    Bytes,
    Code,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubItemsHeading {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_type: Option<ValueType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnHeading {
    pub key: String,
    pub value_type: ValueType,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_items_heading: Option<SubItemsHeading>,
}

impl ColumnHeading {
    fn new(key: &str, value_type: ValueType, label: &str, sub_key: &str) -> Self {
        Self {
            key: key.to_string(),
            value_type,
            label: label.to_string(),
            sub_items_heading: Some(SubItemsHeading {
                key: sub_key.to_string(),
                value_type: None,
            }),
        }
    }
}

/// Column layout of the report table
pub fn headings() -> Vec<ColumnHeading> {
    let mut url = ColumnHeading::new("url", ValueType::Url, "URL", "source");
    if let Some(sub) = url.sub_items_heading.as_mut() {
        sub.value_type = Some(ValueType::Code);
    }

    vec![
        url,
        ColumnHeading::new("totalBytes", ValueType::Bytes, "Transfer Size", "sourceBytes"),
        ColumnHeading::new(
            "wastedBytes",
            ValueType::Bytes,
            "Potential Savings",
            "sourceWastedBytes",
        ),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnusedJsReport {
    /// Scripts over the threshold, in coverage order
    pub items: Vec<WasteItem>,
    /// Per-entity totals, in order of first appearance
    pub groups: Vec<EntityGroup>,
    pub headings: Vec<ColumnHeading>,
    pub overall_savings_bytes: u64,
}

/// A script whose coverage, descriptor and network record were all found
struct Candidate<'a> {
    coverage: &'a ScriptCoverage,
    script: &'a ScriptDescriptor,
    record: &'a NetworkRecord,
    bundle: Option<&'a Bundle>,
}

/// Builds the unused JavaScript report for one page load
pub struct UnusedJsAudit {
    options: AuditOptions,
}

impl UnusedJsAudit {
    pub fn new(options: AuditOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &AuditOptions {
        &self.options
    }

    /// Run the audit.
    ///
    /// Scripts without a descriptor, without a network record, or with no
    /// measurable waste are skipped. A failing summary request aborts the
    /// whole run.
    pub async fn run(
        &self,
        inputs: AuditInputs<'_>,
        collaborators: Collaborators<'_>,
    ) -> Result<UnusedJsReport> {
        tracing::debug!(
            "Auditing unused JavaScript across {} scripts",
            inputs.coverage.len()
        );

        let candidates = Self::resolve_candidates(&inputs);

        // `buffered` yields results in input order regardless of completion order
        let summaries: Vec<UnusedJsSummary> = stream::iter(&candidates)
            .map(|c| collaborators.summaries.summarize(c.coverage, c.bundle))
            .buffered(self.options.concurrency.max(1))
            .try_collect()
            .await?;

        let aggregator = WasteAggregator::new(
            collaborators.estimator,
            self.options.bundle_source_unused_threshold,
        );
        let mut items = Vec::new();
        let mut rollup = EntityRollup::new();

        for (candidate, summary) in candidates.iter().zip(&summaries) {
            let url = &candidate.script.url;
            if summary.wasted_bytes == 0 || summary.total_bytes == 0 {
                tracing::debug!("{}: no unused bytes measured", url);
                continue;
            }

            let classified = collaborators.classifier.classify(url);
            let item = aggregator.aggregate(
                url,
                summary,
                candidate.record,
                candidate.bundle,
                classified.as_ref().map(|e| e.name.as_str()),
            );

            if !exceeds(item.wasted_bytes, self.options.unused_threshold) {
                tracing::debug!(
                    "{}: {} unused bytes within threshold {}",
                    url,
                    item.wasted_bytes,
                    self.options.unused_threshold
                );
                continue;
            }

            let is_first_party = classified
                .as_ref()
                .is_some_and(|e| collaborators.classifier.is_first_party(e));
            rollup.add(Entity::from(classified), is_first_party, &item);
            items.push(item);
        }

        let overall_savings_bytes = items.iter().map(|i| i.wasted_bytes).sum();
        let groups = rollup.into_groups();

        tracing::info!(
            "Unused JavaScript: {} scripts over threshold across {} entities, {} bytes potential savings",
            items.len(),
            groups.len(),
            overall_savings_bytes
        );

        Ok(UnusedJsReport {
            items,
            groups,
            headings: headings(),
            overall_savings_bytes,
        })
    }

    fn resolve_candidates<'a>(inputs: &AuditInputs<'a>) -> Vec<Candidate<'a>> {
        let mut bundles: HashMap<&str, &Bundle> = HashMap::new();
        for bundle in inputs.bundles {
            bundles.entry(bundle.script_id.as_str()).or_insert(bundle);
        }

        inputs
            .coverage
            .iter()
            .filter_map(|coverage| {
                let Some(script) = inputs.scripts.get(&coverage.script_id) else {
                    tracing::debug!("No parsed script for coverage of {}", coverage.script_id);
                    return None;
                };
                let Some(record) = inputs.network.find_for_script(&script.url) else {
                    tracing::debug!("{}: no network record", script.url);
                    return None;
                };
                Some(Candidate {
                    coverage,
                    script,
                    record,
                    bundle: bundles.get(coverage.script_id.as_str()).copied(),
                })
            })
            .collect()
    }
}
