use super::bundle::{Bundle, BundleSizes, SourceSpan, UNMAPPED_SOURCE};
use super::types::{ScriptCoverage, ScriptRegistry};
use crate::cache::RequestCache;
use crate::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Unused bytes of one script, before any transfer-size scaling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnusedJsSummary {
    pub script_id: String,
    pub total_bytes: u64,
    pub wasted_bytes: u64,
    pub wasted_percent: f64,
    /// Unused bytes per bundle source, when a bundle with sizes was available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources_wasted_bytes: Option<BTreeMap<String, u64>>,
}

/// Produces the unused-bytes summary of a script.
///
/// Implementations may fail on malformed input; callers treat that as fatal
/// for the whole report.
#[async_trait]
pub trait SummaryProvider: Send + Sync {
    async fn summarize(
        &self,
        coverage: &ScriptCoverage,
        bundle: Option<&Bundle>,
    ) -> Result<UnusedJsSummary>;
}

/// Computes summaries directly from profiler coverage ranges.
///
/// A byte is unused when any zero-count range covers it. The script length is
/// the largest range end offset.
#[derive(Debug, Default)]
pub struct CoverageSummaryProvider {
    registry: Option<ScriptRegistry>,
}

impl CoverageSummaryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check coverage ranges against the lengths of parsed scripts
    pub fn with_registry(mut self, registry: ScriptRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    fn declared_length(&self, script_id: &str) -> Option<u64> {
        self.registry
            .as_ref()
            .and_then(|r| r.get(script_id))
            .and_then(|s| s.length)
    }
}

#[async_trait]
impl SummaryProvider for CoverageSummaryProvider {
    async fn summarize(
        &self,
        coverage: &ScriptCoverage,
        bundle: Option<&Bundle>,
    ) -> Result<UnusedJsSummary> {
        let waste = UnusedRanges::from_coverage(coverage, self.declared_length(&coverage.script_id))?;

        let total_bytes = waste.content_length;
        let wasted_bytes = waste.unused_bytes();
        let wasted_percent = if total_bytes == 0 {
            0.0
        } else {
            wasted_bytes as f64 / total_bytes as f64 * 100.0
        };

        let sources_wasted_bytes = match bundle {
            Some(bundle) if matches!(bundle.sizes, BundleSizes::Computed { .. }) => {
                Some(waste.attribute_to_sources(bundle))
            }
            _ => None,
        };

        tracing::debug!(
            "Script {}: {} of {} bytes unused",
            coverage.script_id,
            wasted_bytes,
            total_bytes
        );

        Ok(UnusedJsSummary {
            script_id: coverage.script_id.clone(),
            total_bytes,
            wasted_bytes,
            wasted_percent,
            sources_wasted_bytes,
        })
    }
}

/// Sorted, disjoint byte intervals `[start, end)` that never executed
struct UnusedRanges {
    content_length: u64,
    intervals: Vec<(u64, u64)>,
}

impl UnusedRanges {
    fn from_coverage(coverage: &ScriptCoverage, declared_length: Option<u64>) -> Result<Self> {
        let malformed = |reason: String| Error::MalformedCoverage {
            script_id: coverage.script_id.clone(),
            reason,
        };

        let mut content_length = 0;
        let mut unused = Vec::new();

        for function in &coverage.functions {
            for range in &function.ranges {
                if range.start_offset > range.end_offset {
                    return Err(malformed(format!(
                        "range {}..{} in function '{}' ends before it starts",
                        range.start_offset, range.end_offset, function.function_name
                    )));
                }
                content_length = content_length.max(range.end_offset);
                if range.count == 0 && range.start_offset < range.end_offset {
                    unused.push((range.start_offset, range.end_offset));
                }
            }
        }

        if let Some(length) = declared_length
            && content_length > length
        {
            return Err(malformed(format!(
                "coverage ends at byte {} but the script is {} bytes long",
                content_length, length
            )));
        }

        unused.sort_unstable();
        let mut intervals: Vec<(u64, u64)> = Vec::with_capacity(unused.len());
        for (start, end) in unused {
            match intervals.last_mut() {
                Some(last) if start <= last.1 => last.1 = last.1.max(end),
                _ => intervals.push((start, end)),
            }
        }

        Ok(Self {
            content_length,
            intervals,
        })
    }

    fn unused_bytes(&self) -> u64 {
        self.intervals.iter().map(|(start, end)| end - start).sum()
    }

    /// Unused bytes within `[start, end)`
    fn unused_within(&self, start: u64, end: u64) -> u64 {
        let first = self.intervals.partition_point(|&(_, e)| e <= start);
        self.intervals[first..]
            .iter()
            .take_while(|&&(s, _)| s < end)
            .map(|&(s, e)| e.min(end).saturating_sub(s.max(start)))
            .sum()
    }

    fn attribute_to_sources(&self, bundle: &Bundle) -> BTreeMap<String, u64> {
        let mut sources = BTreeMap::new();
        for span in &bundle.spans {
            let unused = self.unused_within(span.start_offset, span.end_offset);
            if unused == 0 {
                continue;
            }
            let key = span.source.as_deref().unwrap_or(UNMAPPED_SOURCE);
            *sources.entry(key.to_string()).or_insert(0) += unused;
        }
        sources
    }
}

/// The parts of a bundle a summary depends on
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct BundleKey {
    sizes_computed: bool,
    spans: Vec<SourceSpan>,
}

/// Everything a summary is computed from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SummaryKey {
    coverage: ScriptCoverage,
    bundle: Option<BundleKey>,
}

impl SummaryKey {
    fn new(coverage: &ScriptCoverage, bundle: Option<&Bundle>) -> Self {
        Self {
            coverage: coverage.clone(),
            bundle: bundle.map(|b| BundleKey {
                sizes_computed: !b.sizes_failed(),
                spans: b.spans.clone(),
            }),
        }
    }
}

/// Memoizes another provider's summaries per coverage and bundle input
pub struct CachedSummaryProvider<P> {
    inner: P,
    cache: RequestCache<SummaryKey, UnusedJsSummary>,
}

impl<P: SummaryProvider> CachedSummaryProvider<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            cache: RequestCache::new("UnusedJsSummary"),
        }
    }

    pub async fn cached(&self) -> usize {
        self.cache.len().await
    }
}

#[async_trait]
impl<P: SummaryProvider> SummaryProvider for CachedSummaryProvider<P> {
    async fn summarize(
        &self,
        coverage: &ScriptCoverage,
        bundle: Option<&Bundle>,
    ) -> Result<UnusedJsSummary> {
        self.cache
            .get_or_try_compute(SummaryKey::new(coverage, bundle), || {
                self.inner.summarize(coverage, bundle)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::{CoverageRange, FunctionCoverage, ScriptDescriptor};
    use std::collections::HashMap;

    fn range(start: u64, end: u64, count: u64) -> CoverageRange {
        CoverageRange {
            start_offset: start,
            end_offset: end,
            count,
        }
    }

    fn coverage(ranges: Vec<Vec<CoverageRange>>) -> ScriptCoverage {
        ScriptCoverage {
            script_id: "1".to_string(),
            url: "https://a.com/app.js".to_string(),
            functions: ranges
                .into_iter()
                .map(|ranges| FunctionCoverage {
                    function_name: String::new(),
                    ranges,
                    is_block_coverage: true,
                })
                .collect(),
        }
    }

    fn bundle(spans: Vec<SourceSpan>) -> Bundle {
        Bundle {
            script_id: "1".to_string(),
            source_urls: vec!["a.js".to_string(), "b.js".to_string()],
            sizes: BundleSizes::Computed {
                files: HashMap::from([("a.js".to_string(), 40), ("b.js".to_string(), 50)]),
                unmapped_bytes: 10,
                total_bytes: 100,
            },
            spans,
        }
    }

    fn span(start: u64, end: u64, source: Option<&str>) -> SourceSpan {
        SourceSpan {
            start_offset: start,
            end_offset: end,
            source: source.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_nested_unused_blocks() {
        // Top-level script runs, one function never called, one block skipped
        let cov = coverage(vec![
            vec![range(0, 100, 1)],
            vec![range(10, 30, 0)],
            vec![range(40, 80, 1), range(50, 60, 0)],
        ]);

        let summary = CoverageSummaryProvider::new()
            .summarize(&cov, None)
            .await
            .unwrap();

        assert_eq!(summary.total_bytes, 100);
        assert_eq!(summary.wasted_bytes, 30);
        assert!((summary.wasted_percent - 30.0).abs() < f64::EPSILON);
        assert!(summary.sources_wasted_bytes.is_none());
    }

    #[tokio::test]
    async fn test_overlapping_unused_ranges_counted_once() {
        let cov = coverage(vec![vec![range(0, 50, 0), range(20, 40, 0)], vec![range(45, 60, 0)]]);

        let summary = CoverageSummaryProvider::new()
            .summarize(&cov, None)
            .await
            .unwrap();

        assert_eq!(summary.total_bytes, 60);
        assert_eq!(summary.wasted_bytes, 60);
    }

    #[tokio::test]
    async fn test_empty_coverage() {
        let summary = CoverageSummaryProvider::new()
            .summarize(&coverage(vec![]), None)
            .await
            .unwrap();

        assert_eq!(summary.total_bytes, 0);
        assert_eq!(summary.wasted_bytes, 0);
        assert_eq!(summary.wasted_percent, 0.0);
    }

    #[tokio::test]
    async fn test_attributes_unused_bytes_to_sources() {
        let cov = coverage(vec![vec![range(0, 100, 1), range(30, 70, 0), range(95, 100, 0)]]);
        let bundle = bundle(vec![
            span(0, 40, Some("a.js")),
            span(40, 90, Some("b.js")),
            span(90, 100, None),
        ]);

        let summary = CoverageSummaryProvider::new()
            .summarize(&cov, Some(&bundle))
            .await
            .unwrap();

        let sources = summary.sources_wasted_bytes.unwrap();
        assert_eq!(sources.get("a.js"), Some(&10));
        assert_eq!(sources.get("b.js"), Some(&30));
        assert_eq!(sources.get(UNMAPPED_SOURCE), Some(&5));
    }

    #[tokio::test]
    async fn test_failed_bundle_has_no_source_breakdown() {
        let cov = coverage(vec![vec![range(0, 100, 0)]]);
        let mut bundle = bundle(vec![span(0, 100, Some("a.js"))]);
        bundle.sizes = BundleSizes::Failed {
            error_message: "bad map".to_string(),
        };

        let summary = CoverageSummaryProvider::new()
            .summarize(&cov, Some(&bundle))
            .await
            .unwrap();

        assert_eq!(summary.wasted_bytes, 100);
        assert!(summary.sources_wasted_bytes.is_none());
    }

    #[tokio::test]
    async fn test_inverted_range_is_malformed() {
        let cov = coverage(vec![vec![range(50, 10, 0)]]);

        let result = CoverageSummaryProvider::new().summarize(&cov, None).await;

        assert!(matches!(result, Err(Error::MalformedCoverage { .. })));
    }

    #[tokio::test]
    async fn test_range_beyond_declared_length_is_malformed() {
        let cov = coverage(vec![vec![range(0, 200, 1)]]);
        let registry = ScriptRegistry::new([ScriptDescriptor {
            script_id: "1".to_string(),
            url: "https://a.com/app.js".to_string(),
            length: Some(100),
        }]);

        let result = CoverageSummaryProvider::new()
            .with_registry(registry)
            .summarize(&cov, None)
            .await;

        assert!(matches!(result, Err(Error::MalformedCoverage { .. })));
    }

    #[tokio::test]
    async fn test_cached_provider_reuses_summary() {
        let cov = coverage(vec![vec![range(0, 100, 0)]]);
        let provider = CachedSummaryProvider::new(CoverageSummaryProvider::new());

        let first = provider.summarize(&cov, None).await.unwrap();
        let second = provider.summarize(&cov, None).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(provider.cached().await, 1);
    }

    #[tokio::test]
    async fn test_cached_provider_keys_on_bundle() {
        let cov = coverage(vec![vec![range(0, 100, 0)]]);
        let bundle = bundle(vec![span(0, 100, Some("a.js"))]);
        let provider = CachedSummaryProvider::new(CoverageSummaryProvider::new());

        let without = provider.summarize(&cov, None).await.unwrap();
        let with = provider.summarize(&cov, Some(&bundle)).await.unwrap();

        assert!(without.sources_wasted_bytes.is_none());
        let sources = with.sources_wasted_bytes.unwrap();
        assert_eq!(sources.get("a.js"), Some(&100));
        assert_eq!(provider.cached().await, 2);
    }

    #[tokio::test]
    async fn test_cached_provider_keys_on_coverage() {
        let provider = CachedSummaryProvider::new(CoverageSummaryProvider::new());
        let first = coverage(vec![vec![range(0, 100, 0)]]);
        let second = coverage(vec![vec![range(0, 100, 1), range(0, 10, 0)]]);

        let a = provider.summarize(&first, None).await.unwrap();
        let b = provider.summarize(&second, None).await.unwrap();

        assert_eq!(a.wasted_bytes, 100);
        assert_eq!(b.wasted_bytes, 10);
    }
}
