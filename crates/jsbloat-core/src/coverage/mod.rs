mod bundle;
mod summary;
mod types;

pub use bundle::{Bundle, BundleSizes, SourceSpan, UNMAPPED_SOURCE};
pub use summary::{CachedSummaryProvider, CoverageSummaryProvider, SummaryProvider, UnusedJsSummary};
pub use types::*;
