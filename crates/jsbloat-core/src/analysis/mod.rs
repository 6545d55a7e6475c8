//! Unused JavaScript accounting: per-script waste, bundle source breakdown,
//! entity roll-up, and the report that ties them together.

mod prefix;
mod report;
mod rollup;
mod waste;

pub use prefix::{ELLIPSIS, common_prefix, trim_common_prefix};
pub use report::{
    AuditInputs, AuditOptions, Collaborators, ColumnHeading, DEFAULT_BUNDLE_SOURCE_UNUSED_THRESHOLD,
    DEFAULT_UNUSED_THRESHOLD, SubItemsHeading, UnusedJsAudit, UnusedJsReport, ValueType, headings,
};
pub use rollup::{EntityGroup, EntityRollup, Link, PLACEHOLDER_LINK};
pub use waste::{MAX_SUB_ITEMS, SubItem, WasteAggregator, WasteItem};
