use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Source key for bundle bytes that no source map segment accounts for
pub const UNMAPPED_SOURCE: &str = "(unmapped)";

/// Per-file byte sizes of a bundle, or the reason they could not be computed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BundleSizes {
    Computed {
        files: HashMap<String, u64>,
        #[serde(rename = "unmappedBytes")]
        unmapped_bytes: u64,
        #[serde(rename = "totalBytes")]
        total_bytes: u64,
    },
    Failed {
        #[serde(rename = "errorMessage")]
        error_message: String,
    },
}

/// A byte range of the delivered script attributed to one original source
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSpan {
    pub start_offset: u64,
    pub end_offset: u64,
    /// `None` for generated code with no source mapping
    #[serde(default)]
    pub source: Option<String>,
}

/// Source-map derived breakdown of a concatenated script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    pub script_id: String,
    /// Every source URL listed by the source map, in map order
    pub source_urls: Vec<String>,
    pub sizes: BundleSizes,
    #[serde(default)]
    pub spans: Vec<SourceSpan>,
}

impl Bundle {
    /// Load the bundles of one page load from a JSON array file
    pub fn from_file(path: &Path) -> crate::Result<Vec<Bundle>> {
        tracing::debug!("Reading bundles from: {}", path.display());

        let file = std::fs::File::open(path)?;
        let bundles: Vec<Bundle> = serde_json::from_reader(std::io::BufReader::new(file))?;

        let failed = bundles.iter().filter(|b| b.sizes_failed()).count();
        tracing::info!("Loaded {} bundles ({} without sizes)", bundles.len(), failed);

        Ok(bundles)
    }

    pub fn sizes_failed(&self) -> bool {
        matches!(self.sizes, BundleSizes::Failed { .. })
    }

    /// Total bytes of one source within the bundle. The `(unmapped)` key
    /// resolves to the unmapped byte count.
    pub fn source_bytes(&self, source: &str) -> Option<u64> {
        match &self.sizes {
            BundleSizes::Computed {
                files,
                unmapped_bytes,
                ..
            } => {
                if source == UNMAPPED_SOURCE {
                    Some(*unmapped_bytes)
                } else {
                    files.get(source).copied()
                }
            }
            BundleSizes::Failed { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_computed_bundle() {
        let json = r#"{
            "scriptId": "12",
            "sourceUrls": ["webpack:///src/a.js", "webpack:///src/b.js"],
            "sizes": {
                "files": {"webpack:///src/a.js": 1000, "webpack:///src/b.js": 9000},
                "unmappedBytes": 50,
                "totalBytes": 10050
            },
            "spans": [
                {"startOffset": 0, "endOffset": 1000, "source": "webpack:///src/a.js"},
                {"startOffset": 1000, "endOffset": 1050}
            ]
        }"#;

        let bundle: Bundle = serde_json::from_str(json).unwrap();
        assert!(!bundle.sizes_failed());
        assert_eq!(bundle.source_bytes("webpack:///src/b.js"), Some(9000));
        assert_eq!(bundle.source_bytes(UNMAPPED_SOURCE), Some(50));
        assert_eq!(bundle.source_bytes("webpack:///src/missing.js"), None);
        assert_eq!(bundle.spans[1].source, None);
    }

    #[test]
    fn test_parse_failed_bundle() {
        let json = r#"{
            "scriptId": "12",
            "sourceUrls": [],
            "sizes": {"errorMessage": "mapping out of range"}
        }"#;

        let bundle: Bundle = serde_json::from_str(json).unwrap();
        assert!(bundle.sizes_failed());
        assert!(bundle.spans.is_empty());
        assert_eq!(bundle.source_bytes(UNMAPPED_SOURCE), None);
    }
}
