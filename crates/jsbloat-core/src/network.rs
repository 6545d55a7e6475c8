//! Network records reconstructed from HAR entries, and transfer-size
//! estimation for script content measured off the wire.

use crate::har::{Entry, Har};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Resource kind of a network fetch, as the browser classifies it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Document,
    Script,
    Stylesheet,
    Image,
    Font,
    Xhr,
    Fetch,
    Other,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Document => "Document",
            ResourceType::Script => "Script",
            ResourceType::Stylesheet => "Stylesheet",
            ResourceType::Image => "Image",
            ResourceType::Font => "Font",
            ResourceType::Xhr => "XHR",
            ResourceType::Fetch => "Fetch",
            ResourceType::Other => "Other",
        }
    }

    /// Parse the `_resourceType` value written by Chrome DevTools
    pub fn from_devtools(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "document" => ResourceType::Document,
            "script" => ResourceType::Script,
            "stylesheet" => ResourceType::Stylesheet,
            "image" => ResourceType::Image,
            "font" => ResourceType::Font,
            "xhr" => ResourceType::Xhr,
            "fetch" => ResourceType::Fetch,
            _ => ResourceType::Other,
        }
    }

    /// Infer the resource type from a response MIME type
    pub fn from_mime(mime_type: &str) -> Self {
        let parsed: mime::Mime = match mime_type.trim().parse() {
            Ok(m) => m,
            Err(_) => return ResourceType::Other,
        };

        match (parsed.type_().as_str(), parsed.subtype().as_str()) {
            ("text", "html") => ResourceType::Document,
            ("text", "css") => ResourceType::Stylesheet,
            ("text" | "application", "javascript" | "x-javascript" | "ecmascript") => {
                ResourceType::Script
            }
            ("image", _) => ResourceType::Image,
            ("font", _) => ResourceType::Font,
            ("application", "font-woff" | "font-woff2" | "x-font-ttf") => ResourceType::Font,
            _ => ResourceType::Other,
        }
    }
}

/// A completed network fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkRecord {
    pub url: String,
    pub status: i64,
    pub resource_type: ResourceType,
    /// Bytes sent over the network, possibly compressed
    pub transfer_size: u64,
    /// Decoded content length
    pub resource_size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
}

impl NetworkRecord {
    pub fn from_entry(entry: &Entry) -> Self {
        let resource_type = match &entry.resource_type {
            Some(kind) => ResourceType::from_devtools(kind),
            None => ResourceType::from_mime(&entry.response.content.mime_type),
        };

        let redirect_url = if entry.response.is_redirect() {
            Some(entry.response.redirect_url.clone())
        } else {
            None
        };

        Self {
            url: entry.request.url.clone(),
            status: entry.response.status,
            resource_type,
            transfer_size: entry.transfer_size(),
            resource_size: entry.response.content.size.max(0) as u64,
            redirect_url,
        }
    }
}

/// Network records of one page load, looked up by URL
#[derive(Debug, Clone, Default)]
pub struct NetworkRecords {
    records: Vec<NetworkRecord>,
    by_url: HashMap<String, usize>,
}

impl NetworkRecords {
    pub fn new(records: Vec<NetworkRecord>) -> Self {
        let mut by_url = HashMap::new();
        for (idx, record) in records.iter().enumerate() {
            // First fetch of a URL wins
            by_url.entry(record.url.clone()).or_insert(idx);
        }
        Self { records, by_url }
    }

    pub fn from_har(har: &Har) -> Self {
        Self::new(har.log.entries.iter().map(NetworkRecord::from_entry).collect())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NetworkRecord> {
        self.records.iter()
    }

    pub fn get(&self, url: &str) -> Option<&NetworkRecord> {
        self.by_url.get(url).map(|&idx| &self.records[idx])
    }

    /// Find the record that delivered a script's content.
    ///
    /// Redirects are followed to the final response. A redirect whose target
    /// was never recorded, or a redirect loop, yields no record.
    pub fn find_for_script(&self, url: &str) -> Option<&NetworkRecord> {
        let mut record = self.get(url)?;
        let mut visited = HashSet::new();

        while let Some(target) = &record.redirect_url {
            if !visited.insert(record.url.as_str()) {
                tracing::debug!("Redirect loop while resolving {}", url);
                return None;
            }
            record = match self.get(target) {
                Some(next) => next,
                None => {
                    tracing::debug!("Redirect target {} of {} was not recorded", target, url);
                    return None;
                }
            };
        }

        Some(record)
    }
}

/// Estimates how many bytes a piece of content cost on the wire
pub trait TransferSizeEstimator: Send + Sync {
    fn estimate(
        &self,
        record: Option<&NetworkRecord>,
        content_bytes: u64,
        resource_type: ResourceType,
    ) -> u64;
}

/// Estimator using the record's own transfer size when the record is of the
/// requested type, its compression ratio when the content was inlined in a
/// resource of another type, and typical gzip ratios when there is no record.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResourceTypeEstimator;

impl TransferSizeEstimator for ResourceTypeEstimator {
    fn estimate(
        &self,
        record: Option<&NetworkRecord>,
        content_bytes: u64,
        resource_type: ResourceType,
    ) -> u64 {
        let Some(record) = record else {
            let ratio = match resource_type {
                ResourceType::Stylesheet => 0.2,
                ResourceType::Script | ResourceType::Document => 0.33,
                _ => 0.5,
            };
            return (content_bytes as f64 * ratio).round() as u64;
        };

        if record.resource_type == resource_type {
            return record.transfer_size;
        }

        // Inline content shares the compression of its enclosing resource
        let ratio = if record.resource_size > 0 {
            record.transfer_size as f64 / record.resource_size as f64
        } else {
            1.0
        };
        (content_bytes as f64 * ratio).round() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(url: &str, resource_type: ResourceType, transfer: u64, size: u64) -> NetworkRecord {
        NetworkRecord {
            url: url.to_string(),
            status: 200,
            resource_type,
            transfer_size: transfer,
            resource_size: size,
            redirect_url: None,
        }
    }

    fn redirect(url: &str, target: &str) -> NetworkRecord {
        NetworkRecord {
            url: url.to_string(),
            status: 302,
            resource_type: ResourceType::Other,
            transfer_size: 200,
            resource_size: 0,
            redirect_url: Some(target.to_string()),
        }
    }

    #[test]
    fn test_resource_type_from_mime() {
        assert_eq!(
            ResourceType::from_mime("application/javascript"),
            ResourceType::Script
        );
        assert_eq!(
            ResourceType::from_mime("text/javascript; charset=utf-8"),
            ResourceType::Script
        );
        assert_eq!(ResourceType::from_mime("text/html"), ResourceType::Document);
        assert_eq!(ResourceType::from_mime("text/css"), ResourceType::Stylesheet);
        assert_eq!(ResourceType::from_mime("image/png"), ResourceType::Image);
        assert_eq!(ResourceType::from_mime(""), ResourceType::Other);
    }

    #[test]
    fn test_resource_type_from_devtools() {
        assert_eq!(ResourceType::from_devtools("script"), ResourceType::Script);
        assert_eq!(ResourceType::from_devtools("Document"), ResourceType::Document);
        assert_eq!(ResourceType::from_devtools("websocket"), ResourceType::Other);
    }

    #[test]
    fn test_first_record_wins() {
        let records = NetworkRecords::new(vec![
            record("https://a.com/app.js", ResourceType::Script, 100, 300),
            record("https://a.com/app.js", ResourceType::Script, 999, 999),
        ]);
        assert_eq!(records.get("https://a.com/app.js").unwrap().transfer_size, 100);
    }

    #[test]
    fn test_find_for_script_follows_redirects() {
        let records = NetworkRecords::new(vec![
            redirect("http://a.com/app.js", "https://a.com/app.js"),
            redirect("https://a.com/app.js", "https://cdn.a.com/app.js"),
            record("https://cdn.a.com/app.js", ResourceType::Script, 1000, 4000),
        ]);

        let found = records.find_for_script("http://a.com/app.js").unwrap();
        assert_eq!(found.url, "https://cdn.a.com/app.js");
        assert_eq!(found.transfer_size, 1000);
    }

    #[test]
    fn test_find_for_script_redirect_loop() {
        let records = NetworkRecords::new(vec![
            redirect("https://a.com/x.js", "https://a.com/y.js"),
            redirect("https://a.com/y.js", "https://a.com/x.js"),
        ]);
        assert!(records.find_for_script("https://a.com/x.js").is_none());
    }

    #[test]
    fn test_find_for_script_missing() {
        let records = NetworkRecords::default();
        assert!(records.find_for_script("https://a.com/x.js").is_none());
        assert!(records.is_empty());
    }

    #[test]
    fn test_estimate_same_type_uses_transfer_size() {
        let rec = record("https://a.com/app.js", ResourceType::Script, 12_345, 50_000);
        let size = ResourceTypeEstimator.estimate(Some(&rec), 50_000, ResourceType::Script);
        assert_eq!(size, 12_345);
    }

    #[test]
    fn test_estimate_inline_uses_compression_ratio() {
        let doc = record("https://a.com/", ResourceType::Document, 2_000, 8_000);
        let size = ResourceTypeEstimator.estimate(Some(&doc), 4_000, ResourceType::Script);
        assert_eq!(size, 1_000);

        let empty = record("https://a.com/", ResourceType::Document, 2_000, 0);
        let size = ResourceTypeEstimator.estimate(Some(&empty), 4_000, ResourceType::Script);
        assert_eq!(size, 4_000);
    }

    #[test]
    fn test_estimate_without_record() {
        let est = ResourceTypeEstimator;
        assert_eq!(est.estimate(None, 1000, ResourceType::Script), 330);
        assert_eq!(est.estimate(None, 1000, ResourceType::Stylesheet), 200);
        assert_eq!(est.estimate(None, 1000, ResourceType::Image), 500);
    }
}
