use serde::{Deserialize, Serialize};

/// Top-level HAR object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Har {
    pub log: Log,
}

/// Main HAR log object
///
/// Only the parts needed to reconstruct network records are modelled; any
/// other HAR fields are ignored when reading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Log {
    pub version: String,
    pub creator: Creator,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<Vec<Page>>,
    pub entries: Vec<Entry>,
}

/// Creator/Browser information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Creator {
    pub name: String,
    pub version: String,
}

/// Page information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    pub title: String,
}

/// Individual HTTP transaction entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    #[serde(rename = "pageref", skip_serializing_if = "Option::is_none")]
    pub page_ref: Option<String>,
    #[serde(rename = "startedDateTime", default)]
    pub started_date_time: String,
    #[serde(default)]
    pub time: f64,
    pub request: Request,
    pub response: Response,
    /// Chrome DevTools extension: the resource type the browser assigned
    /// (`script`, `document`, `stylesheet`, ...)
    #[serde(rename = "_resourceType", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    /// Chrome DevTools extension: bytes on the wire including headers
    #[serde(rename = "_transferSize", skip_serializing_if = "Option::is_none")]
    pub transfer_size: Option<i64>,
}

/// HTTP request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub method: String,
    pub url: String,
    #[serde(rename = "httpVersion", default)]
    pub http_version: String,
    #[serde(default)]
    pub headers: Vec<Header>,
}

/// HTTP response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub status: i64,
    #[serde(rename = "statusText", default)]
    pub status_text: String,
    #[serde(default)]
    pub headers: Vec<Header>,
    pub content: Content,
    #[serde(rename = "redirectURL", default)]
    pub redirect_url: String,
    #[serde(rename = "headersSize", default = "unknown_size")]
    pub headers_size: i64,
    #[serde(rename = "bodySize", default = "unknown_size")]
    pub body_size: i64,
}

/// HTTP header
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

/// Response content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    pub size: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression: Option<i64>,
    #[serde(rename = "mimeType", default)]
    pub mime_type: String,
}

/// HAR uses -1 for sizes that are not available
fn unknown_size() -> i64 {
    -1
}

impl Response {
    /// Headers plus body bytes, with unknown (-1) parts counted as zero
    pub fn wire_size(&self) -> u64 {
        let headers = self.headers_size.max(0) as u64;
        let body = self.body_size.max(0) as u64;
        headers + body
    }

    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status) && !self.redirect_url.is_empty()
    }
}

impl Entry {
    /// Transfer size of the entry, using the Chrome extension field when the
    /// HAR was exported from DevTools.
    pub fn transfer_size(&self) -> u64 {
        match self.transfer_size {
            Some(size) if size >= 0 => size as u64,
            _ => self.response.wire_size(),
        }
    }
}
