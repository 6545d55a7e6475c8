use super::types::Har;
use crate::{Error, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub struct HarReader;

impl HarReader {
    /// Read and parse a HAR file from the given path
    pub fn from_file(path: &Path) -> Result<Har> {
        tracing::debug!("Reading HAR file from: {}", path.display());

        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let har: Har = serde_json::from_reader(reader)?;

        tracing::info!(
            "Successfully parsed HAR file with {} entries",
            har.log.entries.len()
        );

        Ok(har)
    }

    /// Parse a HAR file from a JSON string
    pub fn from_str(content: &str) -> Result<Har> {
        tracing::debug!("Parsing HAR from string");

        let har: Har = serde_json::from_str(content)?;

        tracing::debug!(
            "Parsed HAR from string with {} entries",
            har.log.entries.len()
        );

        Ok(har)
    }

    /// Validate that a HAR structure is usable for network record lookup
    pub fn validate(har: &Har) -> Result<()> {
        tracing::debug!("Validating HAR structure");

        if har.log.version.is_empty() {
            return Err(Error::InvalidStructure("Missing HAR version".to_string()));
        }

        if har.log.entries.is_empty() {
            tracing::warn!("HAR file contains no entries");
        }

        for (idx, entry) in har.log.entries.iter().enumerate() {
            if entry.request.url.is_empty() {
                return Err(Error::InvalidStructure(format!(
                    "Entry {} has empty request URL",
                    idx
                )));
            }
        }

        tracing::debug!("HAR structure is valid");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_har() {
        let har_json = r#"{
            "log": {
                "version": "1.2",
                "creator": {"name": "test", "version": "1.0"},
                "entries": []
            }
        }"#;

        let har = HarReader::from_str(har_json).unwrap();
        assert_eq!(har.log.version, "1.2");
        assert_eq!(har.log.entries.len(), 0);
    }

    #[test]
    fn test_parse_devtools_extensions() {
        let har_json = r#"{
            "log": {
                "version": "1.2",
                "creator": {"name": "WebInspector", "version": "537.36"},
                "entries": [{
                    "request": {"method": "GET", "url": "https://example.com/app.js"},
                    "response": {
                        "status": 200,
                        "content": {"size": 90000, "mimeType": "application/javascript"},
                        "headersSize": 300,
                        "bodySize": 30000
                    },
                    "_resourceType": "script",
                    "_transferSize": 30350
                }]
            }
        }"#;

        let har = HarReader::from_str(har_json).unwrap();
        let entry = &har.log.entries[0];
        assert_eq!(entry.resource_type.as_deref(), Some("script"));
        assert_eq!(entry.transfer_size(), 30350);
        assert_eq!(entry.response.wire_size(), 30300);
    }

    #[test]
    fn test_validate_empty_version() {
        let har_json = r#"{
            "log": {
                "version": "",
                "creator": {"name": "test", "version": "1.0"},
                "entries": []
            }
        }"#;

        let har = HarReader::from_str(har_json).unwrap();
        let result = HarReader::validate(&har);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_empty_url() {
        let har_json = r#"{
            "log": {
                "version": "1.2",
                "creator": {"name": "test", "version": "1.0"},
                "entries": [{
                    "request": {"method": "GET", "url": ""},
                    "response": {"status": 200, "content": {"size": 0}}
                }]
            }
        }"#;

        let har = HarReader::from_str(har_json).unwrap();
        assert!(matches!(
            HarReader::validate(&har),
            Err(Error::InvalidStructure(_))
        ));
    }
}
