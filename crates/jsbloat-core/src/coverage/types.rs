use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A range of a script with the number of times it executed
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageRange {
    pub start_offset: u64,
    pub end_offset: u64,
    pub count: u64,
}

/// Coverage data for a single function
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionCoverage {
    #[serde(default)]
    pub function_name: String,
    pub ranges: Vec<CoverageRange>,
    #[serde(default)]
    pub is_block_coverage: bool,
}

/// Coverage of one script as reported by the DevTools profiler
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptCoverage {
    pub script_id: String,
    #[serde(default)]
    pub url: String,
    pub functions: Vec<FunctionCoverage>,
}

/// Coverage of every observed script, in the order it was collected
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoverageSet(Vec<ScriptCoverage>);

impl CoverageSet {
    pub fn new(scripts: Vec<ScriptCoverage>) -> Self {
        Self(scripts)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScriptCoverage> {
        self.0.iter()
    }
}

impl FromIterator<ScriptCoverage> for CoverageSet {
    fn from_iter<I: IntoIterator<Item = ScriptCoverage>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A parsed script as reported by the debugger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptDescriptor {
    pub script_id: String,
    pub url: String,
    /// Script length in bytes, when the debugger reported it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u64>,
}

/// Script descriptors looked up by script id
#[derive(Debug, Clone, Default)]
pub struct ScriptRegistry {
    scripts: HashMap<String, ScriptDescriptor>,
}

impl ScriptRegistry {
    pub fn new(scripts: impl IntoIterator<Item = ScriptDescriptor>) -> Self {
        Self {
            scripts: scripts
                .into_iter()
                .map(|s| (s.script_id.clone(), s))
                .collect(),
        }
    }

    /// Build a registry from the URLs carried by the coverage entries
    /// themselves, for dumps that did not record parsed scripts.
    pub fn from_coverage(coverage: &CoverageSet) -> Self {
        Self::new(
            coverage
                .iter()
                .filter(|c| !c.url.is_empty())
                .map(|c| ScriptDescriptor {
                    script_id: c.script_id.clone(),
                    url: c.url.clone(),
                    length: None,
                }),
        )
    }

    pub fn get(&self, script_id: &str) -> Option<&ScriptDescriptor> {
        self.scripts.get(script_id)
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}

/// On-disk coverage dump: parsed scripts plus their precise coverage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageDump {
    #[serde(default)]
    pub scripts: Vec<ScriptDescriptor>,
    pub coverage: CoverageSet,
}

impl CoverageDump {
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        tracing::debug!("Reading coverage dump from: {}", path.display());

        let file = std::fs::File::open(path)?;
        let dump: CoverageDump = serde_json::from_reader(std::io::BufReader::new(file))?;

        tracing::info!(
            "Loaded coverage for {} scripts ({} parsed scripts)",
            dump.coverage.len(),
            dump.scripts.len()
        );

        Ok(dump)
    }

    /// The script registry for this dump, falling back to coverage URLs when
    /// no parsed scripts were recorded
    pub fn registry(&self) -> ScriptRegistry {
        if self.scripts.is_empty() {
            ScriptRegistry::from_coverage(&self.coverage)
        } else {
            ScriptRegistry::new(self.scripts.iter().cloned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coverage_dump() {
        let json = r#"{
            "scripts": [{"scriptId": "7", "url": "https://a.com/app.js", "length": 120}],
            "coverage": [{
                "scriptId": "7",
                "url": "https://a.com/app.js",
                "functions": [{
                    "functionName": "",
                    "ranges": [{"startOffset": 0, "endOffset": 120, "count": 1}],
                    "isBlockCoverage": false
                }]
            }]
        }"#;

        let dump: CoverageDump = serde_json::from_str(json).unwrap();
        assert_eq!(dump.coverage.len(), 1);
        let registry = dump.registry();
        assert_eq!(registry.get("7").unwrap().length, Some(120));
    }

    #[test]
    fn test_registry_falls_back_to_coverage_urls() {
        let json = r#"{
            "coverage": [
                {"scriptId": "1", "url": "https://a.com/a.js", "functions": []},
                {"scriptId": "2", "url": "", "functions": []}
            ]
        }"#;

        let dump: CoverageDump = serde_json::from_str(json).unwrap();
        let registry = dump.registry();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("1").unwrap().url, "https://a.com/a.js");
        assert!(registry.get("2").is_none());
    }

    #[test]
    fn test_coverage_set_keeps_order() {
        let set: CoverageSet = ["3", "1", "2"]
            .iter()
            .map(|id| ScriptCoverage {
                script_id: id.to_string(),
                url: String::new(),
                functions: vec![],
            })
            .collect();
        let ids: Vec<_> = set.iter().map(|c| c.script_id.as_str()).collect();
        assert_eq!(ids, vec!["3", "1", "2"]);
    }
}
