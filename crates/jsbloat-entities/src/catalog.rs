//! Known first- and third-party entities and the hosts they serve from.

use crate::pattern::HostPattern;
use crate::{Error, Result};
use jsbloat_core::entity::ClassifiedEntity;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// An entity as written in a catalog file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Domains (covering subdomains) or host globs
    pub domains: Vec<String>,
}

impl EntityDefinition {
    pub fn to_entity(&self) -> ClassifiedEntity {
        ClassifiedEntity {
            name: self.name.clone(),
            homepage: self.homepage.clone(),
            category: self.category.clone(),
            is_unrecognized: false,
        }
    }
}

#[derive(Debug, Clone)]
struct CatalogEntry {
    definition: EntityDefinition,
    patterns: Vec<HostPattern>,
}

/// Ordered list of entity definitions; the first entry matching a host wins
#[derive(Debug, Clone, Default)]
pub struct EntityCatalog {
    entries: Vec<CatalogEntry>,
}

fn def(name: &str, homepage: &str, category: &str, domains: &[&str]) -> EntityDefinition {
    EntityDefinition {
        name: name.to_string(),
        homepage: Some(homepage.to_string()),
        category: Some(category.to_string()),
        domains: domains.iter().map(|d| d.to_string()).collect(),
    }
}

fn builtin_definitions() -> Vec<EntityDefinition> {
    vec![
        def(
            "Google Tag Manager",
            "https://marketingplatform.google.com/about/tag-manager/",
            "tag-manager",
            &["googletagmanager.com"],
        ),
        def(
            "Google Analytics",
            "https://marketingplatform.google.com/about/analytics/",
            "analytics",
            &["google-analytics.com", "analytics.google.com"],
        ),
        def(
            "Google/Doubleclick Ads",
            "https://marketingplatform.google.com/about/enterprise/",
            "ad",
            &["doubleclick.net", "googlesyndication.com", "googleadservices.com"],
        ),
        def(
            "Google CDN",
            "https://developers.google.com/speed/libraries/",
            "cdn",
            &["ajax.googleapis.com"],
        ),
        def(
            "Facebook",
            "https://www.facebook.com",
            "social",
            &["facebook.net", "facebook.com", "fbcdn.net"],
        ),
        def(
            "Twitter",
            "https://twitter.com",
            "social",
            &["platform.twitter.com", "twimg.com"],
        ),
        def("YouTube", "https://youtube.com", "video", &["youtube.com", "ytimg.com"]),
        def("JSDelivr CDN", "https://www.jsdelivr.com/", "cdn", &["jsdelivr.net"]),
        def("Unpkg", "https://unpkg.com/", "cdn", &["unpkg.com"]),
        def("Cloudflare CDN", "https://cdnjs.com/", "cdn", &["cdnjs.cloudflare.com"]),
        def("jQuery CDN", "https://code.jquery.com/", "cdn", &["code.jquery.com"]),
        def("Hotjar", "https://www.hotjar.com/", "analytics", &["hotjar.com", "hotjar.io"]),
        def("Segment", "https://segment.com/", "analytics", &["segment.com", "segment.io"]),
        def("Optimizely", "https://www.optimizely.com/", "analytics", &["optimizely.com"]),
        def("Sentry", "https://sentry.io/", "utility", &["sentry.io", "sentry-cdn.com"]),
        def("Stripe", "https://stripe.com", "utility", &["stripe.com", "stripe.network"]),
        def(
            "Intercom",
            "https://www.intercom.com",
            "customer-success",
            &["intercom.io", "intercomcdn.com"],
        ),
    ]
}

lazy_static! {
    static ref BUILTIN_CATALOG: EntityCatalog = EntityCatalog::new(builtin_definitions()).unwrap();
}

impl EntityCatalog {
    /// Build a catalog, rejecting unnamed entities, entities without domains,
    /// duplicate names and invalid host patterns
    pub fn new(definitions: Vec<EntityDefinition>) -> Result<Self> {
        let mut names = HashSet::new();
        let mut entries = Vec::with_capacity(definitions.len());

        for definition in definitions {
            if definition.name.trim().is_empty() {
                return Err(Error::Catalog("entity without a name".to_string()));
            }
            if definition.domains.is_empty() {
                return Err(Error::Catalog(format!(
                    "entity '{}' lists no domains",
                    definition.name
                )));
            }
            if !names.insert(definition.name.clone()) {
                return Err(Error::Catalog(format!(
                    "entity '{}' is defined twice",
                    definition.name
                )));
            }

            let patterns = definition
                .domains
                .iter()
                .map(|d| HostPattern::parse(d))
                .collect::<Result<Vec<_>>>()?;
            entries.push(CatalogEntry {
                definition,
                patterns,
            });
        }

        Ok(Self { entries })
    }

    /// The catalog of well-known third parties shipped with jsbloat
    pub fn builtin() -> Self {
        BUILTIN_CATALOG.clone()
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let definitions: Vec<EntityDefinition> = serde_json::from_str(content)?;
        Self::new(definitions)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        tracing::debug!("Reading entity catalog from: {}", path.display());

        let content = std::fs::read_to_string(path)?;
        let catalog = Self::from_json(&content)?;

        tracing::info!(
            "Loaded {} entities from {}",
            catalog.len(),
            path.display()
        );

        Ok(catalog)
    }

    /// Put `overrides` ahead of this catalog. Entries of this catalog with
    /// the same name as an override are dropped.
    pub fn with_overrides(self, overrides: EntityCatalog) -> Self {
        let overridden: HashSet<String> = overrides
            .entries
            .iter()
            .map(|e| e.definition.name.clone())
            .collect();

        let mut entries = overrides.entries;
        entries.extend(
            self.entries
                .into_iter()
                .filter(|e| !overridden.contains(&e.definition.name)),
        );
        Self { entries }
    }

    /// The first entity with a domain pattern matching `host`
    pub fn find(&self, host: &str) -> Option<&EntityDefinition> {
        self.entries
            .iter()
            .find(|e| e.patterns.iter().any(|p| p.matches(host)))
            .map(|e| &e.definition)
    }

    pub fn definitions(&self) -> impl Iterator<Item = &EntityDefinition> {
        self.entries.iter().map(|e| &e.definition)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
