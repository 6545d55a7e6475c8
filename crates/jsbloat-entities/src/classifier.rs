use crate::catalog::EntityCatalog;
use jsbloat_core::entity::{ClassifiedEntity, EntityClassifier};
use url::{Host, Url};

/// Extract root domain using Public Suffix List
pub fn root_domain(domain: &str) -> String {
    if domain.parse::<std::net::IpAddr>().is_ok() {
        return domain.to_string();
    }

    match psl::domain(domain.as_bytes()) {
        Some(root) => String::from_utf8_lossy(root.as_bytes()).to_string(),
        None => {
            let parts: Vec<&str> = domain.split('.').collect();
            if parts.len() >= 2 {
                format!("{}.{}", parts[parts.len() - 2], parts[parts.len() - 1])
            } else {
                domain.to_string()
            }
        }
    }
}

/// Classifies URLs against an entity catalog.
///
/// Hosts that no catalog entry claims are attributed to an entity made up
/// from their root domain. URLs that are not http(s) stay unattributed.
#[derive(Debug, Clone)]
pub struct CatalogClassifier {
    catalog: EntityCatalog,
    first_party: Option<ClassifiedEntity>,
}

impl CatalogClassifier {
    pub fn new(catalog: EntityCatalog) -> Self {
        Self {
            catalog,
            first_party: None,
        }
    }

    /// Treat the entity serving `page_url` as the first party
    pub fn with_page_url(mut self, page_url: &str) -> Self {
        self.first_party = self.classify(page_url);
        match &self.first_party {
            Some(entity) => tracing::debug!("First party: {}", entity.name),
            None => tracing::debug!("No first party for page URL {}", page_url),
        }
        self
    }

    pub fn first_party(&self) -> Option<&ClassifiedEntity> {
        self.first_party.as_ref()
    }

    pub fn catalog(&self) -> &EntityCatalog {
        &self.catalog
    }

    fn made_up(root: String) -> ClassifiedEntity {
        ClassifiedEntity {
            homepage: Some(format!("https://{}", root)),
            category: None,
            is_unrecognized: true,
            name: root,
        }
    }
}

impl EntityClassifier for CatalogClassifier {
    fn classify(&self, url: &str) -> Option<ClassifiedEntity> {
        let parsed = match Url::parse(url) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!("Failed to parse URL {}: {}", url, e);
                return None;
            }
        };

        if !matches!(parsed.scheme(), "http" | "https") {
            return None;
        }

        match parsed.host()? {
            Host::Domain(domain) => {
                if let Some(definition) = self.catalog.find(domain) {
                    return Some(definition.to_entity());
                }
                Some(Self::made_up(root_domain(domain)))
            }
            Host::Ipv4(ip) => Some(Self::made_up(ip.to_string())),
            Host::Ipv6(ip) => Some(Self::made_up(format!("[{}]", ip))),
        }
    }

    fn is_first_party(&self, entity: &ClassifiedEntity) -> bool {
        self.first_party.as_ref() == Some(entity)
    }
}
