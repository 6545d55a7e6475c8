use serde::{Deserialize, Serialize};

/// An organization a URL was attributed to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedEntity {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Made up from the URL's root domain rather than found in a catalog
    #[serde(default)]
    pub is_unrecognized: bool,
}

impl ClassifiedEntity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            homepage: None,
            category: None,
            is_unrecognized: false,
        }
    }

    pub fn with_homepage(mut self, homepage: impl Into<String>) -> Self {
        self.homepage = Some(homepage.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// Grouping key for entity roll-ups.
///
/// Two scripts land in the same group only if their classifications are
/// equal as a whole, so same-named entities from different sources stay apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Entity {
    Known(ClassifiedEntity),
    Unattributed,
}

impl Entity {
    pub fn name(&self) -> Option<&str> {
        match self {
            Entity::Known(entity) => Some(&entity.name),
            Entity::Unattributed => None,
        }
    }

    pub fn display_name(&self) -> &str {
        self.name().unwrap_or("Unattributed")
    }
}

impl From<Option<ClassifiedEntity>> for Entity {
    fn from(entity: Option<ClassifiedEntity>) -> Self {
        match entity {
            Some(entity) => Entity::Known(entity),
            None => Entity::Unattributed,
        }
    }
}

/// Attributes URLs to entities
pub trait EntityClassifier: Send + Sync {
    fn classify(&self, url: &str) -> Option<ClassifiedEntity>;

    /// Whether the entity owns the page under audit
    fn is_first_party(&self, _entity: &ClassifiedEntity) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_same_name_different_classification_stays_distinct() {
        let catalog = Entity::Known(ClassifiedEntity::new("example.com").with_category("cdn"));
        let made_up = Entity::Known(ClassifiedEntity {
            is_unrecognized: true,
            ..ClassifiedEntity::new("example.com")
        });

        let keys: HashSet<_> = [catalog.clone(), made_up, catalog].into_iter().collect();
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn test_unattributed_from_none() {
        let entity = Entity::from(None);
        assert_eq!(entity, Entity::Unattributed);
        assert_eq!(entity.name(), None);
        assert_eq!(entity.display_name(), "Unattributed");
    }
}
