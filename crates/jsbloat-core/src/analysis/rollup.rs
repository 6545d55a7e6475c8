use super::waste::WasteItem;
use crate::entity::Entity;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Anchor used for entities without a homepage
pub const PLACEHOLDER_LINK: &str = "#";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub text: String,
    pub url: String,
}

/// Unused JavaScript totals of every script attributed to one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityGroup {
    pub entity: Entity,
    pub link: Link,
    pub is_first_party: bool,
    pub total_bytes: u64,
    pub wasted_bytes: u64,
    pub wasted_percent: f64,
}

impl EntityGroup {
    fn new(entity: Entity, is_first_party: bool) -> Self {
        let link = match &entity {
            Entity::Known(known) => Link {
                text: known.name.clone(),
                url: known
                    .homepage
                    .clone()
                    .unwrap_or_else(|| PLACEHOLDER_LINK.to_string()),
            },
            Entity::Unattributed => Link {
                text: entity.display_name().to_string(),
                url: PLACEHOLDER_LINK.to_string(),
            },
        };

        Self {
            entity,
            link,
            is_first_party,
            total_bytes: 0,
            wasted_bytes: 0,
            wasted_percent: 0.0,
        }
    }

    fn add(&mut self, item: &WasteItem) {
        self.total_bytes += item.total_bytes;
        self.wasted_bytes += item.wasted_bytes;
        self.wasted_percent = if self.total_bytes == 0 {
            0.0
        } else {
            self.wasted_bytes as f64 / self.total_bytes as f64 * 100.0
        };
    }
}

/// Accumulates report rows per entity, keeping groups in first-seen order
#[derive(Debug, Default)]
pub struct EntityRollup {
    groups: Vec<EntityGroup>,
    index: HashMap<Entity, usize>,
}

impl EntityRollup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item to its entity's group, creating the group on first use
    pub fn add(&mut self, entity: Entity, is_first_party: bool, item: &WasteItem) {
        let idx = match self.index.get(&entity) {
            Some(&idx) => idx,
            None => {
                tracing::debug!("New entity group: {}", entity.display_name());
                let idx = self.groups.len();
                self.index.insert(entity.clone(), idx);
                self.groups.push(EntityGroup::new(entity, is_first_party));
                idx
            }
        };
        self.groups[idx].add(item);
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn into_groups(self) -> Vec<EntityGroup> {
        self.groups
    }
}
