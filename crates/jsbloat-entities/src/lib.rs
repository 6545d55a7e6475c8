pub mod catalog;
pub mod classifier;
pub mod error;
pub mod pattern;

pub use catalog::{EntityCatalog, EntityDefinition};
pub use classifier::{CatalogClassifier, root_domain};
pub use error::{Error, Result};
pub use pattern::HostPattern;
