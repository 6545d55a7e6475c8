pub mod analysis;
pub mod cache;
pub mod coverage;
pub mod entity;
pub mod error;
pub mod har;
pub mod network;

pub use error::{Error, Result};
