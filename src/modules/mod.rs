pub mod catalog;
pub mod config;
pub mod logger;

pub use catalog::{load_catalog, Catalog, MemoryResourceStore, ResourceStore};
