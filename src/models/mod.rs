pub mod config;
pub mod resource;

pub use config::AppConfig;
pub use resource::{Package, Resource, ResourceAndPackage};
