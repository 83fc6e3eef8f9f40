// Read-only package/resource metadata lookup

use crate::error::{AppError, AppResult};
use crate::models::{Package, Resource};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Metadata lookup consumed by the relay. Implementations must not hand out
/// mutable access; the relay never writes resources back.
pub trait ResourceStore: Send + Sync {
    /// Find a package by id or name
    fn package_show(&self, id_or_name: &str) -> Option<Package>;

    fn resource_show(&self, id: &str) -> Option<Resource>;
}

/// On-disk catalog layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub packages: Vec<Package>,
    #[serde(default)]
    pub resources: Vec<Resource>,
}

/// In-memory store built from a [`Catalog`]
#[derive(Debug, Default)]
pub struct MemoryResourceStore {
    packages: HashMap<String, Package>,
    names: HashMap<String, String>,
    resources: HashMap<String, Resource>,
}

impl MemoryResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_catalog(catalog: Catalog) -> AppResult<Self> {
        let mut store = Self::new();
        for package in catalog.packages {
            store.insert_package(package);
        }
        for resource in catalog.resources {
            if !store.packages.contains_key(&resource.package_id) {
                return Err(AppError::Catalog(format!(
                    "Resource {} references unknown package {}",
                    resource.id, resource.package_id
                )));
            }
            store.insert_resource(resource);
        }
        Ok(store)
    }

    pub fn insert_package(&mut self, package: Package) {
        self.names.insert(package.name.clone(), package.id.clone());
        self.packages.insert(package.id.clone(), package);
    }

    pub fn insert_resource(&mut self, resource: Resource) {
        self.resources.insert(resource.id.clone(), resource);
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl ResourceStore for MemoryResourceStore {
    fn package_show(&self, id_or_name: &str) -> Option<Package> {
        self.packages
            .get(id_or_name)
            .or_else(|| {
                self.names
                    .get(id_or_name)
                    .and_then(|id| self.packages.get(id))
            })
            .cloned()
    }

    fn resource_show(&self, id: &str) -> Option<Resource> {
        self.resources.get(id).cloned()
    }
}

/// Load a JSON catalog file
pub fn load_catalog(path: &Path) -> AppResult<MemoryResourceStore> {
    let content = fs::read_to_string(path).map_err(|e| {
        AppError::Catalog(format!("Failed to read catalog {}: {}", path.display(), e))
    })?;
    let catalog: Catalog = serde_json::from_str(&content).map_err(|e| {
        AppError::Catalog(format!("Failed to parse catalog {}: {}", path.display(), e))
    })?;

    let store = MemoryResourceStore::from_catalog(catalog)?;
    tracing::info!(
        "Loaded {} resources from catalog {}",
        store.len(),
        path.display()
    );
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CATALOG: &str = r#"{
        "packages": [{"id": "p1", "name": "annakarenina"}],
        "resources": [
            {"id": "r1", "package_id": "p1", "url": "http://www.ckan.org/static/example.json",
             "mimetype": "application/json"}
        ]
    }"#;

    #[test]
    fn test_load_catalog_and_lookup() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CATALOG.as_bytes()).unwrap();

        let store = load_catalog(file.path()).unwrap();
        assert_eq!(store.len(), 1);

        let by_id = store.package_show("p1").unwrap();
        let by_name = store.package_show("annakarenina").unwrap();
        assert_eq!(by_id, by_name);

        let resource = store.resource_show("r1").unwrap();
        assert_eq!(resource.mimetype.as_deref(), Some("application/json"));
        assert!(store.resource_show("missing").is_none());
    }

    #[test]
    fn test_rejects_orphan_resource() {
        let catalog = Catalog {
            packages: vec![],
            resources: vec![Resource {
                id: "r1".into(),
                package_id: "nope".into(),
                url: "http://example.com".into(),
                mimetype: None,
            }],
        };
        let err = MemoryResourceStore::from_catalog(catalog).unwrap_err();
        assert!(matches!(err, AppError::Catalog(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = load_catalog(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read catalog"));
    }
}
