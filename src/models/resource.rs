use serde::{Deserialize, Serialize};

/// Dataset that owns one or more resources
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub id: String,
    /// URL-safe name, used in proxified URLs
    pub name: String,
}

/// Remote file attached to a package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub package_id: String,
    pub url: String,
    #[serde(default)]
    pub mimetype: Option<String>,
}

/// Lookup result handed to the relay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceAndPackage {
    pub resource: Resource,
    pub package: Package,
}
