//! Service catalog — the merged view of every service and method discovered
//! in the protocol description files.
//!
//! ```text
//! ServiceCatalog
//! └── package ─┬─ service ─┬─ method → MethodEntry
//!              │           └─ method → MethodEntry
//!              └─ service (no methods)
//! ```
//!
//! Built once by [`crate::registry::load`]; there is no public mutation API.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use prost_reflect::MessageDescriptor;

use crate::error::RegistryError;

// ── MethodKey ──

/// `(package, service, method)` identity of an RPC.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MethodKey {
    pub package: String,
    pub service: String,
    pub method: String,
}

impl MethodKey {
    pub fn new(
        package: impl Into<String>,
        service: impl Into<String>,
        method: impl Into<String>,
    ) -> Self {
        Self {
            package: package.into(),
            service: service.into(),
            method: method.into(),
        }
    }

    /// Fully qualified service name, `package.Service` or `Service`.
    pub fn service_name(&self) -> String {
        if self.package.is_empty() {
            self.service.clone()
        } else {
            format!("{}.{}", self.package, self.service)
        }
    }

    /// Wire path, `/<package>.<service>/<method>`.
    pub fn path(&self) -> String {
        format!("/{}/{}", self.service_name(), self.method)
    }

    /// Parse a wire path back into a key.
    ///
    /// Returns `None` unless the path has exactly two non-empty segments.
    pub fn from_path(path: &str) -> Option<Self> {
        let rest = path.strip_prefix('/')?;
        let (service_name, method) = rest.split_once('/')?;
        if service_name.is_empty() || method.is_empty() || method.contains('/') {
            return None;
        }
        let (package, service) = match service_name.rsplit_once('.') {
            Some((package, service)) => (package, service),
            None => ("", service_name),
        };
        if service.is_empty() {
            return None;
        }
        Some(Self::new(package, service, method))
    }
}

impl fmt::Display for MethodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

// ── Entries ──

/// One discovered method together with its wire shapes.
///
/// The message descriptors are opaque to the dispatch logic; they only feed
/// the codec the transport needs to frame requests and responses.
#[derive(Debug, Clone)]
pub struct MethodEntry {
    pub key: MethodKey,
    pub input: MessageDescriptor,
    pub output: MessageDescriptor,
    pub client_streaming: bool,
    pub server_streaming: bool,
    /// File the method was declared in.
    pub source: PathBuf,
}

impl MethodEntry {
    pub fn is_unary(&self) -> bool {
        !self.client_streaming && !self.server_streaming
    }
}

#[derive(Debug, Clone)]
pub struct ServiceEntry {
    pub name: String,
    /// First file that declared the service.
    pub source: PathBuf,
    pub methods: BTreeMap<String, MethodEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct PackageEntry {
    pub services: BTreeMap<String, ServiceEntry>,
}

// ── ServiceCatalog ──

#[derive(Debug, Clone, Default)]
pub struct ServiceCatalog {
    packages: BTreeMap<String, PackageEntry>,
}

impl ServiceCatalog {
    pub fn packages(&self) -> &BTreeMap<String, PackageEntry> {
        &self.packages
    }

    pub fn get(&self, key: &MethodKey) -> Option<&MethodEntry> {
        self.packages
            .get(&key.package)?
            .services
            .get(&key.service)?
            .methods
            .get(&key.method)
    }

    /// Every method, ordered by key.
    pub fn methods(&self) -> impl Iterator<Item = &MethodEntry> {
        self.packages
            .values()
            .flat_map(|p| p.services.values())
            .flat_map(|s| s.methods.values())
    }

    pub fn keys(&self) -> Vec<MethodKey> {
        self.methods().map(|m| m.key.clone()).collect()
    }

    pub fn service_count(&self) -> usize {
        self.packages.values().map(|p| p.services.len()).sum()
    }

    pub fn method_count(&self) -> usize {
        self.methods().count()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub(crate) fn add_package(&mut self, package: &str) {
        self.packages.entry(package.to_string()).or_default();
    }

    /// Register a service. Merging into an existing service of the same name
    /// is allowed; a method already defined elsewhere is not.
    pub(crate) fn add_service(
        &mut self,
        package: &str,
        service: &str,
        source: &Path,
        methods: Vec<MethodEntry>,
    ) -> Result<(), RegistryError> {
        let entry = self
            .packages
            .entry(package.to_string())
            .or_default()
            .services
            .entry(service.to_string())
            .or_insert_with(|| ServiceEntry {
                name: service.to_string(),
                source: source.to_path_buf(),
                methods: BTreeMap::new(),
            });

        for method in methods {
            if let Some(existing) = entry.methods.get(&method.key.method) {
                return Err(RegistryError::DuplicateMethod {
                    key: method.key,
                    first: existing.source.clone(),
                    second: method.source,
                });
            }
            entry.methods.insert(method.key.method.clone(), method);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_with_package() {
        let key = MethodKey::new("acme.billing.v1", "Invoices", "Create");
        assert_eq!(key.path(), "/acme.billing.v1.Invoices/Create");
    }

    #[test]
    fn path_without_package() {
        let key = MethodKey::new("", "Echo", "Say");
        assert_eq!(key.path(), "/Echo/Say");
    }

    #[test]
    fn from_path_splits_on_last_dot() {
        let key = MethodKey::from_path("/acme.billing.v1.Invoices/Create").unwrap();
        assert_eq!(key, MethodKey::new("acme.billing.v1", "Invoices", "Create"));
    }

    #[test]
    fn from_path_without_package() {
        let key = MethodKey::from_path("/Echo/Say").unwrap();
        assert_eq!(key, MethodKey::new("", "Echo", "Say"));
    }

    #[test]
    fn from_path_rejects_malformed() {
        assert!(MethodKey::from_path("").is_none());
        assert!(MethodKey::from_path("/").is_none());
        assert!(MethodKey::from_path("/Echo").is_none());
        assert!(MethodKey::from_path("/Echo/").is_none());
        assert!(MethodKey::from_path("Echo/Say").is_none());
        assert!(MethodKey::from_path("/pkg./Say").is_none());
        assert!(MethodKey::from_path("/Echo/Say/../x").is_none());
    }
}
