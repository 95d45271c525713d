// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Service Registry
//!
//! Hierarchical registry of services keyed by dotted [`ServiceName`]s. The
//! host container owns the real registry; naming only needs the four
//! operations of [`ServiceRegistry`]. [`InMemoryServiceRegistry`] backs tests,
//! the CLI and embedded use.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Bound;
use thiserror::Error;

use crate::domain::name::Name;
use crate::domain::owner::Owner;
use crate::domain::value::BoundValue;

/// Dotted, segment-wise service name (`jboss.naming.context.java.app`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServiceName {
    segments: Vec<String>,
}

impl ServiceName {
    pub fn new<I, S>(segments: I) -> Result<Self, ServiceRegistryError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() || segments.iter().any(String::is_empty) {
            return Err(ServiceRegistryError::InvalidName(segments.join(".")));
        }
        Ok(Self { segments })
    }

    pub fn parse(raw: &str) -> Result<Self, ServiceRegistryError> {
        Self::new(raw.split('.'))
    }

    /// Service name for the naming name `name` under this base.
    pub fn append(&self, name: &Name) -> ServiceName {
        let mut segments = self.segments.clone();
        segments.extend(name.segments().iter().cloned());
        ServiceName { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Ancestor-or-equal test.
    pub fn starts_with(&self, ancestor: &ServiceName) -> bool {
        self.segments.len() >= ancestor.segments.len()
            && self.segments[..ancestor.segments.len()] == ancestor.segments[..]
    }

    /// Segments below `base`, or `None` when `self` is not under `base`.
    pub fn relative_to(&self, base: &ServiceName) -> Option<&[String]> {
        self.starts_with(base).then(|| &self.segments[base.segments.len()..])
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

/// What a service installed for naming provides.
#[derive(Debug, Clone)]
pub enum ServiceValue {
    Binding(BoundValue),
    /// Explicit, empty naming context.
    Context,
}

#[derive(Debug, Clone)]
pub struct ServiceEntry {
    pub value: ServiceValue,
    /// Class name reported by listings; defaults to the value's class.
    pub class_name: Option<String>,
    /// Deployment that installed the service, if any.
    pub owner: Option<Owner>,
}

impl ServiceEntry {
    pub fn binding(value: BoundValue) -> Self {
        Self {
            value: ServiceValue::Binding(value),
            class_name: None,
            owner: None,
        }
    }

    pub fn context() -> Self {
        Self {
            value: ServiceValue::Context,
            class_name: None,
            owner: None,
        }
    }

    pub fn with_class_name(mut self, class_name: Option<String>) -> Self {
        self.class_name = class_name;
        self
    }

    pub fn owned_by(mut self, owner: Owner) -> Self {
        self.owner = Some(owner);
        self
    }
}

#[derive(Debug, Error)]
pub enum ServiceRegistryError {
    #[error("Service already installed: {0}")]
    Duplicate(String),

    #[error("Invalid service name: '{0}'")]
    InvalidName(String),
}

pub trait ServiceRegistry: Send + Sync {
    fn get(&self, name: &ServiceName) -> Option<ServiceEntry>;

    /// Install a new service; fails if `name` is already installed.
    fn install(&self, name: ServiceName, entry: ServiceEntry) -> Result<(), ServiceRegistryError>;

    /// Install or replace, returning the previous entry.
    fn replace(&self, name: ServiceName, entry: ServiceEntry) -> Option<ServiceEntry>;

    fn remove(&self, name: &ServiceName) -> Option<ServiceEntry>;

    /// Every service strictly below `prefix`, in name order.
    fn descendants(&self, prefix: &ServiceName) -> Vec<(ServiceName, ServiceEntry)>;
}

#[derive(Default)]
pub struct InMemoryServiceRegistry {
    services: RwLock<BTreeMap<ServiceName, ServiceEntry>>,
}

impl InMemoryServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.services.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.read().is_empty()
    }
}

impl ServiceRegistry for InMemoryServiceRegistry {
    fn get(&self, name: &ServiceName) -> Option<ServiceEntry> {
        self.services.read().get(name).cloned()
    }

    fn install(&self, name: ServiceName, entry: ServiceEntry) -> Result<(), ServiceRegistryError> {
        let mut services = self.services.write();
        if services.contains_key(&name) {
            return Err(ServiceRegistryError::Duplicate(name.to_string()));
        }
        tracing::debug!(service = %name, "Installed naming service");
        services.insert(name, entry);
        Ok(())
    }

    fn replace(&self, name: ServiceName, entry: ServiceEntry) -> Option<ServiceEntry> {
        self.services.write().insert(name, entry)
    }

    fn remove(&self, name: &ServiceName) -> Option<ServiceEntry> {
        let removed = self.services.write().remove(name);
        if removed.is_some() {
            tracing::debug!(service = %name, "Removed naming service");
        }
        removed
    }

    fn descendants(&self, prefix: &ServiceName) -> Vec<(ServiceName, ServiceEntry)> {
        // Descendants sort directly after their ancestor.
        self.services
            .read()
            .range((Bound::Excluded(prefix.clone()), Bound::Unbounded))
            .take_while(|(name, _)| name.starts_with(prefix))
            .map(|(name, entry)| (name.clone(), entry.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(raw: &str) -> ServiceName {
        ServiceName::parse(raw).unwrap()
    }

    #[test]
    fn test_service_name_parse_and_display() {
        let name = service("jboss.naming.context.java");
        assert_eq!(name.len(), 4);
        assert_eq!(name.to_string(), "jboss.naming.context.java");
        assert!(ServiceName::parse("a..b").is_err());
        assert!(ServiceName::parse("").is_err());
    }

    #[test]
    fn test_append_naming_name() {
        let base = service("naming.java");
        let full = base.append(&Name::parse("app/ds").unwrap());
        assert_eq!(full.to_string(), "naming.java.app.ds");
        assert_eq!(full.relative_to(&base).unwrap(), &["app".to_string(), "ds".to_string()]);
    }

    #[test]
    fn test_install_duplicate() {
        let registry = InMemoryServiceRegistry::new();
        registry
            .install(service("a.b"), ServiceEntry::binding(BoundValue::object(1_i32)))
            .unwrap();
        let err = registry
            .install(service("a.b"), ServiceEntry::context())
            .unwrap_err();
        assert!(matches!(err, ServiceRegistryError::Duplicate(ref n) if n == "a.b"));
    }

    #[test]
    fn test_descendants_exclude_prefix_and_siblings() {
        let registry = InMemoryServiceRegistry::new();
        for raw in ["a", "a.b", "a.b.c", "a.d", "ab", "b"] {
            registry.install(service(raw), ServiceEntry::context()).unwrap();
        }
        let names: Vec<String> = registry
            .descendants(&service("a"))
            .into_iter()
            .map(|(name, _)| name.to_string())
            .collect();
        assert_eq!(names, vec!["a.b", "a.b.c", "a.d"]);
    }

    #[test]
    fn test_remove() {
        let registry = InMemoryServiceRegistry::new();
        registry.install(service("x"), ServiceEntry::context()).unwrap();
        assert!(registry.remove(&service("x")).is_some());
        assert!(registry.remove(&service("x")).is_none());
        assert!(registry.is_empty());
    }
}
