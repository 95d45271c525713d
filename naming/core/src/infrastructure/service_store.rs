// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Service-Backed Naming Stores
//!
//! Naming stores whose bindings live in a [`ServiceRegistry`]. A naming name
//! maps to `base + segments`, so `app/ds` under base `naming.java` is the
//! service `naming.java.app.ds`. Any name with installed descendants is an
//! implicit context.
//!
//! [`ServiceBackedStore`] is read-only. [`WritableServiceBackedStore`] accepts
//! writes only through its inherent methods, which take the caller's
//! [`OwnerStack`]: the owner on top of the stack is recorded on every
//! installed entry, and an empty stack is rejected with
//! [`NamingError::ReadOnly`]. The `NamingStore` write methods, which carry no
//! owner, stay read-only.
//!
//! Writes through one [`WritableServiceBackedStore`] are serialized, so the
//! ancestor and descendant checks and the registry update they guard happen
//! as one step. Listeners are notified after the write lock is released.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::application::event_coordinator::EventCoordinator;
use crate::domain::errors::NamingError;
use crate::domain::events::{EventScope, NamingEventKind};
use crate::domain::name::Name;
use crate::domain::owner::{Owner, OwnerStack};
use crate::domain::store::{NamingStore, ResolveResult, StoreEntry};
use crate::domain::value::{Binding, BoundValue};
use crate::infrastructure::service_registry::{
    ServiceEntry, ServiceName, ServiceRegistry, ServiceRegistryError, ServiceValue,
};

fn describe(name: &str, entry: &ServiceEntry) -> Binding {
    match &entry.value {
        ServiceValue::Context => Binding::subcontext(name),
        ServiceValue::Binding(value) => match &entry.class_name {
            Some(class_name) => Binding::with_class_name(name, class_name.clone(), value.clone()),
            None => Binding::bound(name, value.clone()),
        },
    }
}

/// Read-only naming view over a service registry.
pub struct ServiceBackedStore {
    registry: Arc<dyn ServiceRegistry>,
    base: ServiceName,
}

impl ServiceBackedStore {
    pub fn new(registry: Arc<dyn ServiceRegistry>, base: ServiceName) -> Self {
        Self { registry, base }
    }

    pub fn base(&self) -> &ServiceName {
        &self.base
    }

    pub fn registry(&self) -> &Arc<dyn ServiceRegistry> {
        &self.registry
    }

    fn service_name(&self, name: &Name) -> ServiceName {
        self.base.append(name)
    }

    fn has_descendants(&self, service: &ServiceName) -> bool {
        !self.registry.descendants(service).is_empty()
    }

    /// Nearest ancestor of `name` bound to a value, as a continuation.
    fn bound_ancestor(&self, name: &Name) -> Option<ResolveResult> {
        (1..name.len()).rev().find_map(|i| {
            let prefix = name.prefix(i);
            match self.registry.get(&self.service_name(&prefix))?.value {
                ServiceValue::Binding(value) => Some(ResolveResult {
                    resolved: value,
                    resolved_name: prefix,
                    remaining: name.suffix(i),
                }),
                ServiceValue::Context => None,
            }
        })
    }

    fn children(&self, name: &Name) -> Vec<Binding> {
        let service = self.service_name(name);
        let mut children: BTreeMap<String, Binding> = BTreeMap::new();
        for (descendant, entry) in self.registry.descendants(&service) {
            let Some(relative) = descendant.relative_to(&service) else {
                continue;
            };
            let Some(first) = relative.first() else {
                continue;
            };
            if relative.len() == 1 {
                children.insert(first.clone(), describe(first, &entry));
            } else {
                children
                    .entry(first.clone())
                    .or_insert_with(|| Binding::subcontext(first.clone()));
            }
        }
        children.into_values().collect()
    }
}

impl NamingStore for ServiceBackedStore {
    fn lookup(&self, name: &Name) -> Result<StoreEntry, NamingError> {
        if name.is_empty() {
            return Ok(StoreEntry::Context);
        }
        let service = self.service_name(name);
        if let Some(entry) = self.registry.get(&service) {
            return Ok(match entry.value {
                ServiceValue::Binding(value) => StoreEntry::Bound(value),
                ServiceValue::Context => StoreEntry::Context,
            });
        }
        if let Some(partial) = self.bound_ancestor(name) {
            return Ok(StoreEntry::Partial(partial));
        }
        if self.has_descendants(&service) {
            return Ok(StoreEntry::Context);
        }
        Err(NamingError::not_found(name))
    }

    fn list_bindings(&self, name: &Name) -> Result<Vec<Binding>, NamingError> {
        match self.lookup(name)? {
            StoreEntry::Context => Ok(self.children(name)),
            StoreEntry::Bound(BoundValue::Context(foreign)) => foreign.list_bindings(&Name::root()),
            StoreEntry::Partial(ResolveResult {
                resolved: BoundValue::Context(foreign),
                remaining,
                ..
            }) => foreign.list_bindings(&remaining),
            _ => Err(NamingError::NotContext(name.to_string())),
        }
    }
}

/// Service-backed store writable by the deployment owning the current
/// [`OwnerStack`] entry.
pub struct WritableServiceBackedStore {
    inner: ServiceBackedStore,
    coordinator: Option<Arc<EventCoordinator>>,
    writes: Mutex<()>,
}

impl WritableServiceBackedStore {
    pub fn new(registry: Arc<dyn ServiceRegistry>, base: ServiceName) -> Self {
        Self {
            inner: ServiceBackedStore::new(registry, base),
            coordinator: None,
            writes: Mutex::new(()),
        }
    }

    pub fn with_event_coordinator(mut self, coordinator: Arc<EventCoordinator>) -> Self {
        self.coordinator = Some(coordinator);
        self
    }

    fn require_owner<'a>(owners: &'a OwnerStack, operation: &str, name: &Name) -> Result<&'a Owner, NamingError> {
        owners.current().ok_or_else(|| {
            warn!(operation, name = %name, "Rejected naming write without an owner");
            NamingError::read_only(operation)
        })
    }

    fn writable_name(name: &Name) -> Result<(), NamingError> {
        if name.is_empty() {
            return Err(NamingError::InvalidName("an empty name cannot be bound".to_string()));
        }
        Ok(())
    }

    /// Intermediate segments must be contexts. A bound federated context
    /// takes the write over; anything else bound on the way is `NotContext`.
    fn check_parents(&self, name: &Name) -> Result<Option<(Arc<dyn NamingStore>, Name)>, NamingError> {
        match self.inner.bound_ancestor(name) {
            None => Ok(None),
            Some(ResolveResult {
                resolved: BoundValue::Context(foreign),
                remaining,
                ..
            }) => Ok(Some((foreign, remaining))),
            Some(partial) => Err(NamingError::NotContext(partial.resolved_name.to_string())),
        }
    }

    fn fire(&self, name: &Name, new_binding: Option<Binding>, old_binding: Option<Binding>, kind: NamingEventKind) {
        if let Some(coordinator) = &self.coordinator {
            coordinator.fire_event(
                &Name::root(),
                name,
                new_binding,
                old_binding,
                kind,
                None,
                &EventScope::ALL,
            );
        }
    }

    pub fn bind(
        &self,
        owners: &OwnerStack,
        name: &Name,
        value: BoundValue,
        class_name: Option<String>,
    ) -> Result<(), NamingError> {
        let owner = Self::require_owner(owners, "bind", name)?;
        Self::writable_name(name)?;
        let added = {
            let guard = self.writes.lock();
            if let Some((foreign, rest)) = self.check_parents(name)? {
                drop(guard);
                return foreign.bind(&rest, value, class_name);
            }

            let service = self.inner.service_name(name);
            if self.inner.has_descendants(&service) {
                return Err(NamingError::NameAlreadyBound(name.to_string()));
            }
            let entry = ServiceEntry::binding(value)
                .with_class_name(class_name)
                .owned_by(owner.clone());
            let added = describe(&name.to_string(), &entry);
            self.inner
                .registry
                .install(service, entry)
                .map_err(|e| match e {
                    ServiceRegistryError::Duplicate(_) => NamingError::NameAlreadyBound(name.to_string()),
                    ServiceRegistryError::InvalidName(n) => NamingError::InvalidName(n),
                })?;
            added
        };

        debug!(name = %name, owner = %owner, "Bound service-backed name");
        self.fire(name, Some(added), None, NamingEventKind::ObjectAdded);
        Ok(())
    }

    pub fn rebind(
        &self,
        owners: &OwnerStack,
        name: &Name,
        value: BoundValue,
        class_name: Option<String>,
    ) -> Result<(), NamingError> {
        let owner = Self::require_owner(owners, "rebind", name)?;
        Self::writable_name(name)?;
        let (added, previous) = {
            let guard = self.writes.lock();
            if let Some((foreign, rest)) = self.check_parents(name)? {
                drop(guard);
                return foreign.rebind(&rest, value, class_name);
            }

            // A context with children cannot be replaced by a value.
            let service = self.inner.service_name(name);
            if self.inner.has_descendants(&service) {
                return Err(NamingError::ContextNotEmpty(name.to_string()));
            }
            let entry = ServiceEntry::binding(value)
                .with_class_name(class_name)
                .owned_by(owner.clone());
            let added = describe(&name.to_string(), &entry);
            let previous = self
                .inner
                .registry
                .replace(service, entry)
                .map(|old| describe(&name.to_string(), &old));
            (added, previous)
        };

        debug!(name = %name, owner = %owner, replaced = previous.is_some(), "Rebound service-backed name");
        let kind = if previous.is_some() {
            NamingEventKind::ObjectChanged
        } else {
            NamingEventKind::ObjectAdded
        };
        self.fire(name, Some(added), previous, kind);
        Ok(())
    }

    /// Remove a binding. Any owner may unbind, not only the one that bound it.
    pub fn unbind(&self, owners: &OwnerStack, name: &Name) -> Result<(), NamingError> {
        let owner = Self::require_owner(owners, "unbind", name)?;
        Self::writable_name(name)?;
        let removed = {
            let guard = self.writes.lock();
            if let Some((foreign, rest)) = self.check_parents(name)? {
                drop(guard);
                return foreign.unbind(&rest);
            }

            let service = self.inner.service_name(name);
            if matches!(
                self.inner.registry.get(&service).map(|e| e.value),
                Some(ServiceValue::Context)
            ) && self.inner.has_descendants(&service)
            {
                return Err(NamingError::ContextNotEmpty(name.to_string()));
            }
            self.inner
                .registry
                .remove(&service)
                .ok_or_else(|| NamingError::not_found(name))?
        };

        debug!(name = %name, owner = %owner, "Unbound service-backed name");
        self.fire(name, None, Some(describe(&name.to_string(), &removed)), NamingEventKind::ObjectRemoved);
        Ok(())
    }

    pub fn create_subcontext(&self, owners: &OwnerStack, name: &Name) -> Result<(), NamingError> {
        let owner = Self::require_owner(owners, "create_subcontext", name)?;
        Self::writable_name(name)?;
        {
            let guard = self.writes.lock();
            if let Some((foreign, rest)) = self.check_parents(name)? {
                drop(guard);
                return foreign.create_subcontext(&rest);
            }

            let service = self.inner.service_name(name);
            if self.inner.has_descendants(&service) {
                return Err(NamingError::NameAlreadyBound(name.to_string()));
            }
            self.inner
                .registry
                .install(service, ServiceEntry::context().owned_by(owner.clone()))
                .map_err(|_| NamingError::NameAlreadyBound(name.to_string()))?;
        }

        debug!(name = %name, owner = %owner, "Created service-backed subcontext");
        self.fire(
            name,
            Some(Binding::subcontext(name.to_string())),
            None,
            NamingEventKind::ObjectAdded,
        );
        Ok(())
    }

    /// Remove every entry installed by `owner`. Returns how many were removed.
    pub fn release(&self, owner: &Owner) -> usize {
        let base = &self.inner.base;
        let removed: Vec<(ServiceName, ServiceEntry)> = {
            let _guard = self.writes.lock();
            self.inner
                .registry
                .descendants(base)
                .into_iter()
                .filter(|(_, entry)| entry.owner.as_ref() == Some(owner))
                .filter_map(|(service, _)| {
                    let entry = self.inner.registry.remove(&service)?;
                    Some((service, entry))
                })
                .collect()
        };

        let released = removed.len();
        for (service, removed) in removed {
            let Some(relative) = service.relative_to(base) else {
                continue;
            };
            if let Ok(name) = Name::from_segments(relative.iter().cloned()) {
                self.fire(
                    &name,
                    None,
                    Some(describe(&name.to_string(), &removed)),
                    NamingEventKind::ObjectRemoved,
                );
            }
        }
        debug!(owner = %owner, released, "Released owner's naming entries");
        released
    }
}

impl NamingStore for WritableServiceBackedStore {
    fn lookup(&self, name: &Name) -> Result<StoreEntry, NamingError> {
        self.inner.lookup(name)
    }

    fn list_bindings(&self, name: &Name) -> Result<Vec<Binding>, NamingError> {
        self.inner.list_bindings(name)
    }

    fn event_coordinator(&self) -> Option<Arc<EventCoordinator>> {
        self.coordinator.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value::CONTEXT_CLASS;
    use crate::infrastructure::service_registry::InMemoryServiceRegistry;
    use std::sync::Barrier;

    fn name(raw: &str) -> Name {
        Name::parse(raw).unwrap()
    }

    fn registry() -> Arc<InMemoryServiceRegistry> {
        Arc::new(InMemoryServiceRegistry::new())
    }

    fn base() -> ServiceName {
        ServiceName::parse("naming.java").unwrap()
    }

    #[test]
    fn test_read_only_store_lookup_and_list() {
        let registry = registry();
        registry
            .install(
                base().append(&name("app/ds")),
                ServiceEntry::binding(BoundValue::object(1_i32)),
            )
            .unwrap();
        let store = ServiceBackedStore::new(registry, base());

        assert!(matches!(store.lookup(&name("app/ds")).unwrap(), StoreEntry::Bound(_)));
        assert!(matches!(store.lookup(&name("app")).unwrap(), StoreEntry::Context));
        assert!(matches!(store.lookup(&Name::root()).unwrap(), StoreEntry::Context));
        assert!(matches!(store.lookup(&name("nope")), Err(NamingError::NameNotFound { .. })));

        let root = store.list(&Name::root()).unwrap();
        assert_eq!(root.len(), 1);
        assert_eq!(root[0].name, "app");
    }

    #[test]
    fn test_read_only_store_partial() {
        let registry = registry();
        registry
            .install(base().append(&name("link")), ServiceEntry::binding(BoundValue::link("other")))
            .unwrap();
        let store = ServiceBackedStore::new(registry, base());

        match store.lookup(&name("link/a/b")).unwrap() {
            StoreEntry::Partial(partial) => {
                assert_eq!(partial.resolved_name, name("link"));
                assert_eq!(partial.remaining, name("a/b"));
            }
            other => panic!("expected partial, got {:?}", other),
        }
    }

    #[test]
    fn test_read_only_store_rejects_writes() {
        let store = ServiceBackedStore::new(registry(), base());
        assert!(matches!(
            store.bind(&name("x"), BoundValue::object(1_i32), None),
            Err(NamingError::ReadOnly { .. })
        ));
        assert!(matches!(store.unbind(&name("x")), Err(NamingError::ReadOnly { .. })));
        assert!(matches!(store.create_subcontext(&name("x")), Err(NamingError::ReadOnly { .. })));
    }

    #[test]
    fn test_writable_requires_owner() {
        let store = WritableServiceBackedStore::new(registry(), base());
        let mut owners = OwnerStack::new();

        let denied = store.bind(&owners, &name("x"), BoundValue::object(1_i32), None);
        assert!(matches!(denied, Err(NamingError::ReadOnly { .. })));

        owners.push(Owner::new("app.war"));
        store.bind(&owners, &name("x"), BoundValue::object(1_i32), None).unwrap();
        owners.pop();

        let denied = store.bind(&owners, &name("y"), BoundValue::object(2_i32), None);
        assert!(matches!(denied, Err(NamingError::ReadOnly { .. })));
        assert!(matches!(store.lookup(&name("x")).unwrap(), StoreEntry::Bound(_)));
    }

    #[test]
    fn test_trait_writes_stay_read_only() {
        let store = WritableServiceBackedStore::new(registry(), base());
        assert!(matches!(
            NamingStore::bind(&store, &name("x"), BoundValue::object(1_i32), None),
            Err(NamingError::ReadOnly { .. })
        ));
    }

    #[test]
    fn test_writable_bind_conflicts_and_unbind() {
        let store = WritableServiceBackedStore::new(registry(), base());
        let mut owners = OwnerStack::new();
        owners.push(Owner::new("dep"));

        store.bind(&owners, &name("a/b"), BoundValue::object(1_i32), None).unwrap();
        assert!(matches!(
            store.bind(&owners, &name("a/b"), BoundValue::object(2_i32), None),
            Err(NamingError::NameAlreadyBound(_))
        ));
        // `a` is an implicit context
        assert!(matches!(
            store.bind(&owners, &name("a"), BoundValue::object(2_i32), None),
            Err(NamingError::NameAlreadyBound(_))
        ));
        assert!(matches!(
            store.bind(&owners, &name("a/b/c"), BoundValue::object(2_i32), None),
            Err(NamingError::NotContext(_))
        ));

        store.unbind(&owners, &name("a/b")).unwrap();
        assert!(matches!(store.lookup(&name("a/b")), Err(NamingError::NameNotFound { .. })));
        assert!(matches!(
            store.unbind(&owners, &name("a/b")),
            Err(NamingError::NameNotFound { .. })
        ));
    }

    #[test]
    fn test_release_removes_only_owned_entries() {
        let store = WritableServiceBackedStore::new(registry(), base());
        let mut owners = OwnerStack::new();

        owners.scoped(Owner::new("one.war"), |owners| {
            store.bind(owners, &name("one/a"), BoundValue::object(1_i32), None).unwrap();
            store.create_subcontext(owners, &name("one/ctx")).unwrap();
        });
        owners.scoped(Owner::new("two.war"), |owners| {
            store.bind(owners, &name("two/a"), BoundValue::object(2_i32), None).unwrap();
        });

        assert_eq!(store.release(&Owner::new("one.war")), 2);
        assert!(matches!(store.lookup(&name("one")), Err(NamingError::NameNotFound { .. })));
        assert!(matches!(store.lookup(&name("two/a")).unwrap(), StoreEntry::Bound(_)));
    }

    #[test]
    fn test_rebind_replaces() {
        let store = WritableServiceBackedStore::new(registry(), base());
        let mut owners = OwnerStack::new();
        owners.push(Owner::new("dep"));

        store.rebind(&owners, &name("k"), BoundValue::object(1_i32), None).unwrap();
        store
            .rebind(&owners, &name("k"), BoundValue::object(2_i32), Some("Two".to_string()))
            .unwrap();
        let listed = store.list(&Name::root()).unwrap();
        assert_eq!(listed[0].class_name, "Two");
    }

    #[test]
    fn test_rebind_over_populated_context_is_rejected() {
        let store = WritableServiceBackedStore::new(registry(), base());
        let mut owners = OwnerStack::new();
        owners.push(Owner::new("dep"));

        store.bind(&owners, &name("a/b"), BoundValue::object(1_i32), None).unwrap();
        assert!(matches!(
            store.rebind(&owners, &name("a"), BoundValue::object(2_i32), None),
            Err(NamingError::ContextNotEmpty(_))
        ));
        assert!(matches!(store.lookup(&name("a")).unwrap(), StoreEntry::Context));
        let root = store.list(&Name::root()).unwrap();
        assert_eq!(root.len(), 1);
        assert_eq!(root[0].class_name, CONTEXT_CLASS);

        // An empty explicit context may still be replaced.
        store.create_subcontext(&owners, &name("empty")).unwrap();
        store.rebind(&owners, &name("empty"), BoundValue::object(3_i32), None).unwrap();
        assert!(matches!(store.lookup(&name("empty")).unwrap(), StoreEntry::Bound(_)));
    }

    #[test]
    fn test_concurrent_parent_and_child_binds_never_both_succeed() {
        for _ in 0..200 {
            let store = WritableServiceBackedStore::new(registry(), base());
            let barrier = Barrier::new(2);
            let mut owners = OwnerStack::new();
            owners.push(Owner::new("dep"));

            let (parent, child) = std::thread::scope(|scope| {
                let parent = scope.spawn(|| {
                    barrier.wait();
                    store.bind(&owners, &name("a"), BoundValue::object(1_i32), None)
                });
                let child = scope.spawn(|| {
                    barrier.wait();
                    store.bind(&owners, &name("a/b"), BoundValue::object(2_i32), None)
                });
                (parent.join().unwrap(), child.join().unwrap())
            });

            assert!(parent.is_ok() != child.is_ok(), "exactly one bind must win");
            match parent {
                Ok(()) => assert!(matches!(child, Err(NamingError::NotContext(_)))),
                Err(e) => assert!(matches!(e, NamingError::NameAlreadyBound(_))),
            }
        }
    }
}
