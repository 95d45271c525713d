// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Naming Store Contract
//!
//! A naming store owns a tree of bindings addressed by [`Name`]. Stores do not
//! interpret links, references or federated contexts; they report what is
//! bound and leave resolution to [`crate::application::naming_context::NamingContext`].
//!
//! | Implementation | Writes |
//! |----------------|--------|
//! | `InMemoryNamingStore` | all operations |
//! | `ServiceBackedStore` | read-only |
//! | `WritableServiceBackedStore` | only through an explicit owner stack |
//!
//! Write operations default to [`NamingError::ReadOnly`] so read-only
//! adapters implement the read half only.

use std::sync::Arc;

use crate::application::event_coordinator::EventCoordinator;
use crate::domain::errors::NamingError;
use crate::domain::name::Name;
use crate::domain::value::{Binding, BoundValue, NameClassPair};

/// Continuation produced when an intermediate segment is a binding rather
/// than a context of this store.
#[derive(Debug, Clone)]
pub struct ResolveResult {
    /// Value bound at `resolved_name`.
    pub resolved: BoundValue,
    /// Name (relative to the store root) at which `resolved` is bound.
    pub resolved_name: Name,
    /// Segments still to be resolved against `resolved`.
    pub remaining: Name,
}

/// What a store finds at a name.
#[derive(Debug, Clone)]
pub enum StoreEntry {
    /// Exact binding.
    Bound(BoundValue),
    /// Root, explicit or implicit sub-context.
    Context,
    /// Intermediate segment is a binding; the rest is a continuation.
    Partial(ResolveResult),
}

pub trait NamingStore: Send + Sync {
    fn lookup(&self, name: &Name) -> Result<StoreEntry, NamingError>;

    /// Immediate children of the context at `name`.
    fn list(&self, name: &Name) -> Result<Vec<NameClassPair>, NamingError> {
        Ok(self
            .list_bindings(name)?
            .iter()
            .map(Binding::name_class_pair)
            .collect())
    }

    /// Immediate children of the context at `name`, with values.
    fn list_bindings(&self, name: &Name) -> Result<Vec<Binding>, NamingError>;

    fn bind(&self, _name: &Name, _value: BoundValue, _class_name: Option<String>) -> Result<(), NamingError> {
        Err(NamingError::read_only("bind"))
    }

    fn rebind(&self, _name: &Name, _value: BoundValue, _class_name: Option<String>) -> Result<(), NamingError> {
        Err(NamingError::read_only("rebind"))
    }

    fn unbind(&self, _name: &Name) -> Result<(), NamingError> {
        Err(NamingError::read_only("unbind"))
    }

    fn rename(&self, _old_name: &Name, _new_name: &Name) -> Result<(), NamingError> {
        Err(NamingError::read_only("rename"))
    }

    fn create_subcontext(&self, _name: &Name) -> Result<(), NamingError> {
        Err(NamingError::read_only("create_subcontext"))
    }

    fn destroy_subcontext(&self, _name: &Name) -> Result<(), NamingError> {
        Err(NamingError::read_only("destroy_subcontext"))
    }

    /// Coordinator notified of changes to this store, if any.
    fn event_coordinator(&self) -> Option<Arc<EventCoordinator>> {
        None
    }

    /// Tear the store down. Later operations fail with [`NamingError::Closed`].
    fn close(&self) -> Result<(), NamingError> {
        Ok(())
    }
}
