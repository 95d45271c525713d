// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Object Factories
//!
//! A [`Reference`] names the factory able to turn it into a live object. The
//! resolution engine looks the factory up by id in an [`ObjectFactoryRegistry`]
//! and re-enters its loop with whatever the factory produced.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::errors::NamingError;
use crate::domain::name::Name;
use crate::domain::value::{BoundValue, Reference};

/// What a factory made of a reference.
#[derive(Debug, Clone)]
pub enum FactoryOutcome {
    /// The reference resolved to a value (object, link, context or another
    /// reference); the engine continues with the original remainder.
    Resolved(BoundValue),
    /// The factory consumed part of the remainder itself; `remaining` is what
    /// is still to be resolved against `resolved`.
    Partial { resolved: BoundValue, remaining: Name },
}

pub trait ObjectFactory: Send + Sync {
    /// Build the object described by `reference`, bound at `name`, with
    /// `remaining` segments still unresolved (empty on a terminal lookup).
    fn get_object_instance(
        &self,
        reference: &Reference,
        name: &Name,
        remaining: &Name,
    ) -> Result<FactoryOutcome, NamingError>;
}

/// Factory built from a closure that ignores the remainder.
pub struct FnObjectFactory<F>(F);

impl<F> FnObjectFactory<F>
where
    F: Fn(&Reference) -> Result<BoundValue, NamingError> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> ObjectFactory for FnObjectFactory<F>
where
    F: Fn(&Reference) -> Result<BoundValue, NamingError> + Send + Sync,
{
    fn get_object_instance(
        &self,
        reference: &Reference,
        _name: &Name,
        _remaining: &Name,
    ) -> Result<FactoryOutcome, NamingError> {
        (self.0)(reference).map(FactoryOutcome::Resolved)
    }
}

#[derive(Clone, Default)]
pub struct ObjectFactoryRegistry {
    factories: HashMap<String, Arc<dyn ObjectFactory>>,
}

impl ObjectFactoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` under `id`, replacing any previous registration.
    pub fn register(&mut self, id: impl Into<String>, factory: Arc<dyn ObjectFactory>) {
        let id = id.into();
        tracing::debug!(factory = %id, "Registered object factory");
        self.factories.insert(id, factory);
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn ObjectFactory>> {
        self.factories.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl std::fmt::Debug for ObjectFactoryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<&String> = self.factories.keys().collect();
        ids.sort();
        f.debug_struct("ObjectFactoryRegistry").field("factories", &ids).finish()
    }
}
