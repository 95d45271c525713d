// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Bootstrap
//!
//! Builds a ready-to-use naming context from a [`NamingConfigManifest`]: an
//! event bus sized from `spec.events`, an in-memory store reporting to it, the
//! configured bindings, and the resolution options from `spec.resolution`.

use std::sync::Arc;
use tracing::info;

use crate::application::event_coordinator::EventCoordinator;
use crate::application::naming_context::NamingContext;
use crate::application::object_factory::ObjectFactoryRegistry;
use crate::domain::errors::NamingError;
use crate::domain::name::Name;
use crate::domain::naming_config::{ConfiguredValue, NamingConfigManifest};
use crate::domain::store::NamingStore;
use crate::domain::value::{BoundValue, Reference};
use crate::infrastructure::event_bus::NamingEventBus;
use crate::infrastructure::in_memory_store::InMemoryNamingStore;

/// Everything [`bootstrap`] wires together.
pub struct Bootstrapped {
    pub context: NamingContext,
    pub store: Arc<InMemoryNamingStore>,
    pub coordinator: Arc<EventCoordinator>,
    pub event_bus: NamingEventBus,
}

impl ConfiguredValue {
    /// Value to bind, or `None` for an explicit sub-context.
    pub fn to_bound_value(&self) -> Option<BoundValue> {
        match self {
            ConfiguredValue::String { value } => Some(BoundValue::object(value.clone())),
            ConfiguredValue::Integer { value } => Some(BoundValue::object(*value)),
            ConfiguredValue::Boolean { value } => Some(BoundValue::object(*value)),
            ConfiguredValue::Link { target } => Some(BoundValue::link(target.clone())),
            ConfiguredValue::Reference {
                class_name,
                factory,
                addresses,
            } => {
                let reference = addresses
                    .iter()
                    .fold(Reference::new(class_name.clone(), factory.clone()), |r, (t, c)| {
                        r.with_address(t.clone(), c.clone())
                    });
                Some(BoundValue::Reference(reference))
            }
            ConfiguredValue::Context => None,
        }
    }
}

/// Bind every configured entry into `store`, in manifest order. Returns the
/// number of entries applied.
pub fn seed_store(store: &dyn NamingStore, manifest: &NamingConfigManifest) -> Result<usize, NamingError> {
    for binding in &manifest.spec.bindings {
        let name = Name::parse(&binding.name)?;
        match binding.value.to_bound_value() {
            Some(value) => store.bind(&name, value, None)?,
            None => store.create_subcontext(&name)?,
        }
    }
    Ok(manifest.spec.bindings.len())
}

/// Validate `manifest`, then wire bus, coordinator, store and context from it.
/// An invalid manifest is rejected before anything is built.
pub fn bootstrap(manifest: &NamingConfigManifest, factories: ObjectFactoryRegistry) -> Result<Bootstrapped, NamingError> {
    manifest
        .validate()
        .map_err(|e| NamingError::InvalidConfiguration(format!("{:#}", e)))?;

    let event_bus = NamingEventBus::new(manifest.spec.events.bus_capacity);
    let coordinator = Arc::new(EventCoordinator::with_event_bus(event_bus.clone()));
    let store = Arc::new(InMemoryNamingStore::with_event_coordinator(Arc::clone(&coordinator)));

    let seeded = seed_store(store.as_ref(), manifest)?;
    info!(
        config = %manifest.metadata.name,
        bindings = seeded,
        max_link_depth = manifest.spec.resolution.max_link_depth,
        "Naming store bootstrapped"
    );

    let context = NamingContext::new(store.clone())
        .with_factories(factories)
        .with_resolution_config(&manifest.spec.resolution);

    Ok(Bootstrapped {
        context,
        store,
        coordinator,
        event_bus,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::naming_context::Resolved;

    const MANIFEST: &str = r#"
apiVersion: nomen/v1
kind: NamingConfig
metadata:
  name: test
spec:
  resolution:
    max_link_depth: 4
  bindings:
    - name: java/app/greeting
      value: { type: string, value: hello }
    - name: java/app/alias
      value: { type: link, target: ./greeting }
    - name: java/app/port
      value: { type: integer, value: 8080 }
    - name: java/global
      value: { type: context }
    - name: java/app/pool
      value:
        type: reference
        class_name: Pool
        factory: pool
        addresses: { url: "mem:", size: "4" }
"#;

    #[test]
    fn test_bootstrap_seeds_bindings() {
        let manifest = NamingConfigManifest::from_yaml_str(MANIFEST).unwrap();
        let booted = bootstrap(&manifest, ObjectFactoryRegistry::new()).unwrap();
        let ctx = &booted.context;

        assert_eq!(ctx.max_link_depth(), 4);
        let greeting = ctx.lookup_str("java/app/alias").unwrap().into_object().unwrap();
        assert_eq!(greeting.downcast_ref::<String>().map(String::as_str), Some("hello"));

        let port = ctx.lookup_str("java/app/port").unwrap().into_object().unwrap();
        assert_eq!(port.downcast_ref::<i64>(), Some(&8080));

        assert!(matches!(ctx.lookup_str("java/global").unwrap(), Resolved::Context(_)));

        match ctx.lookup_str("java/app/pool").unwrap() {
            Resolved::Reference(reference) => {
                assert_eq!(reference.address("size"), Some("4"));
                assert_eq!(reference.addresses.len(), 2);
            }
            other => panic!("expected reference, got {:?}", other),
        }
    }

    #[test]
    fn test_seed_rejects_duplicate_names() {
        let mut manifest = NamingConfigManifest::from_yaml_str(MANIFEST).unwrap();
        let first = manifest.spec.bindings[0].clone();
        manifest.spec.bindings.push(first);

        let store = InMemoryNamingStore::new();
        assert!(matches!(
            seed_store(&store, &manifest),
            Err(NamingError::NameAlreadyBound(_))
        ));
    }

    #[test]
    fn test_bootstrap_wires_event_bus() {
        let manifest = NamingConfigManifest::from_yaml_str(MANIFEST).unwrap();
        let booted = bootstrap(&manifest, ObjectFactoryRegistry::new()).unwrap();
        let mut receiver = booted.event_bus.subscribe();

        booted
            .context
            .bind(&Name::parse("java/app/late").unwrap(), BoundValue::object(1_u8))
            .unwrap();
        let record = receiver.try_recv().unwrap();
        assert_eq!(record.name.to_string(), "java/app/late");
    }

    #[test]
    fn test_bootstrap_rejects_invalid_manifest() {
        let mut manifest = NamingConfigManifest::from_yaml_str(MANIFEST).unwrap();
        manifest.spec.events.bus_capacity = 0;
        match bootstrap(&manifest, ObjectFactoryRegistry::new()) {
            Err(NamingError::InvalidConfiguration(reason)) => assert!(reason.contains("bus_capacity")),
            Err(other) => panic!("expected invalid configuration, got {}", other),
            Ok(_) => panic!("expected invalid configuration"),
        }

        let mut manifest = NamingConfigManifest::from_yaml_str(MANIFEST).unwrap();
        manifest.spec.resolution.max_link_depth = 0;
        assert!(matches!(
            bootstrap(&manifest, ObjectFactoryRegistry::new()),
            Err(NamingError::InvalidConfiguration(_))
        ));
    }
}
