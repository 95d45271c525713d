// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Naming Event Coordinator
//!
//! Registry of `(path, scope) → listener` registrations. Stores call
//! [`EventCoordinator::fire_event`] after every mutation; the coordinator
//! selects the registrations whose scope contains the changed path
//! ([`scope_matches`]) and invokes the typed callback of each one.
//!
//! Listeners run synchronously on the thread that fired the event, after the
//! registry lock has been released, so a listener may register or remove
//! listeners itself. When an event bus is attached, every fired event is also
//! published to it as a [`crate::domain::events::NamingEventRecord`].
//!
//! A rename is one event keyed by the destination name. It reaches every
//! registration containing the destination, plus object-scope registrations
//! on the source name, each at most once.

use chrono::Utc;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::domain::events::{scope_matches, EventScope, NamingEvent, NamingEventKind};
use crate::domain::name::Name;
use crate::domain::value::Binding;
use crate::infrastructure::event_bus::NamingEventBus;

/// Receiver of naming change notifications. All callbacks default to no-ops.
pub trait NamingListener: Send + Sync {
    fn object_added(&self, _event: &NamingEvent) {}
    fn object_removed(&self, _event: &NamingEvent) {}
    fn object_changed(&self, _event: &NamingEvent) {}
    fn object_renamed(&self, _event: &NamingEvent) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl ListenerId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct Registration {
    id: ListenerId,
    path: Name,
    scope: EventScope,
    listener: Arc<dyn NamingListener>,
}

pub struct EventCoordinator {
    registrations: RwLock<Vec<Registration>>,
    bus: Option<NamingEventBus>,
}

impl EventCoordinator {
    pub fn new() -> Self {
        Self {
            registrations: RwLock::new(Vec::new()),
            bus: None,
        }
    }

    /// Coordinator that also publishes every fired event to `bus`.
    pub fn with_event_bus(bus: NamingEventBus) -> Self {
        Self {
            registrations: RwLock::new(Vec::new()),
            bus: Some(bus),
        }
    }

    pub fn event_bus(&self) -> Option<&NamingEventBus> {
        self.bus.as_ref()
    }

    pub fn add_listener(
        &self,
        path: Name,
        scope: EventScope,
        listener: Arc<dyn NamingListener>,
    ) -> ListenerId {
        let id = ListenerId::new();
        debug!(listener_id = %id, path = %path, ?scope, "Registered naming listener");
        self.registrations.write().push(Registration {
            id,
            path,
            scope,
            listener,
        });
        id
    }

    /// Returns false when no registration has that id.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut registrations = self.registrations.write();
        let before = registrations.len();
        registrations.retain(|r| r.id != id);
        before != registrations.len()
    }

    pub fn listener_count(&self) -> usize {
        self.registrations.read().len()
    }

    /// Notify every registration whose scope is in `scopes` and contains
    /// `context + name`. Returns the number of listeners invoked.
    #[allow(clippy::too_many_arguments)]
    pub fn fire_event(
        &self,
        context: &Name,
        name: &Name,
        new_binding: Option<Binding>,
        old_binding: Option<Binding>,
        kind: NamingEventKind,
        change_info: Option<&str>,
        scopes: &[EventScope],
    ) -> usize {
        let path = context.join(name);
        let event = NamingEvent {
            kind,
            context: context.clone(),
            name: path.clone(),
            new_binding,
            old_binding,
            change_info: change_info.map(str::to_string),
            occurred_at: Utc::now(),
        };

        self.deliver(event, |r| scopes.contains(&r.scope) && scope_matches(&r.path, r.scope, &path))
    }

    /// Report that the binding at `context + old_name` moved to
    /// `context + new_name`. Returns the number of listeners invoked.
    pub fn fire_rename(
        &self,
        context: &Name,
        old_name: &Name,
        new_name: &Name,
        new_binding: Option<Binding>,
        old_binding: Option<Binding>,
        change_info: Option<&str>,
    ) -> usize {
        let source = context.join(old_name);
        let path = context.join(new_name);
        let event = NamingEvent {
            kind: NamingEventKind::ObjectRenamed,
            context: context.clone(),
            name: path.clone(),
            new_binding,
            old_binding,
            change_info: change_info.map(str::to_string),
            occurred_at: Utc::now(),
        };

        self.deliver(event, |r| {
            scope_matches(&r.path, r.scope, &path) || (r.scope == EventScope::Object && r.path == source)
        })
    }

    fn deliver(&self, event: NamingEvent, selected: impl Fn(&Registration) -> bool) -> usize {
        let kind = event.kind;
        let path = &event.name;
        let targets: Vec<Arc<dyn NamingListener>> = self
            .registrations
            .read()
            .iter()
            .filter(|r| selected(*r))
            .map(|r| Arc::clone(&r.listener))
            .collect();

        debug!(
            kind = kind.as_str(),
            path = %path,
            listeners = targets.len(),
            "Firing naming event"
        );
        metrics::counter!("nomen_events_fired_total", "kind" => kind.as_str()).increment(1);

        for listener in &targets {
            match kind {
                NamingEventKind::ObjectAdded => listener.object_added(&event),
                NamingEventKind::ObjectRemoved => listener.object_removed(&event),
                NamingEventKind::ObjectChanged => listener.object_changed(&event),
                NamingEventKind::ObjectRenamed => listener.object_renamed(&event),
            }
        }

        if let Some(bus) = &self.bus {
            bus.publish(event.record());
        }

        targets.len()
    }
}

impl Default for EventCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<(NamingEventKind, String)>>,
    }

    impl Recorder {
        fn names(&self) -> Vec<String> {
            self.seen.lock().iter().map(|(_, n)| n.clone()).collect()
        }
    }

    impl NamingListener for Recorder {
        fn object_added(&self, event: &NamingEvent) {
            self.seen.lock().push((event.kind, event.name.to_string()));
        }
        fn object_removed(&self, event: &NamingEvent) {
            self.seen.lock().push((event.kind, event.name.to_string()));
        }
        fn object_renamed(&self, event: &NamingEvent) {
            self.seen.lock().push((event.kind, event.name.to_string()));
        }
    }

    fn name(raw: &str) -> Name {
        Name::parse(raw).unwrap()
    }

    fn fire(coordinator: &EventCoordinator, path: &str, kind: NamingEventKind) -> usize {
        coordinator.fire_event(&Name::root(), &name(path), None, None, kind, None, &EventScope::ALL)
    }

    #[test]
    fn test_subtree_listener_fires_for_descendant() {
        let coordinator = EventCoordinator::new();
        let recorder = Arc::new(Recorder::default());
        coordinator.add_listener(name("foo"), EventScope::Subtree, recorder.clone());

        assert_eq!(fire(&coordinator, "foo/bar/baz", NamingEventKind::ObjectAdded), 1);
        assert_eq!(recorder.names(), vec!["foo/bar/baz".to_string()]);
    }

    #[test]
    fn test_object_listener_ignores_ancestor_event() {
        let coordinator = EventCoordinator::new();
        let recorder = Arc::new(Recorder::default());
        coordinator.add_listener(name("foo/bar/baz"), EventScope::Object, recorder.clone());

        assert_eq!(fire(&coordinator, "foo/bar", NamingEventKind::ObjectAdded), 0);
        assert!(recorder.names().is_empty());
    }

    #[test]
    fn test_requested_scopes_filter_registrations() {
        let coordinator = EventCoordinator::new();
        let recorder = Arc::new(Recorder::default());
        coordinator.add_listener(name("foo"), EventScope::Subtree, recorder.clone());

        let fired = coordinator.fire_event(
            &Name::root(),
            &name("foo/bar"),
            None,
            None,
            NamingEventKind::ObjectAdded,
            None,
            &[EventScope::Object, EventScope::OneLevel],
        );
        assert_eq!(fired, 0);
    }

    #[test]
    fn test_each_matching_registration_fires_once() {
        let coordinator = EventCoordinator::new();
        let recorder = Arc::new(Recorder::default());
        coordinator.add_listener(name("foo"), EventScope::Subtree, recorder.clone());
        coordinator.add_listener(name("foo"), EventScope::OneLevel, recorder.clone());
        coordinator.add_listener(name("foo/bar"), EventScope::Object, recorder.clone());

        assert_eq!(fire(&coordinator, "foo/bar", NamingEventKind::ObjectRemoved), 3);
        assert_eq!(recorder.names().len(), 3);
    }

    #[test]
    fn test_context_is_prefixed_to_name() {
        let coordinator = EventCoordinator::new();
        let recorder = Arc::new(Recorder::default());
        coordinator.add_listener(name("java/app/x"), EventScope::Object, recorder.clone());

        coordinator.fire_event(
            &name("java/app"),
            &name("x"),
            None,
            None,
            NamingEventKind::ObjectRenamed,
            Some("rename"),
            &EventScope::ALL,
        );
        assert_eq!(recorder.names(), vec!["java/app/x".to_string()]);
    }

    #[test]
    fn test_remove_listener() {
        let coordinator = EventCoordinator::new();
        let recorder = Arc::new(Recorder::default());
        let id = coordinator.add_listener(name("foo"), EventScope::Subtree, recorder.clone());
        assert_eq!(coordinator.listener_count(), 1);

        assert!(coordinator.remove_listener(id));
        assert!(!coordinator.remove_listener(id));
        assert_eq!(fire(&coordinator, "foo", NamingEventKind::ObjectAdded), 0);
    }

    #[test]
    fn test_rename_reaches_source_and_destination_listeners_once() {
        let coordinator = EventCoordinator::new();
        let source = Arc::new(Recorder::default());
        let destination = Arc::new(Recorder::default());
        let tree = Arc::new(Recorder::default());
        let bystander = Arc::new(Recorder::default());
        coordinator.add_listener(name("a/old"), EventScope::Object, source.clone());
        coordinator.add_listener(name("b/new"), EventScope::Object, destination.clone());
        coordinator.add_listener(Name::root(), EventScope::Subtree, tree.clone());
        // Only object-scope registrations follow the source name.
        coordinator.add_listener(name("a"), EventScope::OneLevel, bystander.clone());

        let fired = coordinator.fire_rename(&Name::root(), &name("a/old"), &name("b/new"), None, None, None);

        assert_eq!(fired, 3);
        assert_eq!(source.names(), vec!["b/new".to_string()]);
        assert_eq!(destination.names(), vec!["b/new".to_string()]);
        assert_eq!(tree.names(), vec!["b/new".to_string()]);
        assert!(bystander.names().is_empty());
    }
}
