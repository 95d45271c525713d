// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Naming Events
//!
//! Listener scopes and the change notifications stores emit after a
//! successful mutation. [`NamingEventRecord`] is the value-free form
//! published on the event bus.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::name::Name;
use crate::domain::value::Binding;

/// Breadth of the names a listener registration covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventScope {
    /// Only the registered name itself.
    Object,
    /// Immediate children of the registered name.
    OneLevel,
    /// The registered name and everything below it.
    Subtree,
}

impl EventScope {
    pub const ALL: [EventScope; 3] = [EventScope::Object, EventScope::OneLevel, EventScope::Subtree];
}

/// Containment rule between a registration and the path an event fired at.
pub fn scope_matches(registered: &Name, scope: EventScope, path: &Name) -> bool {
    match scope {
        EventScope::Object => registered == path,
        EventScope::OneLevel => registered.is_parent_of(path),
        EventScope::Subtree => path.starts_with(registered),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingEventKind {
    ObjectAdded,
    ObjectRemoved,
    ObjectChanged,
    ObjectRenamed,
}

impl NamingEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NamingEventKind::ObjectAdded => "object_added",
            NamingEventKind::ObjectRemoved => "object_removed",
            NamingEventKind::ObjectChanged => "object_changed",
            NamingEventKind::ObjectRenamed => "object_renamed",
        }
    }
}

/// Change notification delivered to listeners.
#[derive(Debug, Clone)]
pub struct NamingEvent {
    pub kind: NamingEventKind,
    /// Context the change was reported against.
    pub context: Name,
    /// Full path of the changed name (`context` + relative name).
    pub name: Name,
    pub new_binding: Option<Binding>,
    pub old_binding: Option<Binding>,
    /// Free-form description of the operation that caused the change.
    pub change_info: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl NamingEvent {
    /// Serializable summary published on the event bus.
    pub fn record(&self) -> NamingEventRecord {
        NamingEventRecord {
            kind: self.kind,
            name: self.name.clone(),
            new_class_name: self.new_binding.as_ref().map(|b| b.class_name.clone()),
            old_class_name: self.old_binding.as_ref().map(|b| b.class_name.clone()),
            old_name: match (&self.old_binding, self.kind) {
                (Some(binding), NamingEventKind::ObjectRenamed) => Some(binding.name.clone()),
                _ => None,
            },
            change_info: self.change_info.clone(),
            occurred_at: self.occurred_at,
        }
    }
}

/// Value-free view of a [`NamingEvent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamingEventRecord {
    pub kind: NamingEventKind,
    pub name: Name,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_class_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_class_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_info: Option<String>,
    pub occurred_at: DateTime<Utc>,
}
