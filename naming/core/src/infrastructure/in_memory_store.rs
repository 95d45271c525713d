// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! In-Memory Naming Store
//!
//! Writable tree of bindings keyed by name segments.
//!
//! # Invariants
//!
//! - Every intermediate segment on the way to a deeper binding is a context,
//!   created implicitly by `bind`/`rebind` when absent
//! - `unbind` prunes implicit contexts left empty; contexts created through
//!   `create_subcontext` are explicit and survive until destroyed
//! - Writes crossing a bound federated context are delegated to that store
//!   with the remaining suffix, after this store's lock has been released
//!
//! One `RwLock` guards the whole tree: lookups run concurrently, writers are
//! serialized. Events are fired after the lock is released.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::application::event_coordinator::EventCoordinator;
use crate::domain::errors::NamingError;
use crate::domain::events::{EventScope, NamingEventKind};
use crate::domain::name::Name;
use crate::domain::store::{NamingStore, ResolveResult, StoreEntry};
use crate::domain::value::{Binding, BoundValue};

#[derive(Debug, Default)]
struct ContextNode {
    children: BTreeMap<String, Node>,
    explicit: bool,
}

impl ContextNode {
    fn implicit() -> Self {
        Self::default()
    }

    fn explicit() -> Self {
        Self {
            children: BTreeMap::new(),
            explicit: true,
        }
    }
}

#[derive(Debug)]
struct BindingNode {
    value: BoundValue,
    class_name: String,
}

#[derive(Debug)]
enum Node {
    Context(ContextNode),
    Binding(BindingNode),
}

impl Node {
    fn binding(value: BoundValue, class_name: Option<String>) -> Self {
        let class_name = class_name.unwrap_or_else(|| value.class_name().to_string());
        Node::Binding(BindingNode { value, class_name })
    }

    fn describe(&self, full_name: &Name) -> Binding {
        match self {
            Node::Context(_) => Binding::subcontext(full_name.to_string()),
            Node::Binding(b) => Binding::with_class_name(full_name.to_string(), b.class_name.clone(), b.value.clone()),
        }
    }
}

#[derive(Debug, Default)]
struct TreeState {
    root: ContextNode,
    closed: bool,
}

/// Where a walk towards the parent of a name ended.
enum Descent<'a> {
    Local(&'a mut ContextNode),
    Delegate(Arc<dyn NamingStore>, Name),
}

enum Located<'a> {
    Local(&'a ContextNode),
    Delegate(Arc<dyn NamingStore>, Name),
}

/// Walk to the parent context of `name`, optionally creating implicit
/// contexts along the way.
fn descend_mut<'a>(root: &'a mut ContextNode, name: &Name, create: bool) -> Result<Descent<'a>, NamingError> {
    let mut current = root;
    let parent_len = name.len().saturating_sub(1);
    for (i, segment) in name.segments()[..parent_len].iter().enumerate() {
        let child = if create {
            current
                .children
                .entry(segment.clone())
                .or_insert_with(|| Node::Context(ContextNode::implicit()))
        } else {
            match current.children.get_mut(segment) {
                Some(child) => child,
                None => return Err(NamingError::not_found(name.prefix(i + 1))),
            }
        };
        match child {
            Node::Context(ctx) => current = ctx,
            Node::Binding(binding) => {
                return match &binding.value {
                    BoundValue::Context(store) => Ok(Descent::Delegate(Arc::clone(store), name.suffix(i + 1))),
                    _ => Err(NamingError::NotContext(name.prefix(i + 1).to_string())),
                };
            }
        }
    }
    Ok(Descent::Local(current))
}

/// Walk to the context denoted by `name` itself.
fn locate_context<'a>(root: &'a ContextNode, name: &Name) -> Result<Located<'a>, NamingError> {
    let mut current = root;
    for (i, segment) in name.segments().iter().enumerate() {
        match current.children.get(segment) {
            None => return Err(NamingError::not_found(name)),
            Some(Node::Context(ctx)) => current = ctx,
            Some(Node::Binding(binding)) => {
                return match &binding.value {
                    BoundValue::Context(store) => Ok(Located::Delegate(Arc::clone(store), name.suffix(i + 1))),
                    _ => Err(NamingError::NotContext(name.prefix(i + 1).to_string())),
                };
            }
        }
    }
    Ok(Located::Local(current))
}

fn node_at<'a>(root: &'a ContextNode, name: &Name) -> Option<&'a Node> {
    let (last, parents) = name.segments().split_last()?;
    let mut current = root;
    for segment in parents {
        match current.children.get(segment)? {
            Node::Context(ctx) => current = ctx,
            Node::Binding(_) => return None,
        }
    }
    current.children.get(last)
}

/// Remove implicit contexts along `path` that no longer have children.
fn prune(node: &mut ContextNode, path: &[String]) {
    if let Some((first, rest)) = path.split_first() {
        let remove = match node.children.get_mut(first) {
            Some(Node::Context(child)) => {
                prune(child, rest);
                !child.explicit && child.children.is_empty()
            }
            _ => false,
        };
        if remove {
            node.children.remove(first);
        }
    }
}

fn leaf(name: &Name) -> Result<&str, NamingError> {
    name.last()
        .ok_or_else(|| NamingError::InvalidName("an empty name cannot be bound".to_string()))
}

pub struct InMemoryNamingStore {
    state: RwLock<TreeState>,
    coordinator: Option<Arc<EventCoordinator>>,
}

impl InMemoryNamingStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(TreeState::default()),
            coordinator: None,
        }
    }

    /// Store that reports every change to `coordinator`.
    pub fn with_event_coordinator(coordinator: Arc<EventCoordinator>) -> Self {
        Self {
            state: RwLock::new(TreeState::default()),
            coordinator: Some(coordinator),
        }
    }

    fn read_state(&self) -> Result<RwLockReadGuard<'_, TreeState>, NamingError> {
        let state = self.state.read();
        if state.closed {
            return Err(NamingError::Closed);
        }
        Ok(state)
    }

    fn write_state(&self) -> Result<RwLockWriteGuard<'_, TreeState>, NamingError> {
        let state = self.state.write();
        if state.closed {
            return Err(NamingError::Closed);
        }
        Ok(state)
    }

    fn fire(
        &self,
        name: &Name,
        new_binding: Option<Binding>,
        old_binding: Option<Binding>,
        kind: NamingEventKind,
        change_info: &str,
    ) {
        if let Some(coordinator) = &self.coordinator {
            coordinator.fire_event(
                &Name::root(),
                name,
                new_binding,
                old_binding,
                kind,
                Some(change_info),
                &EventScope::ALL,
            );
        }
    }
}

impl Default for InMemoryNamingStore {
    fn default() -> Self {
        Self::new()
    }
}

enum Write<T> {
    Done(T),
    Delegate(Arc<dyn NamingStore>, Name, BoundValue),
}

impl NamingStore for InMemoryNamingStore {
    fn lookup(&self, name: &Name) -> Result<StoreEntry, NamingError> {
        let state = self.read_state()?;
        let mut current = &state.root;
        for (i, segment) in name.segments().iter().enumerate() {
            match current.children.get(segment) {
                None => return Err(NamingError::not_found(name)),
                Some(Node::Context(ctx)) => current = ctx,
                Some(Node::Binding(binding)) => {
                    if i + 1 == name.len() {
                        return Ok(StoreEntry::Bound(binding.value.clone()));
                    }
                    return Ok(StoreEntry::Partial(ResolveResult {
                        resolved: binding.value.clone(),
                        resolved_name: name.prefix(i + 1),
                        remaining: name.suffix(i + 1),
                    }));
                }
            }
        }
        Ok(StoreEntry::Context)
    }

    fn list_bindings(&self, name: &Name) -> Result<Vec<Binding>, NamingError> {
        let delegate = {
            let state = self.read_state()?;
            match locate_context(&state.root, name)? {
                Located::Local(ctx) => {
                    return Ok(ctx
                        .children
                        .iter()
                        .map(|(child_name, node)| match node {
                            Node::Context(_) => Binding::subcontext(child_name.clone()),
                            Node::Binding(b) => {
                                Binding::with_class_name(child_name.clone(), b.class_name.clone(), b.value.clone())
                            }
                        })
                        .collect());
                }
                Located::Delegate(store, rest) => (store, rest),
            }
        };
        let (store, rest) = delegate;
        store.list_bindings(&rest)
    }

    fn bind(&self, name: &Name, value: BoundValue, class_name: Option<String>) -> Result<(), NamingError> {
        let segment = leaf(name)?.to_string();
        let outcome = {
            let mut state = self.write_state()?;
            match descend_mut(&mut state.root, name, true)? {
                Descent::Delegate(store, rest) => Write::Delegate(store, rest, value),
                Descent::Local(parent) => {
                    if parent.children.contains_key(&segment) {
                        return Err(NamingError::NameAlreadyBound(name.to_string()));
                    }
                    let node = Node::binding(value, class_name.clone());
                    let added = node.describe(name);
                    parent.children.insert(segment, node);
                    Write::Done(added)
                }
            }
        };

        match outcome {
            Write::Delegate(store, rest, value) => store.bind(&rest, value, class_name),
            Write::Done(added) => {
                debug!(name = %name, class_name = %added.class_name, "Bound name");
                self.fire(name, Some(added), None, NamingEventKind::ObjectAdded, "bind");
                Ok(())
            }
        }
    }

    fn rebind(&self, name: &Name, value: BoundValue, class_name: Option<String>) -> Result<(), NamingError> {
        let segment = leaf(name)?.to_string();
        let outcome = {
            let mut state = self.write_state()?;
            match descend_mut(&mut state.root, name, true)? {
                Descent::Delegate(store, rest) => Write::Delegate(store, rest, value),
                Descent::Local(parent) => {
                    if let Some(Node::Context(existing)) = parent.children.get(&segment) {
                        if !existing.children.is_empty() {
                            return Err(NamingError::ContextNotEmpty(name.to_string()));
                        }
                    }
                    let node = Node::binding(value, class_name.clone());
                    let added = node.describe(name);
                    let previous = parent.children.insert(segment, node).map(|old| old.describe(name));
                    Write::Done((added, previous))
                }
            }
        };

        match outcome {
            Write::Delegate(store, rest, value) => store.rebind(&rest, value, class_name),
            Write::Done((added, previous)) => {
                debug!(name = %name, replaced = previous.is_some(), "Rebound name");
                let kind = if previous.is_some() {
                    NamingEventKind::ObjectChanged
                } else {
                    NamingEventKind::ObjectAdded
                };
                self.fire(name, Some(added), previous, kind, "rebind");
                Ok(())
            }
        }
    }

    fn unbind(&self, name: &Name) -> Result<(), NamingError> {
        if name.is_empty() {
            return Err(NamingError::InvalidName("cannot unbind the root context".to_string()));
        }
        let delegate = {
            let mut state = self.write_state()?;
            let segment = leaf(name)?;
            let removed = match descend_mut(&mut state.root, name, false)? {
                Descent::Delegate(store, rest) => Err((store, rest)),
                Descent::Local(parent) => {
                    match parent.children.get(segment) {
                        None => return Err(NamingError::not_found(name)),
                        Some(Node::Context(ctx)) if !ctx.children.is_empty() => {
                            return Err(NamingError::ContextNotEmpty(name.to_string()));
                        }
                        _ => {}
                    }
                    Ok(parent.children.remove(segment).map(|old| old.describe(name)))
                }
            };
            if removed.is_ok() {
                prune(&mut state.root, &name.segments()[..name.len() - 1]);
            }
            removed
        };

        match delegate {
            Err((store, rest)) => store.unbind(&rest),
            Ok(removed) => {
                debug!(name = %name, "Unbound name");
                self.fire(name, None, removed, NamingEventKind::ObjectRemoved, "unbind");
                Ok(())
            }
        }
    }

    fn rename(&self, old_name: &Name, new_name: &Name) -> Result<(), NamingError> {
        if old_name.is_empty() || new_name.is_empty() {
            return Err(NamingError::InvalidName("cannot rename to or from the root context".to_string()));
        }
        if new_name.starts_with(old_name) {
            return Err(NamingError::InvalidName(format!(
                "cannot rename '{}' into its own subtree '{}'",
                old_name, new_name
            )));
        }

        let (old_binding, new_binding) = {
            let mut state = self.write_state()?;
            if node_at(&state.root, old_name).is_none() {
                return Err(NamingError::not_found(old_name));
            }
            if node_at(&state.root, new_name).is_some() {
                return Err(NamingError::NameAlreadyBound(new_name.to_string()));
            }

            // Check the destination path before detaching anything.
            {
                let mut current = &state.root;
                for (i, segment) in new_name.segments()[..new_name.len() - 1].iter().enumerate() {
                    match current.children.get(segment) {
                        None => break,
                        Some(Node::Context(ctx)) => current = ctx,
                        Some(Node::Binding(_)) => {
                            return Err(NamingError::NotContext(new_name.prefix(i + 1).to_string()));
                        }
                    }
                }
            }

            let node = match descend_mut(&mut state.root, old_name, false)? {
                Descent::Local(parent) => parent.children.remove(leaf(old_name)?),
                Descent::Delegate(_, _) => None,
            }
            .ok_or_else(|| NamingError::not_found(old_name))?;
            let old_binding = node.describe(old_name);
            let new_binding = node.describe(new_name);

            match descend_mut(&mut state.root, new_name, true)? {
                Descent::Local(parent) => {
                    parent.children.insert(leaf(new_name)?.to_string(), node);
                }
                Descent::Delegate(_, _) => {
                    return Err(NamingError::NotContext(new_name.to_string()));
                }
            }
            prune(&mut state.root, &old_name.segments()[..old_name.len() - 1]);
            (old_binding, new_binding)
        };

        debug!(from = %old_name, to = %new_name, "Renamed binding");
        if let Some(coordinator) = &self.coordinator {
            coordinator.fire_rename(
                &Name::root(),
                old_name,
                new_name,
                Some(new_binding),
                Some(old_binding),
                Some("rename"),
            );
        }
        Ok(())
    }

    fn create_subcontext(&self, name: &Name) -> Result<(), NamingError> {
        let segment = leaf(name)?.to_string();
        let delegate = {
            let mut state = self.write_state()?;
            match descend_mut(&mut state.root, name, true)? {
                Descent::Delegate(store, rest) => Some((store, rest)),
                Descent::Local(parent) => {
                    if parent.children.contains_key(&segment) {
                        return Err(NamingError::NameAlreadyBound(name.to_string()));
                    }
                    parent.children.insert(segment, Node::Context(ContextNode::explicit()));
                    None
                }
            }
        };

        match delegate {
            Some((store, rest)) => store.create_subcontext(&rest),
            None => {
                debug!(name = %name, "Created subcontext");
                self.fire(
                    name,
                    Some(Binding::subcontext(name.to_string())),
                    None,
                    NamingEventKind::ObjectAdded,
                    "create_subcontext",
                );
                Ok(())
            }
        }
    }

    fn destroy_subcontext(&self, name: &Name) -> Result<(), NamingError> {
        if name.is_empty() {
            return Err(NamingError::InvalidName("cannot destroy the root context".to_string()));
        }
        let delegate = {
            let mut state = self.write_state()?;
            let segment = leaf(name)?;
            let removed = match descend_mut(&mut state.root, name, false)? {
                Descent::Delegate(store, rest) => Err((store, rest)),
                Descent::Local(parent) => match parent.children.get(segment) {
                    // Destroying a missing context is not an error.
                    None => return Ok(()),
                    Some(Node::Context(ctx)) if !ctx.children.is_empty() => {
                        return Err(NamingError::ContextNotEmpty(name.to_string()));
                    }
                    Some(Node::Binding(b)) if !matches!(b.value, BoundValue::Context(_)) => {
                        return Err(NamingError::NotContext(name.to_string()));
                    }
                    _ => Ok(parent.children.remove(segment).map(|old| old.describe(name))),
                },
            };
            if removed.is_ok() {
                prune(&mut state.root, &name.segments()[..name.len() - 1]);
            }
            removed
        };

        match delegate {
            Err((store, rest)) => store.destroy_subcontext(&rest),
            Ok(removed) => {
                debug!(name = %name, "Destroyed subcontext");
                self.fire(name, None, removed, NamingEventKind::ObjectRemoved, "destroy_subcontext");
                Ok(())
            }
        }
    }

    fn event_coordinator(&self) -> Option<Arc<EventCoordinator>> {
        self.coordinator.clone()
    }

    fn close(&self) -> Result<(), NamingError> {
        let mut state = self.state.write();
        state.root = ContextNode::default();
        state.closed = true;
        debug!("Closed in-memory naming store");
        Ok(())
    }
}
