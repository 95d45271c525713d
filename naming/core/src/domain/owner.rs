// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Owner Stack
//!
//! Write gate for owner-gated stores. Only deployment processing may write
//! names; it pushes the identity of the deployment unit it is processing
//! before mutating and pops it afterwards.
//!
//! The stack is an explicit value handed to every mutating call. There is no
//! thread-local or global state: the current owner *is* the write capability,
//! and a caller without a stack (or with an empty one) cannot write.
//!
//! This is a coarse deployment-vs-runtime gate, not an access-control list.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity permitted to mutate a naming region.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Owner {
    name: String,
}

impl Owner {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct OwnerStack {
    owners: Vec<Owner>,
}

impl OwnerStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, owner: Owner) {
        tracing::trace!(owner = %owner, depth = self.owners.len() + 1, "Pushed naming owner");
        self.owners.push(owner);
    }

    pub fn pop(&mut self) -> Option<Owner> {
        let owner = self.owners.pop();
        if owner.is_none() {
            tracing::warn!("Popped an empty naming owner stack");
        }
        owner
    }

    /// Owner on top of the stack; the write capability for the next mutation.
    pub fn current(&self) -> Option<&Owner> {
        self.owners.last()
    }

    pub fn depth(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Run `f` with `owner` pushed, popping it again afterwards so the stack
    /// stays balanced regardless of what `f` returns.
    pub fn scoped<R>(&mut self, owner: Owner, f: impl FnOnce(&OwnerStack) -> R) -> R {
        self.push(owner);
        let result = f(self);
        self.pop();
        result
    }
}
