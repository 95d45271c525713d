// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Naming Errors
//!
//! Errors are typed by condition. Every failure is synchronous and surfaced
//! to the immediate caller; nothing is retried.

use thiserror::Error;

/// Boxed error returned by object factories and preserved as the source of
/// [`NamingError::Factory`].
pub type FactorySource = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum NamingError {
    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Name not found: {name}")]
    NameNotFound { name: String },

    #[error("Name already bound: {0}")]
    NameAlreadyBound(String),

    #[error("Not a context: {0}")]
    NotContext(String),

    #[error("Context not empty: {0}")]
    ContextNotEmpty(String),

    /// Unsupported-operation: the store is read-only, or no owner is present
    /// for a write to an owner-gated store.
    #[error("Naming context is read-only: {operation} not permitted")]
    ReadOnly { operation: String },

    #[error("Cannot proceed past '{resolved_name}': '{remaining}' must be resolved by another naming system")]
    CannotProceed { resolved_name: String, remaining: String },

    #[error("Resolution of '{name}' exceeded {limit} link/reference hops")]
    LinkDepthExceeded { name: String, limit: usize },

    #[error("Object factory '{factory}' failed: {source}")]
    Factory {
        factory: String,
        #[source]
        source: FactorySource,
    },

    #[error("Naming store is closed")]
    Closed,

    #[error("Invalid naming configuration: {0}")]
    InvalidConfiguration(String),
}

impl NamingError {
    pub fn not_found(name: impl ToString) -> Self {
        NamingError::NameNotFound {
            name: name.to_string(),
        }
    }

    pub fn read_only(operation: impl Into<String>) -> Self {
        NamingError::ReadOnly {
            operation: operation.into(),
        }
    }

    /// Wrap an arbitrary factory failure, keeping it as the error source.
    pub fn factory<E>(factory: impl Into<String>, source: E) -> Self
    where
        E: Into<FactorySource>,
    {
        NamingError::Factory {
            factory: factory.into(),
            source: source.into(),
        }
    }
}
