// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # nomen-core
//!
//! Hierarchical naming: a writable in-memory naming store, adapters that
//! present a hierarchical service registry as a naming store, a resolution
//! engine that follows links, references and federated contexts, and a
//! naming-event coordinator.
//!
//! # Architecture
//!
//! - **Domain:** names, bound values, errors, the [`domain::store::NamingStore`] contract,
//!   events, owners and configuration
//! - **Application:** [`application::naming_context::NamingContext`] (resolution engine),
//!   object factories, the event coordinator and store bootstrap
//! - **Infrastructure:** store implementations, the service registry and the event bus

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;
