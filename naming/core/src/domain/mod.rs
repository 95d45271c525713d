// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain Layer
//!
//! Value types and contracts shared by every naming store implementation.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Names, bound values, naming errors, store contract, events, owners, configuration

pub mod name;
pub mod value;
pub mod errors;
pub mod store;
pub mod events;
pub mod owner;
pub mod naming_config;
