// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod event_bus;
pub mod in_memory_store;
pub mod service_registry;
pub mod service_store;
