// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod bootstrap;
pub mod event_coordinator;
pub mod naming_context;
pub mod object_factory;
