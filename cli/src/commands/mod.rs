// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the nomen CLI

pub mod config;
pub mod list;
pub mod lookup;

pub use self::config::ConfigCommand;
pub use self::list::ListArgs;
pub use self::lookup::LookupArgs;

use anyhow::{Context, Result};
use std::path::PathBuf;

use nomen_core::application::bootstrap::{bootstrap, Bootstrapped};
use nomen_core::application::object_factory::ObjectFactoryRegistry;
use nomen_core::domain::naming_config::NamingConfigManifest;

/// Load the configuration and build the store it describes.
pub(crate) fn open_store(config_override: Option<PathBuf>) -> Result<Bootstrapped> {
    let config = NamingConfigManifest::load_or_default(config_override).context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;
    bootstrap(&config, ObjectFactoryRegistry::new()).context("Failed to seed naming store")
}
