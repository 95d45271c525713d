// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `nomen list` - list the children of a context

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use nomen_core::domain::name::Name;

use super::lookup::render;

#[derive(Args)]
pub struct ListArgs {
    /// Context to list (default: root)
    #[arg(value_name = "NAME", default_value = "")]
    pub name: String,

    /// Resolve each child's value instead of printing only its class
    #[arg(long)]
    pub bindings: bool,
}

pub async fn execute(args: ListArgs, config_override: Option<PathBuf>) -> Result<()> {
    let booted = super::open_store(config_override)?;
    let name = Name::parse(&args.name).with_context(|| format!("Invalid name '{}'", args.name))?;
    let title = if name.is_empty() { "/".to_string() } else { name.to_string() };

    if args.bindings {
        let bindings = booted
            .context
            .list_bindings(&name)
            .with_context(|| format!("Failed to list '{}'", title))?;
        println!("{} ({} entries)", title.bold(), bindings.len());
        for binding in bindings {
            println!("  {} {}", binding.name.bold(), render(&binding.value));
        }
    } else {
        let pairs = booted
            .context
            .list(&name)
            .with_context(|| format!("Failed to list '{}'", title))?;
        println!("{} ({} entries)", title.bold(), pairs.len());
        for pair in pairs {
            println!("  {} {}", pair.name.bold(), pair.class_name.dimmed());
        }
    }

    Ok(())
}
