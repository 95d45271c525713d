// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `nomen lookup` - resolve one name against the configured store

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use nomen_core::application::naming_context::Resolved;
use nomen_core::domain::name::Name;
use nomen_core::domain::value::Object;

#[derive(Args)]
pub struct LookupArgs {
    /// Slash-separated name to resolve
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Report a terminal link instead of following it
    #[arg(long)]
    pub no_follow: bool,
}

pub async fn execute(args: LookupArgs, config_override: Option<PathBuf>) -> Result<()> {
    let booted = super::open_store(config_override)?;
    let name = Name::parse(&args.name).with_context(|| format!("Invalid name '{}'", args.name))?;

    let resolved = if args.no_follow {
        booted.context.lookup_link(&name)
    } else {
        booted.context.lookup(&name)
    }
    .with_context(|| format!("Lookup of '{}' failed", name))?;

    println!("{} {}", name.to_string().bold(), render(&resolved));
    Ok(())
}

/// Best-effort display of a bound object for the value kinds configuration
/// can produce.
pub(crate) fn render_object(object: &Object) -> String {
    if let Some(s) = object.downcast_ref::<String>() {
        return format!("{:?}", s);
    }
    if let Some(n) = object.downcast_ref::<i64>() {
        return n.to_string();
    }
    if let Some(b) = object.downcast_ref::<bool>() {
        return b.to_string();
    }
    format!("<{}>", object.class_name())
}

pub(crate) fn render(resolved: &Resolved) -> String {
    match resolved {
        Resolved::Object(object) => format!("= {} ({})", render_object(object), object.class_name().dimmed()),
        Resolved::Context(context) => format!("{} {}", "context".cyan(), context.name_in_namespace().dimmed()),
        Resolved::Reference(reference) => {
            let addresses: Vec<String> = reference
                .addresses
                .iter()
                .map(|a| format!("{}={}", a.addr_type, a.content))
                .collect();
            format!(
                "{} {} via '{}' [{}]",
                "reference".yellow(),
                reference.class_name,
                reference.factory,
                addresses.join(", ")
            )
        }
        Resolved::Link(link) => format!("{} {}", "link →".magenta(), link.target),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_object_kinds() {
        assert_eq!(render_object(&Object::new(String::from("hi"))), "\"hi\"");
        assert_eq!(render_object(&Object::new(7_i64)), "7");
        assert_eq!(render_object(&Object::new(true)), "true");
        assert_eq!(render_object(&Object::new(1_u8)), "<u8>");
    }
}
