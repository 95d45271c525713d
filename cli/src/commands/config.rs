// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use nomen_core::domain::naming_config::{ConfiguredValue, NamingConfigManifest};

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,

        /// Print the effective manifest as YAML
        #[arg(long)]
        yaml: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./nomen-config.yaml)
        #[arg(short, long, default_value = "./nomen-config.yaml")]
        output: PathBuf,

        /// Include sample bindings of every kind
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(command: ConfigCommand, config_override: Option<PathBuf>) -> Result<()> {
    match command {
        ConfigCommand::Show { paths, yaml } => show(config_override, paths, yaml).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output, examples } => generate(output, examples).await,
    }
}

fn describe_value(value: &ConfiguredValue) -> String {
    match value {
        ConfiguredValue::String { value } => format!("string {:?}", value),
        ConfiguredValue::Integer { value } => format!("integer {}", value),
        ConfiguredValue::Boolean { value } => format!("boolean {}", value),
        ConfiguredValue::Link { target } => format!("link → {}", target),
        ConfiguredValue::Reference {
            class_name, factory, ..
        } => format!("reference {} (factory {})", class_name, factory),
        ConfiguredValue::Context => "context".to_string(),
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool, as_yaml: bool) -> Result<()> {
    let config = NamingConfigManifest::load_or_default(config_override.clone()).context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. NOMEN_CONFIG_PATH: {}",
            std::env::var("NOMEN_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./nomen-config.yaml");
        println!("  4. ~/.nomen/config.yaml");
        println!("  5. /etc/nomen/config.yaml");
        println!();
    }

    if as_yaml {
        print!("{}", serde_yaml::to_string(&config).context("Failed to render configuration")?);
        return Ok(());
    }

    println!("{}", "Current configuration:".bold());
    println!("  Name: {}", config.metadata.name);
    println!();

    println!("{}", "Resolution:".bold());
    println!("  Max link depth: {}", config.spec.resolution.max_link_depth);
    println!();

    println!("{}", "Events:".bold());
    println!("  Bus capacity: {}", config.spec.events.bus_capacity);
    println!();

    println!("{}", "Bindings:".bold());
    if config.spec.bindings.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for binding in &config.spec.bindings {
        println!("  {} = {}", binding.name.bold(), describe_value(&binding.value));
    }
    println!();

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = NamingConfigManifest::load_or_default(config_path).context("Failed to load configuration")?;

    config.validate().context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: PathBuf, with_examples: bool) -> Result<()> {
    let sample = if with_examples {
        include_str!("../../templates/config-with-examples.yaml")
    } else {
        include_str!("../../templates/config-minimal.yaml")
    };

    std::fs::write(&output, sample).with_context(|| format!("Failed to write config to {:?}", output))?;

    println!("{}", format!("✓ Configuration generated: {}", output.display()).green());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_are_valid() {
        for template in [
            include_str!("../../templates/config-minimal.yaml"),
            include_str!("../../templates/config-with-examples.yaml"),
        ] {
            let manifest = NamingConfigManifest::from_yaml_str(template).unwrap();
            manifest.validate().unwrap();
        }
    }

    #[tokio::test]
    async fn test_generate_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("nomen-config.yaml");
        generate(output.clone(), true).await.unwrap();

        let manifest = NamingConfigManifest::from_yaml_file(&output).unwrap();
        assert!(!manifest.spec.bindings.is_empty());
    }

    #[test]
    fn test_describe_value() {
        assert_eq!(
            describe_value(&ConfiguredValue::Link {
                target: "./x".to_string()
            }),
            "link → ./x"
        );
        assert_eq!(describe_value(&ConfiguredValue::Context), "context");
    }
}
