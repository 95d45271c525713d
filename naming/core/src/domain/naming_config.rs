// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Naming Configuration Types
//
// Defines the configuration manifest for a nomen naming store:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - Resolution limits (link/reference hop bound)
// - Event bus sizing
// - Initial bindings seeded into the store at startup

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::domain::name::Name;

pub const API_VERSION: &str = "nomen/v1";
pub const KIND: &str = "NamingConfig";

/// Top-level Kubernetes-style naming configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamingConfigManifest {
    /// API version (must be "nomen/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "NamingConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    pub spec: NamingConfigSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NamingConfigSpec {
    #[serde(default)]
    pub resolution: ResolutionConfig,

    #[serde(default)]
    pub events: EventsConfig,

    /// Bindings created when the store is bootstrapped
    #[serde(default)]
    pub bindings: Vec<BindingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionConfig {
    /// Maximum link/reference hops for a single lookup. Bounds circular links.
    #[serde(default = "default_max_link_depth")]
    pub max_link_depth: usize,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            max_link_depth: default_max_link_depth(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Broadcast channel capacity of the naming event bus
    #[serde(default = "default_bus_capacity")]
    pub bus_capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            bus_capacity: default_bus_capacity(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingConfig {
    /// Slash-separated name relative to the store root
    pub name: String,

    pub value: ConfiguredValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ConfiguredValue {
    String { value: String },
    Integer { value: i64 },
    Boolean { value: bool },
    Link { target: String },
    Reference {
        class_name: String,
        factory: String,
        #[serde(default)]
        addresses: BTreeMap<String, String>,
    },
    /// Explicit (empty) sub-context
    Context,
}

fn default_max_link_depth() -> usize {
    32
}

fn default_bus_capacity() -> usize {
    1000
}

impl Default for NamingConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "nomen".to_string(),
                labels: None,
            },
            spec: NamingConfigSpec::default(),
        }
    }
}

impl NamingConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. NOMEN_CONFIG_PATH environment variable
    /// 2. ./nomen-config.yaml (working directory)
    /// 3. ~/.nomen/config.yaml (user home)
    /// 4. /etc/nomen/config.yaml (system, Unix) or C:\ProgramData\Nomen\config.yaml (Windows)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("NOMEN_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./nomen-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".nomen").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        let system_config = PathBuf::from("/etc/nomen/config.yaml");
        #[cfg(windows)]
        let system_config = PathBuf::from("C:\\ProgramData\\Nomen\\config.yaml");

        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit path must exist and parse
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path)
                .map_err(|e| anyhow::anyhow!("Failed to load config at {:?}: {}", path, e))?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::warn!("No configuration file found in standard locations. Using empty defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("NOMEN_MAX_LINK_DEPTH") {
            match val.parse::<usize>() {
                Ok(depth) => {
                    tracing::info!("Environment override: NOMEN_MAX_LINK_DEPTH={}", depth);
                    self.spec.resolution.max_link_depth = depth;
                }
                Err(_) => {
                    tracing::warn!(
                        "Invalid value for NOMEN_MAX_LINK_DEPTH: '{}'. Expected a positive integer. Ignoring.",
                        val
                    );
                }
            }
        }

        if let Ok(val) = std::env::var("NOMEN_EVENT_BUS_CAPACITY") {
            match val.parse::<usize>() {
                Ok(capacity) => {
                    tracing::info!("Environment override: NOMEN_EVENT_BUS_CAPACITY={}", capacity);
                    self.spec.events.bus_capacity = capacity;
                }
                Err(_) => {
                    tracing::warn!(
                        "Invalid value for NOMEN_EVENT_BUS_CAPACITY: '{}'. Expected a positive integer. Ignoring.",
                        val
                    );
                }
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        if self.spec.resolution.max_link_depth == 0 {
            anyhow::bail!("spec.resolution.max_link_depth must be at least 1");
        }

        // tokio broadcast channels panic on zero capacity
        if self.spec.events.bus_capacity == 0 {
            anyhow::bail!("spec.events.bus_capacity must be at least 1");
        }

        let mut seen = std::collections::HashSet::new();
        for binding in &self.spec.bindings {
            let name = Name::parse(&binding.name)
                .map_err(|e| anyhow::anyhow!("Invalid binding name '{}': {}", binding.name, e))?;
            if name.is_empty() {
                anyhow::bail!("Binding name cannot be empty");
            }
            if !seen.insert(name.clone()) {
                anyhow::bail!("Duplicate binding name: {}", name);
            }

            match &binding.value {
                ConfiguredValue::Reference { factory, class_name, .. } => {
                    if factory.is_empty() {
                        anyhow::bail!("Reference factory cannot be empty for: {}", binding.name);
                    }
                    if class_name.is_empty() {
                        anyhow::bail!("Reference class_name cannot be empty for: {}", binding.name);
                    }
                }
                ConfiguredValue::Link { target } => {
                    if target.is_empty() {
                        anyhow::bail!("Link target cannot be empty for: {}", binding.name);
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }
}
