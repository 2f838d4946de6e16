// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Platform configuration accessor.
//!
//! The platform keeps its tunables in a `ConfigMap`. The map is read once at
//! startup into a [`StaticConfig`] and handed to every reconciler through the
//! [`ConfigReader`] trait, so reconcilers never perform hidden global lookups
//! and tests can inject literal values.
//!
//! # Example
//!
//! ```rust
//! use clusterdns::config::{ConfigKey, ConfigReader, StaticConfig};
//!
//! let config = StaticConfig::from_pairs([(ConfigKey::ManagementDomain, "example.com")]);
//! assert_eq!(config.require(ConfigKey::ManagementDomain).unwrap(), "example.com");
//! assert!(config.require(ConfigKey::PdnsName).is_err());
//! ```

use crate::errors::{Error, Result};
use k8s_openapi::api::core::v1::ConfigMap;
use kube::{Api, Client};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

/// Configuration keys recognized by the reconcilers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConfigKey {
    /// Parent domain of every derived zone
    ManagementDomain,
    /// Name of the PowerDNS release (credential secret and service prefix)
    PdnsName,
    /// Namespace PowerDNS runs in
    PdnsNamespace,
    /// Namespace holding the public workload templates
    PublicNamespace,
}

impl ConfigKey {
    /// Every recognized key, in a stable order.
    pub const ALL: [ConfigKey; 4] = [
        ConfigKey::ManagementDomain,
        ConfigKey::PdnsName,
        ConfigKey::PdnsNamespace,
        ConfigKey::PublicNamespace,
    ];

    /// Key as spelled in the configuration map.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ManagementDomain => "managementDomain",
            Self::PdnsName => "pdnsName",
            Self::PdnsNamespace => "pdnsNamespace",
            Self::PublicNamespace => "publicNamespace",
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read access to the platform configuration.
pub trait ConfigReader: Send + Sync {
    /// Returns the value stored for `key`, or `default` if there is none.
    fn value_or_default(&self, key: ConfigKey, default: &str) -> String;

    /// Returns the value stored for `key`, treating an empty value as absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingConfig`] if the key has no non-empty value.
    fn require(&self, key: ConfigKey) -> Result<String> {
        let value = self.value_or_default(key, "");
        if value.is_empty() {
            return Err(Error::MissingConfig { key: key.as_str() });
        }
        Ok(value)
    }
}

/// Immutable configuration snapshot.
#[derive(Clone, Debug, Default)]
pub struct StaticConfig {
    values: BTreeMap<String, String>,
}

impl StaticConfig {
    /// Builds a configuration from literal key/value pairs.
    pub fn from_pairs<I, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (ConfigKey, V)>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(key, value)| (key.as_str().to_string(), value.into()))
                .collect(),
        }
    }

    /// Builds a configuration from the `data` of a `ConfigMap`.
    ///
    /// Unknown keys are kept; they are simply never looked up.
    #[must_use]
    pub fn from_config_map(config_map: &ConfigMap) -> Self {
        Self {
            values: config_map.data.clone().unwrap_or_default(),
        }
    }

    /// Reads the named `ConfigMap` once and snapshots its data.
    ///
    /// # Errors
    ///
    /// Returns an error if the `ConfigMap` cannot be read.
    pub async fn load(client: Client, name: &str, namespace: &str) -> Result<Self> {
        debug!(name = %name, namespace = %namespace, "Loading platform configuration");

        let api: Api<ConfigMap> = Api::namespaced(client, namespace);
        let config_map = api.get(name).await?;
        let config = Self::from_config_map(&config_map);

        let present: Vec<&str> = ConfigKey::ALL
            .iter()
            .filter(|key| config.values.contains_key(key.as_str()))
            .map(|key| key.as_str())
            .collect();
        info!(
            "Loaded platform configuration from {}/{} (keys: {:?})",
            namespace, name, present
        );

        Ok(config)
    }
}

impl ConfigReader for StaticConfig {
    fn value_or_default(&self, key: ConfigKey, default: &str) -> String {
        self.values
            .get(key.as_str())
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
