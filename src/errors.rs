// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error type shared by the reconcilers and the resource store.
//!
//! Every variant is retryable: the reconcilers never give up on a resource,
//! they report the failure and let the controller runtime requeue it. States
//! that are merely "not ready yet" (no owner organization, zone still pending,
//! missing cluster label) are not errors at all and never reach this type.

use kube::Resource;
use thiserror::Error;

/// Errors returned by a reconciliation pass.
#[derive(Error, Debug)]
pub enum Error {
    /// Kubernetes API call failed
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// Object could not be converted to or from JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Non-Kubernetes store failure (e.g. a resource version conflict)
    #[error("Resource store error: {0}")]
    Store(String),

    /// An object the pass depends on does not exist
    #[error("{kind} {name} not found")]
    NotFound {
        /// Kind of the missing object
        kind: String,
        /// namespace/name of the missing object
        name: String,
    },

    /// A required configuration key is absent or empty
    ///
    /// Surfaced on every pass until an operator fills in the platform configuration.
    #[error("No value for config key `{key}`")]
    MissingConfig {
        /// The configuration key that was looked up
        key: &'static str,
    },

    /// An object lacks metadata needed to derive its children
    #[error("{kind} is missing metadata field `{field}`")]
    MissingMetadata {
        /// Kind of the incomplete object
        kind: String,
        /// Name of the missing metadata field
        field: &'static str,
    },

    /// The provider DNS service has no external address assigned yet
    #[error("No available DNS addresses for PowerDNS service {service}")]
    NoDnsAddress {
        /// namespace/name of the DNS-facing service
        service: String,
    },

    /// The provider API service has no cluster addresses assigned yet
    #[error("No available API addresses for PowerDNS service {service}")]
    NoApiAddresses {
        /// namespace/name of the API-facing service
        service: String,
    },

    /// The provider credential secret or its API key entry is missing or empty
    #[error("{key} missing from secret {secret}")]
    MissingCredential {
        /// namespace/name of the credential secret
        secret: String,
        /// Data key that was expected to hold the credential
        key: &'static str,
    },
}

impl Error {
    /// Stable snake_case label for metrics and log fields.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Kube(kube::Error::Api(response)) if response.code == 409 => "conflict",
            Self::Kube(_) => "kube_api",
            Self::Serialization(_) => "serialization",
            Self::Store(_) => "store",
            Self::NotFound { .. } => "not_found",
            Self::MissingConfig { .. } => "missing_config",
            Self::MissingMetadata { .. } => "missing_metadata",
            Self::NoDnsAddress { .. } => "no_dns_address",
            Self::NoApiAddresses { .. } => "no_api_addresses",
            Self::MissingCredential { .. } => "missing_credential",
        }
    }

    /// Builds a [`Error::NotFound`] for an object of kind `K`.
    pub fn not_found<K>(namespace: &str, name: &str) -> Self
    where
        K: Resource<DynamicType = ()>,
    {
        Self::NotFound {
            kind: K::kind(&()).to_string(),
            name: format!("{namespace}/{name}"),
        }
    }

    /// Whether the controller runtime should requeue the resource.
    ///
    /// Always `true`; kept as a method so the error policy reads the decision
    /// from one place.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        true
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
