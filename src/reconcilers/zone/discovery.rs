// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! PowerDNS service address discovery.
//!
//! PowerDNS exposes two services next to its credential secret:
//!
//! - `<pdnsName>-dns` - a load balancer whose ingress IP answers DNS queries
//! - `<pdnsName>-api` - a cluster-internal service for the HTTP API
//!
//! Discovery is all-or-nothing: [`ProviderAddresses`] can only be built with
//! a DNS address and at least one API address, so callers never see a
//! partially discovered provider.

use crate::config::{ConfigKey, ConfigReader};
use crate::constants::{PDNS_API_PORT, PDNS_API_SERVICE_SUFFIX, PDNS_DNS_SERVICE_SUFFIX};
use crate::errors::{Error, Result};
use crate::store::ResourceStore;
use k8s_openapi::api::core::v1::Service;
use tracing::debug;

/// Where PowerDNS is deployed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderLocation {
    /// Release name; prefixes the services and names the credential secret
    pub name: String,
    /// Namespace of the services and the secret
    pub namespace: String,
}

impl ProviderLocation {
    /// Reads `pdnsName` and `pdnsNamespace` from the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingConfig`] if either key is empty.
    pub fn from_config<C: ConfigReader + ?Sized>(config: &C) -> Result<Self> {
        Ok(Self {
            name: config.require(ConfigKey::PdnsName)?,
            namespace: config.require(ConfigKey::PdnsNamespace)?,
        })
    }

    /// Name of the DNS-facing service.
    #[must_use]
    pub fn dns_service(&self) -> String {
        format!("{}{PDNS_DNS_SERVICE_SUFFIX}", self.name)
    }

    /// Name of the API-facing service.
    #[must_use]
    pub fn api_service(&self) -> String {
        format!("{}{PDNS_API_SERVICE_SUFFIX}", self.name)
    }

    fn qualified(&self, name: &str) -> String {
        format!("{}/{}", self.namespace, name)
    }
}

/// Live addresses of a PowerDNS deployment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderAddresses {
    dns: String,
    api: Vec<String>,
}

impl ProviderAddresses {
    /// Extracts the addresses from the two provider services.
    ///
    /// The DNS address is the first load balancer ingress IP of `dns_service`.
    /// The API addresses are the `clusterIPs` of `api_service`, or its single
    /// `clusterIP` when the list is not populated.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoDnsAddress`] or [`Error::NoApiAddresses`] when the
    /// corresponding service has no usable address.
    pub fn from_services(
        location: &ProviderLocation,
        dns_service: &Service,
        api_service: &Service,
    ) -> Result<Self> {
        let dns = dns_service
            .status
            .as_ref()
            .and_then(|status| status.load_balancer.as_ref())
            .and_then(|lb| lb.ingress.as_ref())
            .and_then(|ingress| ingress.first())
            .and_then(|ingress| ingress.ip.clone())
            .filter(|ip| !ip.is_empty())
            .ok_or_else(|| Error::NoDnsAddress {
                service: location.qualified(&location.dns_service()),
            })?;

        let spec = api_service.spec.as_ref();
        let mut api: Vec<String> = spec
            .and_then(|spec| spec.cluster_ips.clone())
            .unwrap_or_default()
            .into_iter()
            .filter(|ip| !ip.is_empty() && ip != "None")
            .collect();
        if api.is_empty() {
            api.extend(
                spec.and_then(|spec| spec.cluster_ip.clone())
                    .filter(|ip| !ip.is_empty() && ip != "None"),
            );
        }
        if api.is_empty() {
            return Err(Error::NoApiAddresses {
                service: location.qualified(&location.api_service()),
            });
        }

        Ok(Self { dns, api })
    }

    /// Reads both provider services and extracts their addresses.
    ///
    /// # Errors
    ///
    /// Returns an error if either service is missing, unreadable or has no
    /// usable address.
    pub async fn discover<S: ResourceStore>(store: &S, location: &ProviderLocation) -> Result<Self> {
        let dns_name = location.dns_service();
        let dns_service = store
            .get::<Service>(&location.namespace, &dns_name)
            .await?
            .ok_or_else(|| Error::not_found::<Service>(&location.namespace, &dns_name))?;

        let api_name = location.api_service();
        let api_service = store
            .get::<Service>(&location.namespace, &api_name)
            .await?
            .ok_or_else(|| Error::not_found::<Service>(&location.namespace, &api_name))?;

        let addresses = Self::from_services(location, &dns_service, &api_service)?;
        debug!(
            dns = %addresses.dns,
            api = ?addresses.api,
            "Discovered PowerDNS addresses"
        );
        Ok(addresses)
    }

    /// Externally reachable DNS address.
    #[must_use]
    pub fn dns(&self) -> &str {
        &self.dns
    }

    /// Cluster-internal API addresses, never empty.
    #[must_use]
    pub fn api(&self) -> &[String] {
        &self.api
    }

    /// Base URL of the PowerDNS HTTP API on the first API address.
    #[must_use]
    pub fn api_endpoint(&self) -> String {
        format!("http://{}:{PDNS_API_PORT}", self.api[0])
    }
}

#[cfg(test)]
#[path = "discovery_tests.rs"]
mod discovery_tests;
