// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! The external-dns workload publishing a cluster's ingresses into its zone.
//!
//! The workload is rendered from the public `external-dns` template. Its input
//! configures external-dns for the PowerDNS provider:
//!
//! ```json
//! {
//!   "credentials": { "pdnsApiKey": "<PDNS_API_KEY>" },
//!   "env": {
//!     "EXTERNAL_DNS_DOMAIN_FILTER": "<zone>",
//!     "EXTERNAL_DNS_PDNS_SERVER": "http://<api address>:8081"
//!   },
//!   "provider": "pdns",
//!   "sources": ["ingress"]
//! }
//! ```

use crate::constants::{
    EXTERNAL_DNS_PROVIDER, EXTERNAL_DNS_SOURCE_INGRESS, EXTERNAL_DNS_TARGET_NAMESPACE,
    EXTERNAL_DNS_TEMPLATE_NAME, EXTERNAL_DNS_WORKLOAD_SUFFIX, KIND_WORKLOAD_TEMPLATE,
    PDNS_API_KEY_SECRET_KEY, PROVENIENCE_DOCKYARDS,
};
use crate::crd::Workload;
use crate::errors::{Error, Result};
use crate::labels::LABEL_CLUSTER_NAME;
use crate::reconcilers::owner::OwnerRef;
use crate::reconcilers::zone::discovery::ProviderAddresses;
use k8s_openapi::api::core::v1::{Secret, TypedObjectReference};
use kube::ResourceExt;
use serde_json::json;

/// Object name of the external-dns workload of `cluster_name`.
#[must_use]
pub fn workload_name(cluster_name: &str) -> String {
    format!("{cluster_name}{EXTERNAL_DNS_WORKLOAD_SUFFIX}")
}

/// Extracts the PowerDNS API key from the credential secret.
///
/// # Errors
///
/// Returns [`Error::MissingCredential`] if the key is absent or empty.
pub fn api_key(secret: &Secret) -> Result<String> {
    secret
        .data
        .as_ref()
        .and_then(|data| data.get(PDNS_API_KEY_SECRET_KEY))
        .filter(|value| !value.0.is_empty())
        .map(|value| String::from_utf8_lossy(&value.0).into_owned())
        .ok_or_else(|| Error::MissingCredential {
            secret: format!(
                "{}/{}",
                secret.namespace().unwrap_or_default(),
                secret.name_any()
            ),
            key: PDNS_API_KEY_SECRET_KEY,
        })
}

/// Template input configuring external-dns for `zone_name`.
#[must_use]
pub fn external_dns_input(
    zone_name: &str,
    api_key: &str,
    addresses: &ProviderAddresses,
) -> serde_json::Value {
    json!({
        "provider": EXTERNAL_DNS_PROVIDER,
        "sources": [EXTERNAL_DNS_SOURCE_INGRESS],
        "credentials": {
            "pdnsApiKey": api_key,
        },
        "env": {
            "EXTERNAL_DNS_PDNS_SERVER": addresses.api_endpoint(),
            "EXTERNAL_DNS_DOMAIN_FILTER": zone_name,
        },
    })
}

/// Writes the desired external-dns state into `workload`.
///
/// Labels other than the cluster-name label are preserved; the owner
/// references are replaced by the single reference to the cluster.
pub fn apply_external_dns(
    workload: &mut Workload,
    cluster: &OwnerRef,
    public_namespace: &str,
    input: serde_json::Value,
) {
    workload
        .labels_mut()
        .insert(LABEL_CLUSTER_NAME.to_string(), cluster.name().to_string());
    cluster.set_sole_owner(workload);

    workload.spec.provenience = PROVENIENCE_DOCKYARDS.to_string();
    workload.spec.cluster_component = true;
    workload.spec.target_namespace = EXTERNAL_DNS_TARGET_NAMESPACE.to_string();
    workload.spec.workload_template_ref = Some(TypedObjectReference {
        api_group: None,
        kind: KIND_WORKLOAD_TEMPLATE.to_string(),
        name: EXTERNAL_DNS_TEMPLATE_NAME.to_string(),
        namespace: Some(public_namespace.to_string()),
    });
    workload.spec.input = Some(input);
}

#[cfg(test)]
#[path = "workload_tests.rs"]
mod workload_tests;
