// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Typed mirrors of the Custom Resource Definitions this operator reads and writes.
//!
//! None of these CRDs are owned by clusterdns. The platform resources come from the
//! dockyards API and the DNS resources from the PowerDNS operator; the structs below
//! only carry the fields the reconcilers consume or produce.
//!
//! # Resource Types
//!
//! ## Platform (`dockyards.io/v1alpha3`)
//!
//! - [`Organization`] - Tenant owning one or more clusters (cluster-scoped)
//! - [`Cluster`] - Tenant-provisioned compute cluster
//! - [`Workload`] - Deployable unit rendered from a workload template
//!
//! ## DNS (`dns.cav.enablers.ob/v1alpha2`)
//!
//! - [`Zone`] - PowerDNS zone declaration
//! - [`RRset`] - PowerDNS record set declaration
//!
//! # Example: Declaring a Record Set
//!
//! ```rust,no_run
//! use clusterdns::crd::{RRsetSpec, ZoneRef};
//!
//! let spec = RRsetSpec {
//!     r#type: "A".to_string(),
//!     ttl: 300,
//!     name: "ns1".to_string(),
//!     records: vec!["192.0.2.53".to_string()],
//!     comment: None,
//!     zone_ref: ZoneRef {
//!         name: "abc123.example.com".to_string(),
//!         kind: "Zone".to_string(),
//!     },
//! };
//! ```

use crate::constants::{ZONE_MIN_OBSERVED_GENERATION, ZONE_SYNC_STATUS_SUCCEEDED};
use k8s_openapi::api::core::v1::TypedObjectReference;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Platform resources
// ============================================================================

/// `Organization` groups the clusters of one tenant.
///
/// Clusters point at their organization through an owner reference. Only the
/// existence of the organization matters to this operator.
#[derive(CustomResource, Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "dockyards.io",
    version = "v1alpha3",
    kind = "Organization",
    doc = "Organization is a tenant of the platform owning clusters."
)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationSpec {
    /// Human readable organization name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// `Cluster` is a tenant-provisioned compute cluster.
///
/// Its UID seeds the name of the DNS zone derived for it.
#[derive(CustomResource, Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "dockyards.io",
    version = "v1alpha3",
    kind = "Cluster",
    namespaced,
    doc = "Cluster is a tenant-provisioned Kubernetes cluster."
)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSpec {
    /// Kubernetes version requested for the cluster.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// `Workload` is a deployable unit rendered from a `WorkloadTemplate` into a cluster.
#[derive(CustomResource, Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "dockyards.io",
    version = "v1alpha3",
    kind = "Workload",
    namespaced,
    derive = "Default",
    doc = "Workload declares a component to run inside a tenant cluster."
)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadSpec {
    /// Who created the workload (platform or user).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub provenience: String,

    /// Whether the workload is part of the cluster's own component set.
    #[serde(default)]
    pub cluster_component: bool,

    /// Namespace inside the tenant cluster the workload is deployed to.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub target_namespace: String,

    /// Template used to render the workload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workload_template_ref: Option<TypedObjectReference>,

    /// Free-form template input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(extend("x-kubernetes-preserve-unknown-fields" = true))]
    pub input: Option<serde_json::Value>,
}

// ============================================================================
// DNS resources
// ============================================================================

/// `Zone` declares a PowerDNS zone.
///
/// The PowerDNS operator provisions the zone and reports progress through
/// [`ZoneStatus::sync_status`].
///
/// # Example
///
/// ```yaml
/// apiVersion: dns.cav.enablers.ob/v1alpha2
/// kind: Zone
/// metadata:
///   name: 0f1e2d3c.example.com
///   namespace: tenant-a
///   labels:
///     dockyards.io/cluster-name: cluster-a
/// spec:
///   kind: Native
///   nameservers:
///     - ns1.0f1e2d3c.example.com
/// ```
#[derive(CustomResource, Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "dns.cav.enablers.ob",
    version = "v1alpha2",
    kind = "Zone",
    namespaced,
    derive = "Default",
    doc = "Zone is a DNS zone provisioned by the PowerDNS operator."
)]
#[kube(status = "ZoneStatus")]
#[serde(rename_all = "camelCase")]
pub struct ZoneSpec {
    /// PowerDNS zone kind (`Native`, `Master`, `Slave`, `Producer`, `Consumer`).
    pub kind: String,

    /// Nameservers published in the zone's NS records.
    pub nameservers: Vec<String>,

    /// Catalog zone this zone is a member of.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,

    /// SOA-EDIT-API setting of the zone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soa_edit_api: Option<String>,
}

/// `Zone` status, written by the PowerDNS operator only.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ZoneStatus {
    /// Zone identifier inside PowerDNS.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Current serial reported by PowerDNS.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<u32>,

    /// Generation the PowerDNS operator last acted on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// Provisioning outcome: `Pending`, `Succeeded` or `Failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_status: Option<String>,

    /// Error reported on the last failed sync.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_error_description: Option<String>,
}

/// Lifecycle state of a zone as seen by the zone reconciler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZoneSyncState {
    /// Not provisioned yet, or status not observed for the current generation
    Pending,
    /// Provisioned by the PowerDNS operator
    Succeeded,
    /// Provisioning failed; the PowerDNS operator retries on its own
    Failed,
    /// Marked for deletion
    Deleting,
}

impl fmt::Display for ZoneSyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "Pending",
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
            Self::Deleting => "Deleting",
        };
        f.write_str(s)
    }
}

impl Zone {
    /// Returns `true` if the operator observed at least `min_generation` and
    /// reported `expected` as sync status.
    #[must_use]
    pub fn is_in_expected_status(&self, min_generation: i64, expected: &str) -> bool {
        self.status.as_ref().is_some_and(|status| {
            status
                .observed_generation
                .is_some_and(|generation| generation >= min_generation)
                && status.sync_status.as_deref() == Some(expected)
        })
    }

    /// Classifies the zone into the states the zone reconciler distinguishes.
    #[must_use]
    pub fn sync_state(&self) -> ZoneSyncState {
        if self.metadata.deletion_timestamp.is_some() {
            return ZoneSyncState::Deleting;
        }

        if self.is_in_expected_status(ZONE_MIN_OBSERVED_GENERATION, ZONE_SYNC_STATUS_SUCCEEDED) {
            return ZoneSyncState::Succeeded;
        }

        match self
            .status
            .as_ref()
            .and_then(|status| status.sync_status.as_deref())
        {
            Some("Failed") => ZoneSyncState::Failed,
            _ => ZoneSyncState::Pending,
        }
    }
}

/// Reference from a record set to the zone it belongs to.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ZoneRef {
    /// Zone name.
    pub name: String,

    /// Zone kind (`Zone` or `ClusterZone`).
    pub kind: String,
}

/// `RRset` declares one DNS resource record set inside a zone.
#[derive(CustomResource, Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "dns.cav.enablers.ob",
    version = "v1alpha2",
    kind = "RRset",
    namespaced,
    derive = "Default",
    doc = "RRset is a DNS record set provisioned by the PowerDNS operator."
)]
#[kube(status = "RRsetStatus")]
#[serde(rename_all = "camelCase")]
pub struct RRsetSpec {
    /// Record type (`A`, `SOA`, ...).
    pub r#type: String,

    /// Time to live in seconds.
    pub ttl: u32,

    /// Owner name, relative to the zone or fully qualified with a trailing dot.
    pub name: String,

    /// Record contents in presentation format.
    pub records: Vec<String>,

    /// Comment stored alongside the record set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    /// Zone the record set belongs to.
    pub zone_ref: ZoneRef,
}

/// `RRset` status, written by the PowerDNS operator only.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RRsetStatus {
    /// Fully qualified name of the record set in PowerDNS.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_entry_name: Option<String>,

    /// Generation the PowerDNS operator last acted on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// Provisioning outcome: `Pending`, `Succeeded` or `Failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_status: Option<String>,
}
