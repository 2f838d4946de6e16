// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciliation logic for the cluster DNS pipeline.
//!
//! Two reconcilers compose into a pipeline:
//!
//! 1. [`ClusterReconciler`] - derives one PowerDNS `Zone` per owned `Cluster`
//! 2. [`ZoneReconciler`] - once the zone is provisioned, derives its SOA and
//!    `ns1` record sets and the external-dns `Workload` of the cluster
//!
//! Both are plain functions of a resource identifier `(namespace, name)`: they
//! read fresh state from the [`ResourceStore`](crate::store::ResourceStore),
//! converge the children with [`resources::create_or_update`] and report a
//! [`ReconcileOutcome`]. Retry and backoff belong to the controller runtime.
//!
//! # Example: Running a Pass
//!
//! ```rust,no_run
//! use clusterdns::config::StaticConfig;
//! use clusterdns::reconcilers::ClusterReconciler;
//! use clusterdns::store::KubeStore;
//! use std::sync::Arc;
//!
//! async fn reconcile_cluster(store: KubeStore, config: StaticConfig) -> clusterdns::errors::Result<()> {
//!     let reconciler = ClusterReconciler::new(Arc::new(store), Arc::new(config));
//!     let outcome = reconciler.reconcile("tenant-a", "cluster-a").await?;
//!     println!("cluster-a: {outcome}");
//!     Ok(())
//! }
//! ```

pub mod cluster;
pub mod owner;
pub mod resources;
pub mod zone;

#[cfg(test)]
pub(crate) mod fixtures;

pub use cluster::{zone_name, ClusterReconciler};
pub use owner::{resolve_owner_organization, OwnerRef};
pub use resources::{create_or_update, skips_remediation, OperationResult};
pub use zone::ZoneReconciler;

use crate::crd::ZoneSyncState;
use std::fmt;

/// Why a pass ended without converging any children.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitReason {
    /// The reconciled object no longer exists
    NotFound,
    /// The reconciled object (or its cluster) is being deleted
    Deleting,
    /// The cluster has no owning organization yet
    NoOwner,
    /// The zone has not been provisioned by PowerDNS yet
    ZoneNotReady(ZoneSyncState),
    /// The zone carries no cluster-name label
    Unlinked,
}

impl fmt::Display for WaitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => f.write_str("not found"),
            Self::Deleting => f.write_str("being deleted"),
            Self::NoOwner => f.write_str("no owner organization"),
            Self::ZoneNotReady(state) => write!(f, "zone is {state}"),
            Self::Unlinked => f.write_str("no cluster label"),
        }
    }
}

/// Result of a successful reconciliation pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// All children were converged to their desired state
    Converged,
    /// Nothing to do until one of the inputs changes
    Waiting(WaitReason),
}

impl ReconcileOutcome {
    /// Whether the pass wrote (or verified) the children.
    #[must_use]
    pub fn is_converged(&self) -> bool {
        matches!(self, Self::Converged)
    }
}

impl fmt::Display for ReconcileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Converged => f.write_str("converged"),
            Self::Waiting(reason) => write!(f, "waiting ({reason})"),
        }
    }
}
