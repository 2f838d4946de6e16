// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Cluster reconciliation: one PowerDNS zone per owned cluster.
//!
//! The zone is named `<cluster UID>.<managementDomain>` and lives in the
//! cluster's namespace. Besides its spec (`Native` kind, `ns1.<zone>` as sole
//! nameserver) the reconciler keeps the cluster-name label and the owner
//! reference to the cluster converged, so the zone reconciler can find the
//! cluster again and deleting the cluster deletes the zone.

use crate::config::{ConfigKey, ConfigReader};
use crate::constants::{PRIMARY_NAMESERVER_LABEL, ZONE_KIND_NATIVE};
use crate::crd::{Cluster, Zone, ZoneSpec};
use crate::errors::Result;
use crate::labels::LABEL_CLUSTER_NAME;
use crate::reconcilers::owner::{resolve_owner_organization, OwnerRef};
use crate::reconcilers::resources::create_or_update;
use crate::reconcilers::{ReconcileOutcome, WaitReason};
use crate::store::ResourceStore;
use kube::ResourceExt;
use std::sync::Arc;
use tracing::{debug, info};

/// Name of the zone derived for a cluster.
#[must_use]
pub fn zone_name(cluster_uid: &str, management_domain: &str) -> String {
    format!("{cluster_uid}.{management_domain}")
}

/// Spec of the zone derived for a cluster.
#[must_use]
pub fn zone_spec(zone_name: &str) -> ZoneSpec {
    ZoneSpec {
        kind: ZONE_KIND_NATIVE.to_string(),
        nameservers: vec![format!("{PRIMARY_NAMESERVER_LABEL}.{zone_name}")],
        ..Default::default()
    }
}

/// Derives and converges the zone of a cluster.
pub struct ClusterReconciler<S, C> {
    store: Arc<S>,
    config: Arc<C>,
}

impl<S, C> ClusterReconciler<S, C>
where
    S: ResourceStore,
    C: ConfigReader,
{
    /// Creates a reconciler reading and writing through `store`.
    pub fn new(store: Arc<S>, config: Arc<C>) -> Self {
        Self { store, config }
    }

    /// Reconciles the cluster `namespace/name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cluster, its organization or the zone cannot be
    /// read or written, if `managementDomain` is not configured, or if the
    /// cluster has no UID.
    pub async fn reconcile(&self, namespace: &str, name: &str) -> Result<ReconcileOutcome> {
        let Some(cluster) = self.store.get::<Cluster>(namespace, name).await? else {
            debug!(namespace = %namespace, cluster = %name, "Cluster not found, nothing to do");
            return Ok(ReconcileOutcome::Waiting(WaitReason::NotFound));
        };

        if cluster.metadata.deletion_timestamp.is_some() {
            debug!(namespace = %namespace, cluster = %name, "Cluster is being deleted, skipping");
            return Ok(ReconcileOutcome::Waiting(WaitReason::Deleting));
        }

        if resolve_owner_organization(self.store.as_ref(), &cluster)
            .await?
            .is_none()
        {
            info!(namespace = %namespace, cluster = %name, "Ignoring cluster without owner organization");
            return Ok(ReconcileOutcome::Waiting(WaitReason::NoOwner));
        }

        self.reconcile_zone(namespace, &cluster).await?;
        Ok(ReconcileOutcome::Converged)
    }

    async fn reconcile_zone(&self, namespace: &str, cluster: &Cluster) -> Result<()> {
        let owner = OwnerRef::for_resource(cluster)?;
        let management_domain = self.config.require(ConfigKey::ManagementDomain)?;
        let name = zone_name(owner.uid(), &management_domain);
        let cluster_name = owner.name().to_string();

        let (_, result) = create_or_update(self.store.as_ref(), namespace, &name, |zone: &mut Zone| {
            zone.labels_mut()
                .insert(LABEL_CLUSTER_NAME.to_string(), cluster_name.clone());
            owner.set_sole_owner(zone);
            zone.spec = zone_spec(&name);
            Ok(())
        })
        .await?;

        info!(
            cluster = %cluster_name,
            zone = %name,
            operation = %result,
            "Reconciled DNS zone"
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "cluster_tests.rs"]
mod cluster_tests;
