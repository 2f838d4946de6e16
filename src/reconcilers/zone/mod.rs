// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Zone reconciliation: record sets and external-dns for provisioned zones.
//!
//! A zone is only acted on once the PowerDNS operator reports it as
//! `Succeeded` for a generation of at least 1. Each pass then runs, in order:
//!
//! 1. **Cluster lookup** - via the zone's `dockyards.io/cluster-name` label
//! 2. **Address discovery** - see [`discovery`]
//! 3. **Record sets** - SOA and `ns1` A record, see [`records`]
//! 4. **Workload** - the cluster's external-dns workload, see [`workload`]
//!
//! Each step reads fresh state; a failing step aborts the pass before any
//! later step writes.

pub mod discovery;
pub mod records;
pub mod workload;

use crate::config::{ConfigKey, ConfigReader};
use crate::constants::PDNS_API_KEY_SECRET_KEY;
use crate::crd::{Cluster, RRset, RRsetSpec, Workload, Zone, ZoneSyncState};
use crate::errors::{Error, Result};
use crate::labels::LABEL_CLUSTER_NAME;
use crate::reconcilers::owner::OwnerRef;
use crate::reconcilers::resources::{create_or_update, skips_remediation, OperationResult};
use crate::reconcilers::{ReconcileOutcome, WaitReason};
use crate::store::ResourceStore;
use chrono::{NaiveDate, Utc};
use discovery::{ProviderAddresses, ProviderLocation};
use k8s_openapi::api::core::v1::Secret;
use kube::ResourceExt;
use std::sync::Arc;
use tracing::{debug, info};

fn utc_today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Converges the record sets and external-dns workload of a zone.
pub struct ZoneReconciler<S, C> {
    store: Arc<S>,
    config: Arc<C>,
    today: fn() -> NaiveDate,
}

impl<S, C> ZoneReconciler<S, C>
where
    S: ResourceStore,
    C: ConfigReader,
{
    /// Creates a reconciler reading and writing through `store`.
    pub fn new(store: Arc<S>, config: Arc<C>) -> Self {
        Self {
            store,
            config,
            today: utc_today,
        }
    }

    /// Replaces the clock used for the SOA serial date.
    #[must_use]
    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Reconciles the zone `namespace/name`.
    ///
    /// # Errors
    ///
    /// Returns an error if any input cannot be read, the PowerDNS addresses
    /// or credential are unavailable, a required configuration key is empty,
    /// or a write fails.
    pub async fn reconcile(&self, namespace: &str, name: &str) -> Result<ReconcileOutcome> {
        let Some(zone) = self.store.get::<Zone>(namespace, name).await? else {
            debug!(namespace = %namespace, zone = %name, "Zone not found, nothing to do");
            return Ok(ReconcileOutcome::Waiting(WaitReason::NotFound));
        };

        match zone.sync_state() {
            ZoneSyncState::Succeeded => {}
            ZoneSyncState::Deleting => {
                debug!(namespace = %namespace, zone = %name, "Zone is being deleted, skipping");
                return Ok(ReconcileOutcome::Waiting(WaitReason::Deleting));
            }
            state => {
                info!(
                    zone = %name,
                    sync_status = ?zone.status.as_ref().and_then(|s| s.sync_status.as_deref()),
                    "Ignoring zone in non-Succeeded status"
                );
                return Ok(ReconcileOutcome::Waiting(WaitReason::ZoneNotReady(state)));
            }
        }

        let Some(cluster_name) = zone
            .labels()
            .get(LABEL_CLUSTER_NAME)
            .filter(|value| !value.is_empty())
            .cloned()
        else {
            debug!(namespace = %namespace, zone = %name, "Zone has no cluster label, skipping");
            return Ok(ReconcileOutcome::Waiting(WaitReason::Unlinked));
        };

        let cluster = self
            .store
            .get::<Cluster>(namespace, &cluster_name)
            .await?
            .ok_or_else(|| Error::not_found::<Cluster>(namespace, &cluster_name))?;
        if cluster.metadata.deletion_timestamp.is_some() {
            debug!(namespace = %namespace, cluster = %cluster_name, "Cluster is being deleted, skipping");
            return Ok(ReconcileOutcome::Waiting(WaitReason::Deleting));
        }

        let location = ProviderLocation::from_config(self.config.as_ref())?;
        let addresses = ProviderAddresses::discover(self.store.as_ref(), &location).await?;

        self.reconcile_rrsets(namespace, &zone, &addresses).await?;
        self.reconcile_external_dns(namespace, &zone, &cluster, &location, &addresses)
            .await?;

        Ok(ReconcileOutcome::Converged)
    }

    async fn upsert_rrset(
        &self,
        namespace: &str,
        name: &str,
        owner: &OwnerRef,
        spec: RRsetSpec,
    ) -> Result<OperationResult> {
        let (_, result) = create_or_update(self.store.as_ref(), namespace, name, |rrset: &mut RRset| {
            if skips_remediation(rrset) {
                debug!(rrset = %name, "RRset is marked skip-remediation, leaving it untouched");
                return Ok(());
            }

            owner.set_sole_owner(rrset);
            rrset.spec = spec;
            Ok(())
        })
        .await?;
        Ok(result)
    }

    async fn reconcile_rrsets(
        &self,
        namespace: &str,
        zone: &Zone,
        addresses: &ProviderAddresses,
    ) -> Result<()> {
        let owner = OwnerRef::for_resource(zone)?;
        let zone_name = owner.name().to_string();

        let soa_name = records::soa_rrset_name(&zone_name);
        let soa_spec = records::soa_rrset_spec(&zone_name, (self.today)());
        let result = self
            .upsert_rrset(namespace, &soa_name, &owner, soa_spec)
            .await?;
        info!(zone = %zone_name, rrset = %soa_name, operation = %result, "Reconciled zone SOA RRset");

        let ns1_name = records::ns1_rrset_name(&zone_name);
        let ns1_spec = records::ns1_rrset_spec(&zone_name, addresses.dns());
        let result = self
            .upsert_rrset(namespace, &ns1_name, &owner, ns1_spec)
            .await?;
        info!(zone = %zone_name, rrset = %ns1_name, operation = %result, "Reconciled zone A RRset");

        Ok(())
    }

    async fn reconcile_external_dns(
        &self,
        namespace: &str,
        zone: &Zone,
        cluster: &Cluster,
        location: &ProviderLocation,
        addresses: &ProviderAddresses,
    ) -> Result<()> {
        let owner = OwnerRef::for_resource(cluster)?;
        let zone_name = zone.name_any();

        let secret = self
            .store
            .get::<Secret>(&location.namespace, &location.name)
            .await?
            .ok_or_else(|| Error::MissingCredential {
                secret: format!("{}/{}", location.namespace, location.name),
                key: PDNS_API_KEY_SECRET_KEY,
            })?;
        let public_namespace = self.config.require(ConfigKey::PublicNamespace)?;

        let name = workload::workload_name(owner.name());
        let (_, result) = create_or_update(self.store.as_ref(), namespace, &name, |target: &mut Workload| {
            if skips_remediation(target) {
                return Ok(());
            }

            let api_key = workload::api_key(&secret)?;
            let input = workload::external_dns_input(&zone_name, &api_key, addresses);
            workload::apply_external_dns(target, &owner, &public_namespace, input);
            Ok(())
        })
        .await?;

        info!(
            cluster = %owner.name(),
            workload = %name,
            operation = %result,
            "Reconciled external-dns workload"
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod mod_tests;
