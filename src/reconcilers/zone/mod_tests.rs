// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for the zone reconciler

#[cfg(test)]
mod tests {
    use crate::config::{ConfigKey, StaticConfig};
    use crate::crd::{Cluster, RRset, RRsetSpec, Workload, WorkloadSpec, Zone, ZoneSyncState};
    use crate::errors::Error;
    use crate::labels::ANNOTATION_SKIP_REMEDIATION;
    use crate::reconcilers::fixtures::{
        self, API_KEY, CLUSTER_NAME, CLUSTER_UID, NAMESPACE, PDNS_NAME, PDNS_NAMESPACE, ZONE_NAME,
    };
    use crate::reconcilers::zone::ZoneReconciler;
    use crate::reconcilers::{ReconcileOutcome, WaitReason};
    use crate::store::memory::InMemoryStore;
    use chrono::{NaiveDate, Utc};
    use k8s_openapi::api::core::v1::Secret;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    const SOA_NAME: &str = "soa.abc123.test.com";
    const NS1_NAME: &str = "ns1.abc123.test.com";
    const WORKLOAD_NAME: &str = "cluster-a-external-dns";

    fn june_15() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    fn june_16() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 16).unwrap()
    }

    fn reconciler(store: &InMemoryStore) -> ZoneReconciler<InMemoryStore, StaticConfig> {
        ZoneReconciler::new(Arc::new(store.clone()), Arc::new(fixtures::config())).with_clock(june_15)
    }

    fn store_with_zone(zone: Zone) -> InMemoryStore {
        let store = fixtures::seeded_store();
        store.insert(&zone).unwrap();
        store
    }

    fn assert_nothing_written(store: &InMemoryStore) {
        assert_eq!(store.writes(), 0);
        assert_eq!(store.count::<RRset>(), 0);
        assert_eq!(store.count::<Workload>(), 0);
    }

    #[tokio::test]
    async fn test_succeeded_zone_converges_records_and_workload() {
        let store = store_with_zone(fixtures::succeeded_zone());

        let outcome = reconciler(&store).reconcile(NAMESPACE, ZONE_NAME).await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::Converged);

        let soa: RRset = store.fetch(NAMESPACE, SOA_NAME).expect("SOA rrset");
        assert_eq!(soa.spec.r#type, "SOA");
        assert_eq!(soa.spec.ttl, 3600);
        assert_eq!(soa.spec.name, "abc123.test.com.");
        assert_eq!(
            soa.spec.records,
            vec![
                "ns1.abc123.test.com. hostmaster.abc123.test.com. 2025061501 10800 3600 604800 3600"
                    .to_string()
            ]
        );

        let ns1: RRset = store.fetch(NAMESPACE, NS1_NAME).expect("A rrset");
        assert_eq!(ns1.spec.r#type, "A");
        assert_eq!(ns1.spec.ttl, 300);
        assert_eq!(ns1.spec.name, "ns1");
        assert_eq!(ns1.spec.records, vec!["1.2.3.4".to_string()]);

        let workload: Workload = store.fetch(NAMESPACE, WORKLOAD_NAME).expect("workload");
        assert_eq!(workload.spec.target_namespace, "external-dns");
        let raw = serde_json::to_string(&workload.spec.input).unwrap();
        assert!(raw.contains(r#""EXTERNAL_DNS_PDNS_SERVER":"http://5.6.7.8:8081""#));
        assert!(raw.contains(r#""EXTERNAL_DNS_DOMAIN_FILTER":"abc123.test.com""#));
        assert!(raw.contains(API_KEY));

        assert_eq!(store.writes(), 3);
    }

    #[tokio::test]
    async fn test_default_clock_uses_current_utc_date() {
        let store = store_with_zone(fixtures::succeeded_zone());
        let reconciler = ZoneReconciler::new(Arc::new(store.clone()), Arc::new(fixtures::config()));

        let before = Utc::now().date_naive();
        reconciler.reconcile(NAMESPACE, ZONE_NAME).await.unwrap();
        let after = Utc::now().date_naive();

        let soa: RRset = store.fetch(NAMESPACE, SOA_NAME).unwrap();
        let serial = soa.spec.records[0].split(' ').nth(2).unwrap().to_string();
        let expected: Vec<String> = [before, after]
            .iter()
            .map(|date| format!("{}01", date.format("%Y%m%d")))
            .collect();
        assert!(expected.contains(&serial), "unexpected serial {serial}");
    }

    #[tokio::test]
    async fn test_children_are_owned_by_their_parents() {
        let store = store_with_zone(fixtures::succeeded_zone());
        reconciler(&store).reconcile(NAMESPACE, ZONE_NAME).await.unwrap();

        for name in [SOA_NAME, NS1_NAME] {
            let rrset: RRset = store.fetch(NAMESPACE, name).unwrap();
            let owners = rrset.metadata.owner_references.unwrap();
            assert_eq!(owners.len(), 1, "{name}");
            assert_eq!(owners[0].kind, "Zone");
            assert_eq!(owners[0].api_version, "dns.cav.enablers.ob/v1alpha2");
            assert_eq!(owners[0].name, ZONE_NAME);
            assert_eq!(owners[0].uid, "zone-uid");
            assert_eq!(rrset.spec.zone_ref.name, ZONE_NAME);
            assert_eq!(rrset.spec.zone_ref.kind, "Zone");
        }

        let workload: Workload = store.fetch(NAMESPACE, WORKLOAD_NAME).unwrap();
        let owners = workload.metadata.owner_references.unwrap();
        assert_eq!(owners.len(), 1);
        assert_eq!(owners[0].kind, "Cluster");
        assert_eq!(owners[0].name, CLUSTER_NAME);
        assert_eq!(owners[0].uid, CLUSTER_UID);
    }

    #[tokio::test]
    async fn test_second_pass_writes_nothing() {
        let store = store_with_zone(fixtures::succeeded_zone());
        let reconciler = reconciler(&store);

        reconciler.reconcile(NAMESPACE, ZONE_NAME).await.unwrap();
        let writes = store.writes();
        reconciler.reconcile(NAMESPACE, ZONE_NAME).await.unwrap();

        assert_eq!(store.writes(), writes);
    }

    #[tokio::test]
    async fn test_serial_follows_the_date() {
        let store = store_with_zone(fixtures::succeeded_zone());
        reconciler(&store).reconcile(NAMESPACE, ZONE_NAME).await.unwrap();

        ZoneReconciler::new(Arc::new(store.clone()), Arc::new(fixtures::config()))
            .with_clock(june_16)
            .reconcile(NAMESPACE, ZONE_NAME)
            .await
            .unwrap();

        let soa: RRset = store.fetch(NAMESPACE, SOA_NAME).unwrap();
        assert!(soa.spec.records[0].contains(" 2025061601 "));
        assert_eq!(store.writes(), 4);
    }

    #[tokio::test]
    async fn test_address_drift_updates_a_record() {
        let store = store_with_zone(fixtures::succeeded_zone());
        let reconciler = reconciler(&store);
        reconciler.reconcile(NAMESPACE, ZONE_NAME).await.unwrap();

        store.insert(&fixtures::dns_service(Some("9.9.9.9"))).unwrap();
        reconciler.reconcile(NAMESPACE, ZONE_NAME).await.unwrap();

        let ns1: RRset = store.fetch(NAMESPACE, NS1_NAME).unwrap();
        assert_eq!(ns1.spec.records, vec!["9.9.9.9".to_string()]);
    }

    #[tokio::test]
    async fn test_pending_zone_is_ignored() {
        let store = store_with_zone(fixtures::zone(Some("Pending"), Some(1)));

        let outcome = reconciler(&store).reconcile(NAMESPACE, ZONE_NAME).await.unwrap();

        assert_eq!(
            outcome,
            ReconcileOutcome::Waiting(WaitReason::ZoneNotReady(ZoneSyncState::Pending))
        );
        assert_nothing_written(&store);
    }

    #[tokio::test]
    async fn test_failed_zone_is_ignored() {
        let store = store_with_zone(fixtures::zone(Some("Failed"), Some(1)));

        let outcome = reconciler(&store).reconcile(NAMESPACE, ZONE_NAME).await.unwrap();

        assert_eq!(
            outcome,
            ReconcileOutcome::Waiting(WaitReason::ZoneNotReady(ZoneSyncState::Failed))
        );
        assert_nothing_written(&store);
    }

    #[tokio::test]
    async fn test_unobserved_generation_is_ignored() {
        let store = store_with_zone(fixtures::zone(Some("Succeeded"), Some(0)));

        let outcome = reconciler(&store).reconcile(NAMESPACE, ZONE_NAME).await.unwrap();

        assert!(!outcome.is_converged());
        assert_nothing_written(&store);
    }

    #[tokio::test]
    async fn test_zone_without_status_is_ignored() {
        let mut zone = fixtures::succeeded_zone();
        zone.status = None;
        let store = store_with_zone(zone);

        let outcome = reconciler(&store).reconcile(NAMESPACE, ZONE_NAME).await.unwrap();

        assert!(!outcome.is_converged());
        assert_nothing_written(&store);
    }

    #[tokio::test]
    async fn test_deleting_zone_is_ignored() {
        let mut zone = fixtures::succeeded_zone();
        zone.metadata.deletion_timestamp = Some(Time(k8s_openapi::jiff::Timestamp::now()));
        let store = store_with_zone(zone);

        let outcome = reconciler(&store).reconcile(NAMESPACE, ZONE_NAME).await.unwrap();

        assert_eq!(outcome, ReconcileOutcome::Waiting(WaitReason::Deleting));
        assert_nothing_written(&store);
    }

    #[tokio::test]
    async fn test_deleting_cluster_is_ignored() {
        let store = store_with_zone(fixtures::succeeded_zone());
        let mut cluster: Cluster = fixtures::cluster();
        cluster.metadata.deletion_timestamp = Some(Time(k8s_openapi::jiff::Timestamp::now()));
        store.insert(&cluster).unwrap();

        let outcome = reconciler(&store).reconcile(NAMESPACE, ZONE_NAME).await.unwrap();

        assert_eq!(outcome, ReconcileOutcome::Waiting(WaitReason::Deleting));
        assert_nothing_written(&store);
    }

    #[tokio::test]
    async fn test_zone_without_cluster_label_is_ignored() {
        let mut zone = fixtures::succeeded_zone();
        zone.metadata.labels = Some(BTreeMap::new());
        let store = store_with_zone(zone);

        let outcome = reconciler(&store).reconcile(NAMESPACE, ZONE_NAME).await.unwrap();

        assert_eq!(outcome, ReconcileOutcome::Waiting(WaitReason::Unlinked));
        assert_nothing_written(&store);
    }

    #[tokio::test]
    async fn test_missing_zone_is_not_an_error() {
        let store = fixtures::seeded_store();

        let outcome = reconciler(&store).reconcile(NAMESPACE, ZONE_NAME).await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::Waiting(WaitReason::NotFound));
    }

    #[tokio::test]
    async fn test_missing_cluster_is_an_error() {
        let store = InMemoryStore::new();
        store.insert(&fixtures::succeeded_zone()).unwrap();

        let err = reconciler(&store).reconcile(NAMESPACE, ZONE_NAME).await.unwrap_err();

        assert!(matches!(err, Error::NotFound { .. }));
        assert_nothing_written(&store);
    }

    #[tokio::test]
    async fn test_missing_dns_address_writes_nothing() {
        let store = store_with_zone(fixtures::succeeded_zone());
        store.insert(&fixtures::dns_service(None)).unwrap();

        let err = reconciler(&store).reconcile(NAMESPACE, ZONE_NAME).await.unwrap_err();

        assert!(matches!(err, Error::NoDnsAddress { .. }));
        assert_nothing_written(&store);
    }

    #[tokio::test]
    async fn test_missing_api_addresses_writes_nothing() {
        let store = store_with_zone(fixtures::succeeded_zone());
        store.insert(&fixtures::api_service(&[])).unwrap();

        let err = reconciler(&store).reconcile(NAMESPACE, ZONE_NAME).await.unwrap_err();

        assert!(matches!(err, Error::NoApiAddresses { .. }));
        assert_nothing_written(&store);
    }

    #[tokio::test]
    async fn test_missing_provider_config_writes_nothing() {
        let store = store_with_zone(fixtures::succeeded_zone());
        let config = StaticConfig::from_pairs([(ConfigKey::PdnsNamespace, PDNS_NAMESPACE)]);
        let reconciler = ZoneReconciler::new(Arc::new(store.clone()), Arc::new(config));

        let err = reconciler.reconcile(NAMESPACE, ZONE_NAME).await.unwrap_err();

        assert!(matches!(err, Error::MissingConfig { key: "pdnsName" }));
        assert_nothing_written(&store);
    }

    #[tokio::test]
    async fn test_missing_public_namespace_is_reported() {
        let store = store_with_zone(fixtures::succeeded_zone());
        let config = StaticConfig::from_pairs([
            (ConfigKey::PdnsName, PDNS_NAME),
            (ConfigKey::PdnsNamespace, PDNS_NAMESPACE),
        ]);
        let reconciler = ZoneReconciler::new(Arc::new(store.clone()), Arc::new(config));

        let err = reconciler.reconcile(NAMESPACE, ZONE_NAME).await.unwrap_err();

        assert!(matches!(err, Error::MissingConfig { key: "publicNamespace" }));
        assert_eq!(store.count::<Workload>(), 0);
    }

    #[tokio::test]
    async fn test_missing_credential_secret_is_reported() {
        let store = InMemoryStore::new();
        store.insert(&fixtures::cluster()).unwrap();
        store.insert(&fixtures::succeeded_zone()).unwrap();
        store.insert(&fixtures::dns_service(Some("1.2.3.4"))).unwrap();
        store.insert(&fixtures::api_service(&["5.6.7.8"])).unwrap();

        let err = reconciler(&store).reconcile(NAMESPACE, ZONE_NAME).await.unwrap_err();

        assert!(matches!(err, Error::MissingCredential { .. }));
        assert_eq!(store.count::<Workload>(), 0);
    }

    #[tokio::test]
    async fn test_missing_api_key_is_reported() {
        let store = store_with_zone(fixtures::succeeded_zone());
        store.insert(&fixtures::credential_secret(None)).unwrap();

        let err = reconciler(&store).reconcile(NAMESPACE, ZONE_NAME).await.unwrap_err();

        assert!(matches!(err, Error::MissingCredential { key: "PDNS_API_KEY", .. }));
        assert_eq!(store.count::<Workload>(), 0);
    }

    #[tokio::test]
    async fn test_skip_remediation_leaves_workload_untouched() {
        let store = store_with_zone(fixtures::succeeded_zone());
        let mut workload = Workload::new(
            WORKLOAD_NAME,
            WorkloadSpec {
                target_namespace: "hand-tuned".to_string(),
                input: Some(serde_json::json!({"provider": "manual"})),
                ..Default::default()
            },
        );
        workload.metadata.namespace = Some(NAMESPACE.to_string());
        workload.metadata.annotations = Some(BTreeMap::from([(
            ANNOTATION_SKIP_REMEDIATION.to_string(),
            "true".to_string(),
        )]));
        let seeded = store.insert(&workload).unwrap();
        let before = serde_json::to_vec(&seeded).unwrap();

        let reconciler = reconciler(&store);
        reconciler.reconcile(NAMESPACE, ZONE_NAME).await.unwrap();
        reconciler.reconcile(NAMESPACE, ZONE_NAME).await.unwrap();

        let after: Workload = store.fetch(NAMESPACE, WORKLOAD_NAME).unwrap();
        assert_eq!(serde_json::to_vec(&after).unwrap(), before);
        assert_eq!(store.writes(), 2, "only the two record sets are written");
    }

    #[tokio::test]
    async fn test_skip_remediation_leaves_rrset_untouched() {
        let store = store_with_zone(fixtures::succeeded_zone());
        let mut soa = RRset::new(
            SOA_NAME,
            RRsetSpec {
                r#type: "SOA".to_string(),
                ttl: 42,
                records: vec!["manual".to_string()],
                ..Default::default()
            },
        );
        soa.metadata.namespace = Some(NAMESPACE.to_string());
        soa.metadata.annotations = Some(BTreeMap::from([(
            ANNOTATION_SKIP_REMEDIATION.to_string(),
            "true".to_string(),
        )]));
        let seeded = store.insert(&soa).unwrap();
        let before = serde_json::to_vec(&seeded).unwrap();

        let reconciler = reconciler(&store);
        reconciler.reconcile(NAMESPACE, ZONE_NAME).await.unwrap();
        reconciler.reconcile(NAMESPACE, ZONE_NAME).await.unwrap();

        let after: RRset = store.fetch(NAMESPACE, SOA_NAME).unwrap();
        assert_eq!(serde_json::to_vec(&after).unwrap(), before);
        assert_eq!(after.spec.ttl, 42);
        assert_eq!(after.spec.records, vec!["manual".to_string()]);

        let ns1: RRset = store.fetch(NAMESPACE, NS1_NAME).unwrap();
        assert_eq!(ns1.spec.records, vec!["1.2.3.4".to_string()]);
        assert_eq!(store.writes(), 2, "only the ns1 record set and the workload are written");
    }

    #[tokio::test]
    async fn test_skip_remediation_does_not_need_credential_key() {
        let store = store_with_zone(fixtures::succeeded_zone());
        store.insert(&fixtures::credential_secret(None)).unwrap();
        let mut workload = Workload::default();
        workload.metadata.name = Some(WORKLOAD_NAME.to_string());
        workload.metadata.namespace = Some(NAMESPACE.to_string());
        workload.metadata.annotations = Some(BTreeMap::from([(
            ANNOTATION_SKIP_REMEDIATION.to_string(),
            String::new(),
        )]));
        store.insert(&workload).unwrap();

        let outcome = reconciler(&store).reconcile(NAMESPACE, ZONE_NAME).await.unwrap();
        assert!(outcome.is_converged());
    }

    #[tokio::test]
    async fn test_credential_rotation_updates_workload() {
        let store = store_with_zone(fixtures::succeeded_zone());
        let reconciler = reconciler(&store);
        reconciler.reconcile(NAMESPACE, ZONE_NAME).await.unwrap();

        let rotated: Secret = fixtures::credential_secret(Some("rotated-key"));
        store.insert(&rotated).unwrap();
        reconciler.reconcile(NAMESPACE, ZONE_NAME).await.unwrap();

        let workload: Workload = store.fetch(NAMESPACE, WORKLOAD_NAME).unwrap();
        let input = workload.spec.input.unwrap();
        assert_eq!(input["credentials"]["pdnsApiKey"], "rotated-key");
    }
}
