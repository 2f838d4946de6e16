// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared builders for reconciler unit tests.

use crate::config::{ConfigKey, StaticConfig};
use crate::constants::{DOCKYARDS_API_GROUP_VERSION, KIND_ORGANIZATION};
use crate::crd::{Cluster, ClusterSpec, Organization, OrganizationSpec, Zone, ZoneSpec, ZoneStatus};
use crate::labels::LABEL_CLUSTER_NAME;
use crate::store::memory::InMemoryStore;
use k8s_openapi::api::core::v1::{
    LoadBalancerIngress, LoadBalancerStatus, Secret, Service, ServiceSpec, ServiceStatus,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use k8s_openapi::ByteString;
use std::collections::BTreeMap;

pub const NAMESPACE: &str = "tenant-a";
pub const CLUSTER_NAME: &str = "cluster-a";
pub const CLUSTER_UID: &str = "abc123";
pub const ORGANIZATION_NAME: &str = "org-a";
pub const MANAGEMENT_DOMAIN: &str = "test.com";
pub const ZONE_NAME: &str = "abc123.test.com";
pub const PDNS_NAME: &str = "pdns";
pub const PDNS_NAMESPACE: &str = "pdns-system";
pub const PUBLIC_NAMESPACE: &str = "dockyards-public";
pub const API_KEY: &str = "s3cr3t";
pub const DNS_ADDRESS: &str = "1.2.3.4";
pub const API_ADDRESS: &str = "5.6.7.8";

pub fn config() -> StaticConfig {
    StaticConfig::from_pairs([
        (ConfigKey::ManagementDomain, MANAGEMENT_DOMAIN),
        (ConfigKey::PdnsName, PDNS_NAME),
        (ConfigKey::PdnsNamespace, PDNS_NAMESPACE),
        (ConfigKey::PublicNamespace, PUBLIC_NAMESPACE),
    ])
}

pub fn organization() -> Organization {
    let mut org = Organization::new(ORGANIZATION_NAME, OrganizationSpec::default());
    org.metadata.uid = Some("org-uid".to_string());
    org
}

pub fn cluster() -> Cluster {
    Cluster {
        metadata: ObjectMeta {
            name: Some(CLUSTER_NAME.to_string()),
            namespace: Some(NAMESPACE.to_string()),
            uid: Some(CLUSTER_UID.to_string()),
            owner_references: Some(vec![OwnerReference {
                api_version: DOCKYARDS_API_GROUP_VERSION.to_string(),
                kind: KIND_ORGANIZATION.to_string(),
                name: ORGANIZATION_NAME.to_string(),
                uid: "org-uid".to_string(),
                ..Default::default()
            }]),
            ..Default::default()
        },
        spec: ClusterSpec::default(),
    }
}

pub fn zone(sync_status: Option<&str>, observed_generation: Option<i64>) -> Zone {
    Zone {
        metadata: ObjectMeta {
            name: Some(ZONE_NAME.to_string()),
            namespace: Some(NAMESPACE.to_string()),
            uid: Some("zone-uid".to_string()),
            generation: Some(1),
            labels: Some(BTreeMap::from([(
                LABEL_CLUSTER_NAME.to_string(),
                CLUSTER_NAME.to_string(),
            )])),
            ..Default::default()
        },
        spec: ZoneSpec {
            kind: "Native".to_string(),
            nameservers: vec![format!("ns1.{ZONE_NAME}")],
            ..Default::default()
        },
        status: Some(ZoneStatus {
            sync_status: sync_status.map(str::to_string),
            observed_generation,
            ..Default::default()
        }),
    }
}

pub fn succeeded_zone() -> Zone {
    zone(Some("Succeeded"), Some(1))
}

pub fn dns_service(ingress_ip: Option<&str>) -> Service {
    Service {
        metadata: ObjectMeta {
            name: Some(format!("{PDNS_NAME}-dns")),
            namespace: Some(PDNS_NAMESPACE.to_string()),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            type_: Some("LoadBalancer".to_string()),
            ..Default::default()
        }),
        status: Some(ServiceStatus {
            load_balancer: Some(LoadBalancerStatus {
                ingress: ingress_ip.map(|ip| {
                    vec![LoadBalancerIngress {
                        ip: Some(ip.to_string()),
                        ..Default::default()
                    }]
                }),
            }),
            ..Default::default()
        }),
    }
}

pub fn api_service(cluster_ips: &[&str]) -> Service {
    Service {
        metadata: ObjectMeta {
            name: Some(format!("{PDNS_NAME}-api")),
            namespace: Some(PDNS_NAMESPACE.to_string()),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            cluster_ips: Some(cluster_ips.iter().map(|ip| (*ip).to_string()).collect()),
            ..Default::default()
        }),
        status: None,
    }
}

pub fn credential_secret(api_key: Option<&str>) -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: Some(PDNS_NAME.to_string()),
            namespace: Some(PDNS_NAMESPACE.to_string()),
            ..Default::default()
        },
        data: api_key.map(|key| {
            BTreeMap::from([(
                "PDNS_API_KEY".to_string(),
                ByteString(key.as_bytes().to_vec()),
            )])
        }),
        ..Default::default()
    }
}

/// Store holding the organization, cluster, provider services and credential.
pub fn seeded_store() -> InMemoryStore {
    let store = InMemoryStore::new();
    store.insert(&organization()).unwrap();
    store.insert(&cluster()).unwrap();
    store.insert(&dns_service(Some(DNS_ADDRESS))).unwrap();
    store.insert(&api_service(&[API_ADDRESS])).unwrap();
    store.insert(&credential_secret(Some(API_KEY))).unwrap();
    store
}
