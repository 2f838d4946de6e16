// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Common test utilities for integration tests

#![allow(dead_code)]

use clusterdns::config::{ConfigKey, StaticConfig};
use clusterdns::constants::{DOCKYARDS_API_GROUP_VERSION, KIND_ORGANIZATION};
use clusterdns::crd::{Cluster, ClusterSpec, Organization, OrganizationSpec};
use clusterdns::store::memory::InMemoryStore;
use k8s_openapi::api::core::v1::{
    LoadBalancerIngress, LoadBalancerStatus, Secret, Service, ServiceSpec, ServiceStatus,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use k8s_openapi::ByteString;
use kube::Client;
use std::collections::BTreeMap;

pub const NAMESPACE: &str = "tenant-a";
pub const MANAGEMENT_DOMAIN: &str = "test.com";
pub const PDNS_NAME: &str = "pdns";
pub const PDNS_NAMESPACE: &str = "pdns-system";
pub const PUBLIC_NAMESPACE: &str = "dockyards-public";
pub const API_KEY: &str = "s3cr3t";
pub const DNS_ADDRESS: &str = "1.2.3.4";
pub const API_ADDRESS: &str = "5.6.7.8";

/// Get a Kubernetes client or skip the test if not in a cluster
pub async fn get_kube_client_or_skip() -> Option<Client> {
    match Client::try_default().await {
        Ok(client) => Some(client),
        Err(e) => {
            eprintln!("Skipping integration test: not running in Kubernetes cluster: {e}");
            None
        }
    }
}

pub fn config() -> StaticConfig {
    StaticConfig::from_pairs([
        (ConfigKey::ManagementDomain, MANAGEMENT_DOMAIN),
        (ConfigKey::PdnsName, PDNS_NAME),
        (ConfigKey::PdnsNamespace, PDNS_NAMESPACE),
        (ConfigKey::PublicNamespace, PUBLIC_NAMESPACE),
    ])
}

pub fn organization(name: &str) -> Organization {
    let mut org = Organization::new(name, OrganizationSpec::default());
    org.metadata.uid = Some(format!("{name}-uid"));
    org
}

/// Cluster in [`NAMESPACE`], owned by `organization` when given.
pub fn cluster(name: &str, uid: &str, organization: Option<&str>) -> Cluster {
    Cluster {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(NAMESPACE.to_string()),
            uid: Some(uid.to_string()),
            owner_references: organization.map(|org| {
                vec![OwnerReference {
                    api_version: DOCKYARDS_API_GROUP_VERSION.to_string(),
                    kind: KIND_ORGANIZATION.to_string(),
                    name: org.to_string(),
                    uid: format!("{org}-uid"),
                    ..Default::default()
                }]
            }),
            ..Default::default()
        },
        spec: ClusterSpec::default(),
    }
}

fn service_meta(name: String) -> ObjectMeta {
    ObjectMeta {
        name: Some(name),
        namespace: Some(PDNS_NAMESPACE.to_string()),
        ..Default::default()
    }
}

pub fn dns_service(ingress_ip: Option<&str>) -> Service {
    Service {
        metadata: service_meta(format!("{PDNS_NAME}-dns")),
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
        metadata: service_meta(format!("{PDNS_NAME}-api")),
        spec: Some(ServiceSpec {
            cluster_ips: Some(cluster_ips.iter().map(|ip| (*ip).to_string()).collect()),
            ..Default::default()
        }),
        status: None,
    }
}

pub fn credential_secret(api_key: &str) -> Secret {
    Secret {
        metadata: service_meta(PDNS_NAME.to_string()),
        data: Some(BTreeMap::from([(
            "PDNS_API_KEY".to_string(),
            ByteString(api_key.as_bytes().to_vec()),
        )])),
        ..Default::default()
    }
}

/// Store holding the PowerDNS services and credential, without any cluster.
pub fn provider_store() -> InMemoryStore {
    let store = InMemoryStore::new();
    store.insert(&dns_service(Some(DNS_ADDRESS))).unwrap();
    store.insert(&api_service(&[API_ADDRESS])).unwrap();
    store.insert(&credential_secret(API_KEY)).unwrap();
    store
}
