// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the clusterdns operator.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// API Constants
// ============================================================================

/// API group of the platform resources (clusters, organizations, workloads)
pub const DOCKYARDS_API_GROUP: &str = "dockyards.io";

/// Fully qualified API version (group/version) of the platform resources
pub const DOCKYARDS_API_GROUP_VERSION: &str = "dockyards.io/v1alpha3";

/// Kind name for `Cluster` resource
pub const KIND_CLUSTER: &str = "Cluster";

/// Kind name for `Organization` resource
pub const KIND_ORGANIZATION: &str = "Organization";

/// Kind name for `WorkloadTemplate` resource
pub const KIND_WORKLOAD_TEMPLATE: &str = "WorkloadTemplate";

/// Kind name for `Zone` resource.
///
/// The PowerDNS operator does not export a kind constant, so the literal lives here.
pub const KIND_ZONE: &str = "Zone";

// ============================================================================
// Zone Constants
// ============================================================================

/// PowerDNS zone kind used for every derived zone
pub const ZONE_KIND_NATIVE: &str = "Native";

/// Label of the primary nameserver inside every derived zone
pub const PRIMARY_NAMESERVER_LABEL: &str = "ns1";

/// Local part of the SOA administrator mailbox
pub const HOSTMASTER_LABEL: &str = "hostmaster";

/// Zone sync status reported by the PowerDNS operator once a zone is provisioned
pub const ZONE_SYNC_STATUS_SUCCEEDED: &str = "Succeeded";

/// Minimal observed generation for a zone status to be trusted
pub const ZONE_MIN_OBSERVED_GENERATION: i64 = 1;

// ============================================================================
// DNS Record Constants
// ============================================================================

/// Record type of the start-of-authority record set
pub const RECORD_TYPE_SOA: &str = "SOA";

/// Record type of the nameserver address record set
pub const RECORD_TYPE_A: &str = "A";

/// TTL for zone data records such as the nameserver A record (5 minutes)
pub const ZONE_DATA_TTL_SECS: u32 = 300;

/// TTL of the SOA record set (1 hour)
pub const SOA_TTL_SECS: u32 = 3600;

/// SOA refresh interval (3 hours)
pub const SOA_REFRESH_SECS: u32 = 10800;

/// SOA retry interval (1 hour)
pub const SOA_RETRY_SECS: u32 = 3600;

/// SOA expire time (7 days)
pub const SOA_EXPIRE_SECS: u32 = 604_800;

/// SOA negative caching TTL (1 hour)
pub const SOA_NEGATIVE_TTL_SECS: u32 = 3600;

/// Sequence appended to the `YYYYMMDD` serial date. Same-day changes are not counted.
pub const SOA_SERIAL_SEQUENCE: &str = "01";

// ============================================================================
// PowerDNS Provider Constants
// ============================================================================

/// Suffix of the provider service answering DNS queries
pub const PDNS_DNS_SERVICE_SUFFIX: &str = "-dns";

/// Suffix of the provider service exposing the HTTP API
pub const PDNS_API_SERVICE_SUFFIX: &str = "-api";

/// Port of the PowerDNS HTTP API
pub const PDNS_API_PORT: u16 = 8081;

/// Key of the PowerDNS API key inside the provider credential secret
pub const PDNS_API_KEY_SECRET_KEY: &str = "PDNS_API_KEY";

// ============================================================================
// External DNS Workload Constants
// ============================================================================

/// Suffix appended to the cluster name to form the workload name
pub const EXTERNAL_DNS_WORKLOAD_SUFFIX: &str = "-external-dns";

/// Namespace inside the tenant cluster where external-dns runs
pub const EXTERNAL_DNS_TARGET_NAMESPACE: &str = "external-dns";

/// Name of the workload template that renders external-dns
pub const EXTERNAL_DNS_TEMPLATE_NAME: &str = "external-dns";

/// external-dns provider identifier for PowerDNS
pub const EXTERNAL_DNS_PROVIDER: &str = "pdns";

/// external-dns source watched inside the tenant cluster
pub const EXTERNAL_DNS_SOURCE_INGRESS: &str = "ingress";

/// Provenience value marking platform-managed workloads
pub const PROVENIENCE_DOCKYARDS: &str = "Dockyards";

// ============================================================================
// Controller Constants
// ============================================================================

/// Field manager name used when writing declarations
pub const FIELD_MANAGER: &str = "clusterdns-controller";

/// Requeue duration for controller errors (30 seconds)
pub const ERROR_REQUEUE_DURATION_SECS: u64 = 30;

/// Requeue duration after a successful pass (5 minutes)
pub const RESYNC_REQUEUE_DURATION_SECS: u64 = 300;

// ============================================================================
// Runtime Constants
// ============================================================================

/// Number of worker threads for Tokio runtime
pub const TOKIO_WORKER_THREADS: usize = 4;

/// Default name of the platform configuration `ConfigMap`
pub const DEFAULT_CONFIG_MAP_NAME: &str = "dockyards-system";

/// Default namespace of the platform configuration `ConfigMap`
pub const DEFAULT_CONFIG_NAMESPACE: &str = "dockyards-system";

// ============================================================================
// Metrics Server Constants
// ============================================================================

/// Port for Prometheus metrics HTTP server
pub const METRICS_SERVER_PORT: u16 = 8080;

/// Path for Prometheus metrics endpoint
pub const METRICS_SERVER_PATH: &str = "/metrics";

/// Bind address for metrics HTTP server
pub const METRICS_SERVER_BIND_ADDRESS: &str = "0.0.0.0";
