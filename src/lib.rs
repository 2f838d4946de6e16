// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # clusterdns - PowerDNS zones for dockyards clusters
//!
//! clusterdns is a Kubernetes operator that gives every tenant cluster of the
//! dockyards platform its own DNS zone, served by PowerDNS and kept populated
//! by an external-dns workload running inside the cluster.
//!
//! ## Overview
//!
//! Two control loops compose into a pipeline:
//!
//! 1. **Cluster → Zone** - each owned `Cluster` gets a `Zone` named
//!    `<cluster UID>.<managementDomain>`
//! 2. **Zone → DNS** - once PowerDNS provisioned the zone, its SOA and `ns1`
//!    record sets and the cluster's external-dns `Workload` are converged
//!
//! ## Modules
//!
//! - [`crd`] - Typed mirrors of the platform and PowerDNS resources
//! - [`reconcilers`] - The two reconcilers and their building blocks
//! - [`store`] - Resource store abstraction (Kubernetes API or in-memory)
//! - [`config`] - Platform configuration accessor
//! - [`errors`] - Error type shared by the reconcilers
//! - [`metrics`] - Prometheus metrics
//!
//! ## Example
//!
//! ```rust
//! use clusterdns::reconcilers::zone_name;
//!
//! assert_eq!(zone_name("abc123", "example.com"), "abc123.example.com");
//! ```

pub mod config;
pub mod constants;
pub mod crd;
pub mod errors;
pub mod labels;
pub mod metrics;
pub mod reconcilers;
pub mod store;
