// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Owner references between parents and the declarations derived from them.
//!
//! Children written by the reconcilers carry exactly one owner reference, so
//! deleting a cluster cascades to its zone and workload, and deleting a zone
//! cascades to its record sets. [`OwnerRef`] is built from the typed parent,
//! which fixes the `apiVersion` and `kind` at compile time and refuses
//! parents that have not been persisted yet (no UID).

use crate::constants::{DOCKYARDS_API_GROUP, KIND_ORGANIZATION};
use crate::crd::{Cluster, Organization};
use crate::errors::{Error, Result};
use crate::store::ResourceStore;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::{Resource, ResourceExt};
use tracing::debug;

/// Identity of a parent object: apiVersion, kind, name and UID.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnerRef {
    api_version: String,
    kind: String,
    name: String,
    uid: String,
}

impl OwnerRef {
    /// Builds the reference for a persisted parent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingMetadata`] if the parent has no name or no UID.
    pub fn for_resource<K>(parent: &K) -> Result<Self>
    where
        K: Resource<DynamicType = ()>,
    {
        let kind = K::kind(&()).to_string();
        let name = parent.meta().name.clone().ok_or_else(|| Error::MissingMetadata {
            kind: kind.clone(),
            field: "name",
        })?;
        let uid = parent.meta().uid.clone().ok_or_else(|| Error::MissingMetadata {
            kind: kind.clone(),
            field: "uid",
        })?;

        Ok(Self {
            api_version: K::api_version(&()).to_string(),
            kind,
            name,
            uid,
        })
    }

    /// Name of the parent.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// UID of the parent.
    #[must_use]
    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// Owner reference to store on a child.
    #[must_use]
    pub fn to_owner_reference(&self) -> OwnerReference {
        OwnerReference {
            api_version: self.api_version.clone(),
            kind: self.kind.clone(),
            name: self.name.clone(),
            uid: self.uid.clone(),
            controller: None,
            block_owner_deletion: None,
        }
    }

    /// Replaces the owner references of `child` with this single reference.
    pub fn set_sole_owner<K: Resource>(&self, child: &mut K) {
        let foreign = child
            .meta()
            .owner_references
            .iter()
            .flatten()
            .filter(|reference| !self.matches(reference))
            .count();
        if foreign > 0 {
            debug!(
                owner = %self.name,
                replaced = foreign,
                "Replacing owner references that do not point at {} {}",
                self.kind,
                self.name
            );
        }

        child.meta_mut().owner_references = Some(vec![self.to_owner_reference()]);
    }

    /// Whether `reference` points at this parent.
    #[must_use]
    pub fn matches(&self, reference: &OwnerReference) -> bool {
        reference.api_version == self.api_version
            && reference.kind == self.kind
            && reference.name == self.name
            && reference.uid == self.uid
    }
}

fn api_group(api_version: &str) -> &str {
    match api_version.split_once('/') {
        Some((group, _)) => group,
        None => "",
    }
}

/// Resolves the organization owning `cluster`.
///
/// Returns `None` when the cluster has no organization owner reference yet, or
/// when the referenced organization does not exist (anymore).
///
/// # Errors
///
/// Returns an error if reading the organization fails for any other reason.
pub async fn resolve_owner_organization<S: ResourceStore>(
    store: &S,
    cluster: &Cluster,
) -> Result<Option<Organization>> {
    let Some(reference) = cluster.owner_references().iter().find(|reference| {
        reference.kind == KIND_ORGANIZATION && api_group(&reference.api_version) == DOCKYARDS_API_GROUP
    }) else {
        debug!(cluster = %cluster.name_any(), "Cluster has no organization owner reference");
        return Ok(None);
    };

    store.get_cluster_scoped::<Organization>(&reference.name).await
}

#[cfg(test)]
#[path = "owner_tests.rs"]
mod owner_tests;
