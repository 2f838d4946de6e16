// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Generic create-or-update helper for declarations owned by the reconcilers.
//!
//! Every child object (zones, record sets, workloads) is converged the same way:
//!
//! 1. **Get** the current object, or start from an empty one carrying only its name
//! 2. **Mutate** it with a caller-supplied closure that writes the desired state
//! 3. **Compare** the serialized object before and after the mutation
//! 4. **Write** only when something changed: create if absent, replace if different
//!
//! Replacing sends the `resourceVersion` that was read in step 1, so a concurrent
//! writer turns the replace into an error instead of a lost update.
//!
//! # Example
//!
//! ```rust,no_run
//! use clusterdns::crd::Zone;
//! use clusterdns::errors::Result;
//! use clusterdns::reconcilers::resources::create_or_update;
//! use clusterdns::store::KubeStore;
//!
//! async fn example(store: &KubeStore) -> Result<()> {
//!     let (_zone, result) = create_or_update(store, "tenant-a", "abc123.example.com", |zone: &mut Zone| {
//!         zone.spec.kind = "Native".to_string();
//!         Ok(())
//!     })
//!     .await?;
//!
//!     println!("zone {result}");
//!     Ok(())
//! }
//! ```

use crate::errors::{Error, Result};
use crate::labels::ANNOTATION_SKIP_REMEDIATION;
use crate::metrics;
use crate::store::{ResourceStore, StoreResource};
use kube::core::NamespaceResourceScope;
use kube::{Resource, ResourceExt};
use std::fmt;
use tracing::debug;

/// What [`create_or_update`] did to the object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperationResult {
    /// The object did not exist and was created
    Created,
    /// The object existed and differed from the desired state
    Updated,
    /// The object already matched the desired state; nothing was written
    Unchanged,
}

impl fmt::Display for OperationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Unchanged => "unchanged",
        };
        f.write_str(s)
    }
}

/// Whether an operator froze `object` with the skip-remediation annotation.
///
/// Mutations passed to [`create_or_update`] return early for frozen objects,
/// leaving them exactly as stored.
#[must_use]
pub fn skips_remediation<K: Resource>(object: &K) -> bool {
    object.annotations().contains_key(ANNOTATION_SKIP_REMEDIATION)
}

/// Converge the object `namespace/name` to the state written by `mutate`.
///
/// `mutate` receives the current object (or an empty one with only name and
/// namespace set) and edits it in place. It may leave the object untouched to
/// signal that nothing should change.
///
/// # Returns
///
/// The object as stored after the call, and what was done to it.
///
/// # Errors
///
/// Returns an error if:
/// - Reading or writing the object fails (including resource version conflicts)
/// - `mutate` fails, in which case nothing is written
/// - `mutate` changes the object's name or namespace
pub async fn create_or_update<K, S, F>(
    store: &S,
    namespace: &str,
    name: &str,
    mutate: F,
) -> Result<(K, OperationResult)>
where
    K: StoreResource + Resource<Scope = NamespaceResourceScope> + Default,
    S: ResourceStore,
    F: FnOnce(&mut K) -> Result<()> + Send,
{
    let kind = K::kind(&()).to_string();
    let existing = store.get::<K>(namespace, name).await?;
    let exists = existing.is_some();

    let mut object = existing.unwrap_or_else(|| {
        let mut object = K::default();
        object.meta_mut().name = Some(name.to_string());
        object.meta_mut().namespace = Some(namespace.to_string());
        object
    });

    let before = serde_json::to_value(&object)?;
    mutate(&mut object)?;

    let meta = object.meta();
    if meta.name.as_deref() != Some(name) || meta.namespace.as_deref() != Some(namespace) {
        return Err(Error::Store(format!(
            "mutation of {kind} {namespace}/{name} changed its identity"
        )));
    }

    if !exists {
        debug!("{} {}/{} does not exist, creating", kind, namespace, name);
        let created = store.create(&object).await?;
        metrics::record_resource_created(&kind);
        return Ok((created, OperationResult::Created));
    }

    if serde_json::to_value(&object)? == before {
        debug!("{} {}/{} already up to date", kind, namespace, name);
        return Ok((object, OperationResult::Unchanged));
    }

    debug!("{} {}/{} differs from desired state, replacing", kind, namespace, name);
    let updated = store.replace(&object).await?;
    metrics::record_resource_updated(&kind);
    Ok((updated, OperationResult::Updated))
}

#[cfg(test)]
#[path = "resources_tests.rs"]
mod resources_tests;
