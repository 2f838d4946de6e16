// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory [`ResourceStore`] for tests.
//!
//! Objects are kept as JSON keyed by kind, namespace and name. The store
//! mimics the API server closely enough to exercise the reconcilers:
//!
//! - `create` assigns a UID and a resource version and refuses duplicates
//! - `replace` refuses stale resource versions, like an optimistic-concurrency conflict
//! - every successful write is counted so tests can assert idempotence
//! - reads of a kind can be made to fail to exercise error propagation

use super::{object_key, ResourceStore, StoreResource};
use crate::errors::{Error, Result};
use async_trait::async_trait;
use kube::core::NamespaceResourceScope;
use kube::Resource;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type ObjectKey = (String, String, String);

#[derive(Default)]
struct State {
    objects: BTreeMap<ObjectKey, serde_json::Value>,
    failing_kinds: BTreeSet<String>,
    writes: usize,
    next_uid: u64,
    next_version: u64,
}

impl State {
    fn next_uid(&mut self) -> String {
        self.next_uid += 1;
        format!("00000000-0000-0000-0000-{:012}", self.next_uid)
    }

    fn next_version(&mut self) -> String {
        self.next_version += 1;
        self.next_version.to_string()
    }
}

/// Thread-safe in-memory object store.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn key<K: StoreResource>(namespace: &str, name: &str) -> ObjectKey {
        (
            format!("{}/{}", K::api_version(&()), K::kind(&())),
            namespace.to_string(),
            name.to_string(),
        )
    }

    fn read<K: StoreResource>(&self, namespace: &str, name: &str) -> Result<Option<K>> {
        let state = self.lock();
        if state.failing_kinds.contains(K::kind(&()).as_ref()) {
            return Err(Error::Store(format!(
                "{} {}/{} unavailable",
                K::kind(&()),
                namespace,
                name
            )));
        }

        state
            .objects
            .get(&Self::key::<K>(namespace, name))
            .map(|value| serde_json::from_value(value.clone()).map_err(Error::from))
            .transpose()
    }

    /// Seeds an object without counting it as a write.
    ///
    /// A UID and resource version are assigned when the object has none. The
    /// stored version is returned. Cluster-scoped objects are keyed with an
    /// empty namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the object has no name or cannot be serialized.
    pub fn insert<K: StoreResource>(&self, object: &K) -> Result<K> {
        let mut object = object.clone();
        let name = object.meta().name.clone().ok_or_else(|| Error::MissingMetadata {
            kind: K::kind(&()).to_string(),
            field: "name",
        })?;
        let namespace = object.meta().namespace.clone().unwrap_or_default();

        let mut state = self.lock();
        if object.meta().uid.is_none() {
            object.meta_mut().uid = Some(state.next_uid());
        }
        object.meta_mut().resource_version = Some(state.next_version());

        let value = serde_json::to_value(&object)?;
        state
            .objects
            .insert(Self::key::<K>(&namespace, &name), value);
        Ok(object)
    }

    /// Reads an object back without going through the async trait.
    #[must_use]
    pub fn fetch<K: StoreResource>(&self, namespace: &str, name: &str) -> Option<K> {
        let state = self.lock();
        state
            .objects
            .get(&Self::key::<K>(namespace, name))
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Makes every read of kind `K` fail until [`InMemoryStore::restore`] is called.
    pub fn fail_reads<K: StoreResource>(&self) {
        self.lock().failing_kinds.insert(K::kind(&()).to_string());
    }

    /// Undoes [`InMemoryStore::fail_reads`] for kind `K`.
    pub fn restore<K: StoreResource>(&self) {
        self.lock().failing_kinds.remove(K::kind(&()).as_ref());
    }

    /// Number of successful `create` and `replace` calls so far.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.lock().writes
    }

    /// Number of stored objects of kind `K`.
    #[must_use]
    pub fn count<K: StoreResource>(&self) -> usize {
        let prefix = format!("{}/{}", K::api_version(&()), K::kind(&()));
        self.lock()
            .objects
            .keys()
            .filter(|(kind, _, _)| *kind == prefix)
            .count()
    }
}

#[async_trait]
impl ResourceStore for InMemoryStore {
    async fn get<K>(&self, namespace: &str, name: &str) -> Result<Option<K>>
    where
        K: StoreResource + Resource<Scope = NamespaceResourceScope>,
    {
        self.read(namespace, name)
    }

    async fn get_cluster_scoped<K>(&self, name: &str) -> Result<Option<K>>
    where
        K: StoreResource,
    {
        self.read("", name)
    }

    async fn create<K>(&self, object: &K) -> Result<K>
    where
        K: StoreResource + Resource<Scope = NamespaceResourceScope>,
    {
        let (namespace, name) = object_key(object)?;
        let key = Self::key::<K>(&namespace, &name);

        let mut state = self.lock();
        if state.objects.contains_key(&key) {
            return Err(Error::Store(format!(
                "{} {}/{} already exists",
                K::kind(&()),
                namespace,
                name
            )));
        }

        let mut stored = object.clone();
        stored.meta_mut().uid = Some(state.next_uid());
        stored.meta_mut().resource_version = Some(state.next_version());

        state.objects.insert(key, serde_json::to_value(&stored)?);
        state.writes += 1;
        Ok(stored)
    }

    async fn replace<K>(&self, object: &K) -> Result<K>
    where
        K: StoreResource + Resource<Scope = NamespaceResourceScope>,
    {
        let (namespace, name) = object_key(object)?;
        let key = Self::key::<K>(&namespace, &name);

        let mut state = self.lock();
        let current: K = match state.objects.get(&key) {
            Some(value) => serde_json::from_value(value.clone())?,
            None => {
                return Err(Error::Store(format!(
                    "{} {}/{} not found",
                    K::kind(&()),
                    namespace,
                    name
                )))
            }
        };

        if current.meta().resource_version != object.meta().resource_version {
            return Err(Error::Store(format!(
                "conflict replacing {} {}/{}: resource version {:?} is stale",
                K::kind(&()),
                namespace,
                name,
                object.meta().resource_version
            )));
        }

        let mut stored = object.clone();
        stored.meta_mut().uid.clone_from(&current.meta().uid);
        stored.meta_mut().resource_version = Some(state.next_version());

        state.objects.insert(key, serde_json::to_value(&stored)?);
        state.writes += 1;
        Ok(stored)
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod memory_tests;
