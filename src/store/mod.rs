// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Typed access to the Kubernetes object store.
//!
//! The reconcilers only need four operations from the API server: get a
//! namespaced object, get a cluster-scoped object, create, and replace. They
//! are expressed by the [`ResourceStore`] trait so the reconcilers can run
//! against the real API server ([`KubeStore`]) or an in-memory fake
//! ([`memory::InMemoryStore`]) in tests.
//!
//! Writes are conditional: [`ResourceStore::replace`] sends the object's
//! `resourceVersion`, so a concurrent writer makes the call fail and the whole
//! pass is retried from scratch.

pub mod memory;

use crate::constants::FIELD_MANAGER;
use crate::errors::{Error, Result};
use async_trait::async_trait;
use kube::api::PostParams;
use kube::core::NamespaceResourceScope;
use kube::{Api, Client, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use tracing::debug;

/// Bounds every object handled by a [`ResourceStore`] must satisfy.
pub trait StoreResource:
    Resource<DynamicType = ()> + Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

impl<T> StoreResource for T where
    T: Resource<DynamicType = ()>
        + Clone
        + Debug
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static
{
}

/// Object store operations used by the reconcilers.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Fetches a namespaced object, returning `None` if it does not exist.
    async fn get<K>(&self, namespace: &str, name: &str) -> Result<Option<K>>
    where
        K: StoreResource + Resource<Scope = NamespaceResourceScope>;

    /// Fetches a cluster-scoped object, returning `None` if it does not exist.
    async fn get_cluster_scoped<K>(&self, name: &str) -> Result<Option<K>>
    where
        K: StoreResource;

    /// Creates a namespaced object and returns the stored version.
    async fn create<K>(&self, object: &K) -> Result<K>
    where
        K: StoreResource + Resource<Scope = NamespaceResourceScope>;

    /// Replaces a namespaced object, conditional on its `resourceVersion`.
    async fn replace<K>(&self, object: &K) -> Result<K>
    where
        K: StoreResource + Resource<Scope = NamespaceResourceScope>;
}

/// Returns the `(namespace, name)` of an object about to be written.
pub(crate) fn object_key<K>(object: &K) -> Result<(String, String)>
where
    K: StoreResource,
{
    let name = object.meta().name.clone().ok_or_else(|| Error::MissingMetadata {
        kind: K::kind(&()).to_string(),
        field: "name",
    })?;
    let namespace = object.namespace().ok_or_else(|| Error::MissingMetadata {
        kind: K::kind(&()).to_string(),
        field: "namespace",
    })?;
    Ok((namespace, name))
}

/// [`ResourceStore`] backed by the Kubernetes API server.
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    /// Wraps a Kubernetes client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn post_params() -> PostParams {
        PostParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..Default::default()
        }
    }
}

#[async_trait]
impl ResourceStore for KubeStore {
    async fn get<K>(&self, namespace: &str, name: &str) -> Result<Option<K>>
    where
        K: StoreResource + Resource<Scope = NamespaceResourceScope>,
    {
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get_opt(name).await?)
    }

    async fn get_cluster_scoped<K>(&self, name: &str) -> Result<Option<K>>
    where
        K: StoreResource,
    {
        let api: Api<K> = Api::all(self.client.clone());
        Ok(api.get_opt(name).await?)
    }

    async fn create<K>(&self, object: &K) -> Result<K>
    where
        K: StoreResource + Resource<Scope = NamespaceResourceScope>,
    {
        let (namespace, name) = object_key(object)?;
        debug!("Creating {} {}/{}", K::kind(&()), namespace, name);

        let api: Api<K> = Api::namespaced(self.client.clone(), &namespace);
        Ok(api.create(&Self::post_params(), object).await?)
    }

    async fn replace<K>(&self, object: &K) -> Result<K>
    where
        K: StoreResource + Resource<Scope = NamespaceResourceScope>,
    {
        let (namespace, name) = object_key(object)?;
        debug!(
            resource_version = ?object.resource_version(),
            "Replacing {} {}/{}",
            K::kind(&()),
            namespace,
            name
        );

        let api: Api<K> = Api::namespaced(self.client.clone(), &namespace);
        Ok(api.replace(&name, &Self::post_params(), object).await?)
    }
}
