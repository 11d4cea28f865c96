/*
Copyright 2025 The Kubernetes Authors.

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

//! Access to the cluster objects the reconcilers read and write.

use std::{fmt::Debug, future::Future, time::Duration};

use async_trait::async_trait;
use gateway_api::apis::standard::gateways::Gateway;
use k8s_openapi::api::core::v1::Service;
use kube::{
    api::{Api, Patch, PatchParams, PostParams},
    core::NamespaceResourceScope,
    Client, Resource,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

use crate::{consts::TINYLB_FIELD_MANAGER, route::Route, Error, NamespacedName, Result};

/// Outcome of reading a single object. Errors other than "not found" are
/// reported through the surrounding `Result`.
#[derive(Clone, Debug, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

/// Outcome of creating an object.
#[derive(Clone, Debug, PartialEq)]
pub enum Created<T> {
    Created(T),
    AlreadyExists,
}

#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn get_gateway(&self, key: &NamespacedName) -> Result<Lookup<Gateway>>;

    async fn get_service(&self, key: &NamespacedName) -> Result<Lookup<Service>>;

    async fn get_route(&self, key: &NamespacedName) -> Result<Lookup<Route>>;

    async fn create_route(&self, route: &Route) -> Result<Created<Route>>;

    /// Writes `status.loadBalancer` of the Service. Fails with
    /// `Error::Conflict` if the Service changed since it was read.
    async fn update_service_status(&self, service: &Service) -> Result<Service>;

    /// Writes `status.conditions` and `status.addresses` of the Gateway. Fails
    /// with `Error::Conflict` if the Gateway changed since it was read.
    async fn update_gateway_status(&self, gateway: &Gateway) -> Result<Gateway>;
}

/// ResourceStore backed by the Kubernetes API server. Every call is bounded by
/// the request timeout.
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
    request_timeout: Duration,
}

impl KubeStore {
    pub fn new(client: Client, request_timeout: Duration) -> Self {
        Self {
            client,
            request_timeout,
        }
    }

    async fn with_deadline<T, F>(&self, what: &str, fut: F) -> Result<Result<T, kube::Error>>
    where
        F: Future<Output = Result<T, kube::Error>> + Send,
    {
        tokio::time::timeout(self.request_timeout, fut)
            .await
            .map_err(|_| Error::Timeout(what.to_string()))
    }

    async fn get<K>(&self, key: &NamespacedName) -> Result<Lookup<K>>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
            + Clone
            + DeserializeOwned
            + Debug,
    {
        let api: Api<K> = Api::namespaced(self.client.clone(), &key.namespace);
        let what = format!("get {} {key}", K::kind(&()));
        match self.with_deadline(&what, api.get(&key.name)).await? {
            Ok(obj) => Ok(Lookup::Found(obj)),
            Err(err) if check_if_not_found_err(&err) => Ok(Lookup::NotFound),
            Err(err) => Err(Error::KubeError(err)),
        }
    }

    // Server-side applies the given status fields. The resourceVersion the
    // caller read is sent along so the write is rejected if it is stale.
    async fn apply_status<K>(&self, obj: &K, status: Value) -> Result<K>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
            + Clone
            + DeserializeOwned
            + Debug,
    {
        let key = NamespacedName::from_meta(obj.meta())?;
        let api: Api<K> = Api::namespaced(self.client.clone(), &key.namespace);

        let mut metadata = serde_json::Map::new();
        if let Some(resource_version) = &obj.meta().resource_version {
            metadata.insert("resourceVersion".to_string(), json!(resource_version));
        }
        let patch = Patch::Apply(json!({
            "apiVersion": K::api_version(&()),
            "kind": K::kind(&()),
            "metadata": metadata,
            "status": status
        }));
        let params = PatchParams::apply(TINYLB_FIELD_MANAGER).force();

        let what = format!("update status of {} {key}", K::kind(&()));
        match self
            .with_deadline(&what, api.patch_status(&key.name, &params, &patch))
            .await?
        {
            Ok(updated) => Ok(updated),
            Err(err) if check_if_conflict_err(&err) => Err(Error::Conflict(key.to_string())),
            Err(err) => Err(Error::KubeError(err)),
        }
    }
}

#[async_trait]
impl ResourceStore for KubeStore {
    async fn get_gateway(&self, key: &NamespacedName) -> Result<Lookup<Gateway>> {
        self.get(key).await
    }

    async fn get_service(&self, key: &NamespacedName) -> Result<Lookup<Service>> {
        self.get(key).await
    }

    async fn get_route(&self, key: &NamespacedName) -> Result<Lookup<Route>> {
        self.get(key).await
    }

    async fn create_route(&self, route: &Route) -> Result<Created<Route>> {
        let key = NamespacedName::from_meta(&route.metadata)?;
        let api: Api<Route> = Api::namespaced(self.client.clone(), &key.namespace);
        let params = PostParams {
            field_manager: Some(TINYLB_FIELD_MANAGER.to_string()),
            ..Default::default()
        };
        let what = format!("create Route {key}");
        match self.with_deadline(&what, api.create(&params, route)).await? {
            Ok(created) => Ok(Created::Created(created)),
            // a 409 on create means the name is taken
            Err(err) if check_if_conflict_err(&err) => {
                debug!(route = %key, "route already exists");
                Ok(Created::AlreadyExists)
            }
            Err(err) => Err(Error::KubeError(err)),
        }
    }

    async fn update_service_status(&self, service: &Service) -> Result<Service> {
        let load_balancer = service
            .status
            .as_ref()
            .and_then(|status| status.load_balancer.clone())
            .unwrap_or_default();
        self.apply_status(service, json!({ "loadBalancer": load_balancer }))
            .await
    }

    async fn update_gateway_status(&self, gateway: &Gateway) -> Result<Gateway> {
        let status = gateway.status.clone().unwrap_or_default();
        let conditions = status.conditions.unwrap_or_default();
        let addresses = status.addresses.unwrap_or_default();
        self.apply_status(
            gateway,
            json!({
                "conditions": conditions,
                "addresses": addresses
            }),
        )
        .await
    }
}

// Returns true if the provided error is a not found error.
pub fn check_if_not_found_err(error: &kube::Error) -> bool {
    matches!(error, kube::Error::Api(response) if response.code == 404)
}

// Returns true if the provided error is a conflict (stale write or name
// already taken).
pub fn check_if_conflict_err(error: &kube::Error) -> bool {
    matches!(error, kube::Error::Api(response) if response.code == 409)
}
