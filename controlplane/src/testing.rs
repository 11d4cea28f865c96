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

//! In-memory ResourceStore and object builders for reconciler tests.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use gateway_api::apis::standard::gateways::Gateway;
use k8s_openapi::api::core::v1::{
    LoadBalancerIngress, LoadBalancerStatus, Service, ServicePort, ServiceSpec, ServiceStatus,
};
use kube::{core::ObjectMeta, Resource};
use serde_json::json;

use crate::{
    config::ControllerConfig,
    naming::ConventionNaming,
    route::{Route, RouteSpec, RouteTargetReference},
    store::{Created, Lookup, ResourceStore},
    Context, Error, NamespacedName, Result,
};

#[derive(Default)]
struct State {
    gateways: BTreeMap<NamespacedName, Gateway>,
    services: BTreeMap<NamespacedName, Service>,
    routes: BTreeMap<NamespacedName, Route>,
    next_version: u64,
    failing_status_writes: usize,
    failing_route_lookups: bool,
    status_writes: usize,
    route_creates: usize,
}

impl State {
    fn bump(&mut self, meta: &mut ObjectMeta) {
        self.next_version += 1;
        meta.resource_version = Some(self.next_version.to_string());
    }
}

fn check_version(stored: &ObjectMeta, incoming: &ObjectMeta, key: &NamespacedName) -> Result<()> {
    match &incoming.resource_version {
        Some(version) if Some(version) != stored.resource_version.as_ref() => {
            Err(Error::Conflict(key.to_string()))
        }
        _ => Ok(()),
    }
}

/// Behaves like the API server as far as the reconcilers can tell: objects
/// carry resource versions, stale status writes conflict and deleting a
/// Service garbage collects the Routes it owns.
#[derive(Default)]
pub struct FakeStore {
    state: Mutex<State>,
}

impl FakeStore {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn insert_gateway(&self, mut gateway: Gateway) {
        let mut state = self.lock();
        state.bump(&mut gateway.metadata);
        let key = NamespacedName::from_meta(&gateway.metadata).unwrap();
        state.gateways.insert(key, gateway);
    }

    pub fn insert_service(&self, mut service: Service) {
        let mut state = self.lock();
        state.bump(&mut service.metadata);
        let key = NamespacedName::from_meta(&service.metadata).unwrap();
        state.services.insert(key, service);
    }

    pub fn insert_route(&self, mut route: Route) {
        let mut state = self.lock();
        state.bump(&mut route.metadata);
        let key = NamespacedName::from_meta(&route.metadata).unwrap();
        state.routes.insert(key, route);
    }

    pub fn gateway(&self, key: &NamespacedName) -> Option<Gateway> {
        self.lock().gateways.get(key).cloned()
    }

    pub fn service(&self, key: &NamespacedName) -> Option<Service> {
        self.lock().services.get(key).cloned()
    }

    pub fn route(&self, key: &NamespacedName) -> Option<Route> {
        self.lock().routes.get(key).cloned()
    }

    pub fn route_count(&self) -> usize {
        self.lock().routes.len()
    }

    // Deletes the Service and, like the garbage collector, every Route whose
    // owner references point at it.
    pub fn delete_service(&self, key: &NamespacedName) {
        let mut state = self.lock();
        let Some(service) = state.services.remove(key) else {
            return;
        };
        let uid = service.metadata.uid.clone();
        state.routes.retain(|_, route| {
            !route
                .metadata
                .owner_references
                .iter()
                .flatten()
                .any(|owner| Some(&owner.uid) == uid.as_ref())
        });
    }

    pub fn fail_status_writes(&self, count: usize) {
        self.lock().failing_status_writes = count;
    }

    pub fn fail_route_lookups(&self, fail: bool) {
        self.lock().failing_route_lookups = fail;
    }

    pub fn status_writes(&self) -> usize {
        self.lock().status_writes
    }

    pub fn route_creates(&self) -> usize {
        self.lock().route_creates
    }

    fn injected_status_failure(state: &mut State, key: &NamespacedName) -> Result<()> {
        if state.failing_status_writes > 0 {
            state.failing_status_writes -= 1;
            return Err(Error::Timeout(format!("update status of {key}")));
        }
        Ok(())
    }
}

#[async_trait]
impl ResourceStore for FakeStore {
    async fn get_gateway(&self, key: &NamespacedName) -> Result<Lookup<Gateway>> {
        Ok(self.gateway(key).map_or(Lookup::NotFound, Lookup::Found))
    }

    async fn get_service(&self, key: &NamespacedName) -> Result<Lookup<Service>> {
        Ok(self.service(key).map_or(Lookup::NotFound, Lookup::Found))
    }

    async fn get_route(&self, key: &NamespacedName) -> Result<Lookup<Route>> {
        if self.lock().failing_route_lookups {
            return Err(Error::Timeout(format!("get Route {key}")));
        }
        Ok(self.route(key).map_or(Lookup::NotFound, Lookup::Found))
    }

    async fn create_route(&self, route: &Route) -> Result<Created<Route>> {
        let key = NamespacedName::from_meta(&route.metadata)?;
        let mut state = self.lock();
        if state.routes.contains_key(&key) {
            return Ok(Created::AlreadyExists);
        }
        let mut created = route.clone();
        state.bump(&mut created.metadata);
        created.metadata.uid = Some(format!("uid-route-{}", key.name));
        state.route_creates += 1;
        state.routes.insert(key, created.clone());
        Ok(Created::Created(created))
    }

    async fn update_service_status(&self, service: &Service) -> Result<Service> {
        let key = NamespacedName::from_meta(&service.metadata)?;
        let mut state = self.lock();
        Self::injected_status_failure(&mut state, &key)?;
        let mut stored = state
            .services
            .get(&key)
            .cloned()
            .ok_or_else(|| Error::InvalidConfigError(format!("service {key} not found")))?;
        check_version(&stored.metadata, &service.metadata, &key)?;
        stored.status = service.status.clone();
        state.bump(&mut stored.metadata);
        state.status_writes += 1;
        state.services.insert(key, stored.clone());
        Ok(stored)
    }

    async fn update_gateway_status(&self, gateway: &Gateway) -> Result<Gateway> {
        let key = NamespacedName::from_meta(&gateway.metadata)?;
        let mut state = self.lock();
        Self::injected_status_failure(&mut state, &key)?;
        let mut stored = state
            .gateways
            .get(&key)
            .cloned()
            .ok_or_else(|| Error::InvalidConfigError(format!("gateway {key} not found")))?;
        check_version(&stored.metadata, &gateway.metadata, &key)?;
        stored.status = gateway.status.clone();
        state.bump(&mut stored.metadata);
        state.status_writes += 1;
        state.gateways.insert(key, stored.clone());
        Ok(stored)
    }
}

pub fn context(store: Arc<FakeStore>, config: ControllerConfig) -> Context {
    let naming = ConventionNaming::from_config(&config);
    Context {
        store,
        config: Arc::new(config),
        naming: Arc::new(naming),
    }
}

pub fn meta(namespace: &str, name: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(namespace.to_string()),
        uid: Some(format!("uid-{namespace}-{name}")),
        generation: Some(1),
        ..Default::default()
    }
}

pub fn gateway(namespace: &str, name: &str, class: &str) -> Gateway {
    let mut gateway: Gateway = serde_json::from_value(json!({
        "metadata": {},
        "spec": {"gatewayClassName": class, "listeners": []}
    }))
    .unwrap();
    gateway.metadata = meta(namespace, name);
    gateway
}

pub fn port(name: &str, number: i32) -> ServicePort {
    ServicePort {
        name: Some(name.to_string()),
        port: number,
        ..Default::default()
    }
}

pub fn service(namespace: &str, name: &str, type_: &str, ports: Vec<ServicePort>) -> Service {
    Service {
        metadata: meta(namespace, name),
        spec: Some(ServiceSpec {
            type_: Some(type_.to_string()),
            ports: Some(ports),
            ..Default::default()
        }),
        status: Some(ServiceStatus::default()),
    }
}

pub fn with_ingress(mut service: Service, ingress: LoadBalancerIngress) -> Service {
    service.status = Some(ServiceStatus {
        load_balancer: Some(LoadBalancerStatus {
            ingress: Some(vec![ingress]),
        }),
        ..Default::default()
    });
    service
}

pub fn hostname_ingress(hostname: &str) -> LoadBalancerIngress {
    LoadBalancerIngress {
        hostname: Some(hostname.to_string()),
        ..Default::default()
    }
}

pub fn ip_ingress(ip: &str) -> LoadBalancerIngress {
    LoadBalancerIngress {
        ip: Some(ip.to_string()),
        ..Default::default()
    }
}

pub fn route(namespace: &str, name: &str, host: Option<&str>, owner: &Service) -> Route {
    let mut route = Route::new(
        name,
        RouteSpec {
            host: host.map(str::to_string),
            to: RouteTargetReference {
                kind: "Service".to_string(),
                name: owner.metadata.name.clone().unwrap_or_default(),
                weight: None,
            },
            port: None,
            tls: None,
        },
    );
    route.metadata.namespace = Some(namespace.to_string());
    route.metadata.owner_references = owner.controller_owner_ref(&()).map(|o| vec![o]);
    route
}
