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

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{LoadBalancerIngress, LoadBalancerStatus, Service, ServiceStatus};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::{core::ObjectMeta, Resource, ResourceExt};

use crate::consts::*;
use crate::port_selector::select_port;
use crate::route::{Route, RoutePort, RouteSpec, RouteTargetReference, TlsConfig};
use crate::{Error, NamespacedName, Result};

pub fn is_load_balancer(service: &Service) -> bool {
    service
        .spec
        .as_ref()
        .and_then(|spec| spec.type_.as_deref())
        == Some(LOAD_BALANCER_SERVICE_TYPE)
}

// Returns the ingress entries set on the LoadBalancer Service.
pub fn get_ingress(service: &Service) -> &[LoadBalancerIngress] {
    service
        .status
        .as_ref()
        .and_then(|status| status.load_balancer.as_ref())
        .and_then(|lb| lb.ingress.as_deref())
        .unwrap_or_default()
}

// Builds the Route exposing the provided Service under `host`.
//
// The Route is owned by the Service when both live in the same namespace, so
// deleting the Service deletes the Route. Owner references cannot cross
// namespaces; a Route placed in the override namespace is tied to its Service
// by labels only.
pub fn build_route_for_service(
    service: &Service,
    route_key: &NamespacedName,
    host: &str,
) -> Result<Route> {
    let service_name = service.name_any();
    let service_uid = service.uid().ok_or(Error::InvalidConfigError(format!(
        "service {service_name} has no uid"
    )))?;

    let labels = BTreeMap::from([
        (MANAGED_LABEL.to_string(), "true".to_string()),
        (SERVICE_NAME_LABEL.to_string(), service_name.clone()),
        (SERVICE_UID_LABEL.to_string(), service_uid),
    ]);

    let owner_references = if service.namespace().as_deref() == Some(route_key.namespace.as_str())
    {
        let owner = service
            .controller_owner_ref(&())
            .ok_or(Error::InvalidConfigError(format!(
                "cannot reference service {service_name} as owner"
            )))?;
        Some(vec![owner])
    } else {
        None
    };

    let ports = service
        .spec
        .as_ref()
        .and_then(|spec| spec.ports.as_deref())
        .unwrap_or_default();
    let port = select_port(ports).map(|p| RoutePort {
        target_port: IntOrString::Int(p.port),
    });

    Ok(Route {
        metadata: ObjectMeta {
            name: Some(route_key.name.clone()),
            namespace: Some(route_key.namespace.clone()),
            labels: Some(labels),
            owner_references,
            ..Default::default()
        },
        spec: RouteSpec {
            host: Some(host.to_string()),
            to: RouteTargetReference {
                kind: "Service".to_string(),
                name: service_name,
                weight: None,
            },
            port,
            tls: Some(TlsConfig {
                termination: PASSTHROUGH_TERMINATION.to_string(),
                insecure_edge_termination_policy: None,
            }),
        },
    })
}

// Replaces the Service's load balancer ingress with a single hostname entry.
pub fn set_ingress_hostname(service: &mut Service, hostname: &str) {
    let status = service.status.get_or_insert_with(ServiceStatus::default);
    status.load_balancer = Some(LoadBalancerStatus {
        ingress: Some(vec![LoadBalancerIngress {
            hostname: Some(hostname.to_string()),
            ..Default::default()
        }]),
    });
}
