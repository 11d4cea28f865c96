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

use std::time::Duration;

use chrono::Utc;
use gateway_api::apis::standard::{
    constants::{GatewayConditionReason, GatewayConditionType},
    gateways::{Gateway, GatewayStatus, GatewayStatusAddresses},
};
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::apimachinery::pkg::apis::meta::v1 as metav1;
use kube::runtime::controller::Action;

use crate::conditions::{STATUS_FALSE, STATUS_TRUE};
use crate::consts::{DEPENDENCY_RECHECK_DELAY, HOSTNAME_ADDRESS_TYPE};
use crate::route::Route;
use crate::service_utils::get_ingress;
use crate::{NamespacedName, Result};

/// How far the chain behind a Gateway has progressed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Readiness {
    /// The expected LoadBalancer Service does not exist.
    ServiceNotFound(NamespacedName),
    /// A Service with the expected name exists but is not of type LoadBalancer.
    ServiceNotLoadBalancer(NamespacedName),
    /// The Service has no ingress yet.
    ServicePending(NamespacedName),
    /// The Service has ingress but its Route does not exist.
    RouteNotFound(NamespacedName),
    /// Service and Route are in place.
    Programmed { hostname: Option<String> },
}

impl Readiness {
    // Returns the condition of type "Programmed" describing this state.
    pub fn programmed_condition(&self, generation: Option<i64>) -> metav1::Condition {
        let (status, reason, message) = match self {
            Readiness::ServiceNotFound(svc) => (
                STATUS_FALSE,
                GatewayConditionReason::NoResources,
                format!("LoadBalancer service {svc} not found"),
            ),
            Readiness::ServiceNotLoadBalancer(svc) => (
                STATUS_FALSE,
                GatewayConditionReason::NoResources,
                format!("Service {svc} is not of type LoadBalancer"),
            ),
            Readiness::ServicePending(svc) => (
                STATUS_FALSE,
                GatewayConditionReason::Pending,
                format!("LoadBalancer service {svc} has no external address"),
            ),
            Readiness::RouteNotFound(route) => (
                STATUS_FALSE,
                GatewayConditionReason::NoResources,
                format!("Route {route} not found"),
            ),
            Readiness::Programmed { .. } => (
                STATUS_TRUE,
                GatewayConditionReason::Programmed,
                "Gateway is programmed".to_string(),
            ),
        };
        metav1::Condition {
            type_: GatewayConditionType::Programmed.to_string(),
            status: status.to_string(),
            reason: reason.to_string(),
            message,
            observed_generation: generation,
            last_transition_time: metav1::Time(Utc::now()),
        }
    }

    // The address to publish on the Gateway, if any.
    pub fn hostname(&self) -> Option<&str> {
        match self {
            Readiness::Programmed { hostname } => hostname.as_deref(),
            _ => None,
        }
    }

    // When to look at the Gateway again. A Service of the wrong type only
    // changes through an edit, which produces an event of its own.
    pub fn requeue(&self) -> Option<Duration> {
        match self {
            Readiness::ServiceNotFound(_)
            | Readiness::ServicePending(_)
            | Readiness::RouteNotFound(_) => Some(DEPENDENCY_RECHECK_DELAY),
            Readiness::ServiceNotLoadBalancer(_) | Readiness::Programmed { .. } => None,
        }
    }

    pub fn action(&self) -> Action {
        match self.requeue() {
            Some(delay) => Action::requeue(delay),
            None => Action::await_change(),
        }
    }
}

// Returns a condition of type "Accepted". Gateways of a supported class are
// always accepted; listeners are not validated.
pub fn get_accepted_condition(generation: Option<i64>) -> metav1::Condition {
    metav1::Condition {
        type_: GatewayConditionType::Accepted.to_string(),
        status: STATUS_TRUE.to_string(),
        reason: GatewayConditionReason::Accepted.to_string(),
        message: "Gateway is accepted".to_string(),
        observed_generation: generation,
        last_transition_time: metav1::Time(Utc::now()),
    }
}

// Picks the address to publish for a Gateway whose Service and Route exist.
// The Route's host wins since it is what is reachable from outside; otherwise
// the first ingress entry's hostname, then its IP.
pub fn resolve_hostname(service: &Service, route: &Route) -> Option<String> {
    if let Some(host) = route.host() {
        return Some(host.to_string());
    }
    let ingress = get_ingress(service).first()?;
    ingress
        .hostname
        .as_deref()
        .filter(|hostname| !hostname.is_empty())
        .or_else(|| ingress.ip.as_deref().filter(|ip| !ip.is_empty()))
        .map(str::to_string)
}

// Modifies the Gateway's status to carry the provided hostname as its only
// address, or no address at all.
pub fn set_gateway_status_addresses(gateway: &mut Gateway, hostname: Option<&str>) {
    let addresses = hostname
        .map(|value| {
            vec![GatewayStatusAddresses {
                r#type: Some(HOSTNAME_ADDRESS_TYPE.to_string()),
                value: value.to_string(),
            }]
        })
        .unwrap_or_default();
    gateway
        .status
        .get_or_insert_with(GatewayStatus::default)
        .addresses = Some(addresses);
}

// Returns true if the two statuses would serialize differently.
pub fn status_changed(current: &Gateway, desired: &Gateway) -> Result<bool> {
    Ok(serde_json::to_value(&current.status)? != serde_json::to_value(&desired.status)?)
}
