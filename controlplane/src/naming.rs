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

//! Derives the keys that link a Gateway to its LoadBalancer Service and a
//! Service to its Route. The three resources carry no references to each
//! other; these names are the only linkage.

use gateway_api::apis::standard::gateways::Gateway;

use crate::config::{ControllerConfig, HostnamePattern};
use crate::consts::ROUTE_NAME_PREFIX;
use crate::{NamespacedName, Result};

pub trait NamingStrategy: Send + Sync {
    /// Key of the LoadBalancer Service expected to back the Gateway.
    fn service_for_gateway(&self, gateway: &Gateway) -> Result<NamespacedName>;

    /// Key of the Route created for the Service.
    fn route_for_service(&self, service: &NamespacedName) -> NamespacedName;

    /// Hostname the Route for the Service is published under.
    fn route_hostname(&self, service: &NamespacedName) -> String;
}

/// `{gateway}-{gatewayClassName}` for Services, `tinylb-{service}` for Routes
/// (`tinylb-{service}.{namespace}` in an override namespace) and the
/// configured hostname pattern for Route hosts.
#[derive(Clone, Debug)]
pub struct ConventionNaming {
    route_namespace: Option<String>,
    hostname_pattern: HostnamePattern,
}

impl ConventionNaming {
    pub fn new(route_namespace: Option<String>, hostname_pattern: HostnamePattern) -> Self {
        Self {
            route_namespace,
            hostname_pattern,
        }
    }

    pub fn from_config(config: &ControllerConfig) -> Self {
        Self::new(
            config.route_namespace.clone(),
            config.hostname_pattern.clone(),
        )
    }
}

impl NamingStrategy for ConventionNaming {
    fn service_for_gateway(&self, gateway: &Gateway) -> Result<NamespacedName> {
        let gateway_key = NamespacedName::from_meta(&gateway.metadata)?;
        Ok(NamespacedName::new(
            gateway_key.namespace,
            format!("{}-{}", gateway_key.name, gateway.spec.gateway_class_name),
        ))
    }

    // Routes gathered into one namespace keep the Service's namespace in their
    // name so that equally named Services never share a Route. Namespaces and
    // Service names are DNS labels, so the dot cannot be ambiguous.
    fn route_for_service(&self, service: &NamespacedName) -> NamespacedName {
        match &self.route_namespace {
            Some(namespace) => NamespacedName::new(
                namespace.clone(),
                format!("{ROUTE_NAME_PREFIX}{}.{}", service.name, service.namespace),
            ),
            None => NamespacedName::new(
                service.namespace.clone(),
                format!("{ROUTE_NAME_PREFIX}{}", service.name),
            ),
        }
    }

    fn route_hostname(&self, service: &NamespacedName) -> String {
        self.hostname_pattern
            .render(&service.name, &service.namespace)
    }
}
