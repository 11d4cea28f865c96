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

use clap::Parser;
use regex::Regex;

use crate::consts::{DEFAULT_GATEWAY_CLASSES, DEFAULT_HOSTNAME_PATTERN};
use crate::{Error, Result};

pub const SERVICE_PLACEHOLDER: &str = "{service}";
pub const NAMESPACE_PLACEHOLDER: &str = "{namespace}";

const DNS1123_LABEL: &str = r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$";
const DNS1123_SUBDOMAIN: &str =
    r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$";

/// Command-line options for the tinylb controller.
#[derive(Debug, Parser, Clone)]
#[clap(
    name = "controller",
    about = "Synthesizes external addresses for LoadBalancer Services and Gateways"
)]
pub struct Args {
    /// Gateway classes whose Gateways are reconciled.
    #[clap(
        long,
        env = "TINYLB_SUPPORTED_GATEWAY_CLASSES",
        value_delimiter = ',',
        default_value = DEFAULT_GATEWAY_CLASSES
    )]
    pub supported_gateway_classes: Vec<String>,

    /// Namespace holding Routes; defaults to the Service's namespace.
    #[clap(long, env = "TINYLB_ROUTE_NAMESPACE")]
    pub route_namespace: Option<String>,

    /// Pattern used to synthesize Route hostnames.
    #[clap(long, env = "TINYLB_HOSTNAME_PATTERN", default_value = DEFAULT_HOSTNAME_PATTERN)]
    pub hostname_pattern: String,

    /// Deadline for each call to the API server.
    #[clap(long, env = "TINYLB_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,
}

impl Args {
    pub fn into_config(self) -> Result<ControllerConfig> {
        let supported_gateway_classes: Vec<String> = self
            .supported_gateway_classes
            .into_iter()
            .map(|class| class.trim().to_string())
            .filter(|class| !class.is_empty())
            .collect();
        if supported_gateway_classes.is_empty() {
            return Err(Error::InvalidConfigError(
                "at least one supported gateway class is required".to_string(),
            ));
        }

        let route_namespace = self
            .route_namespace
            .map(|ns| ns.trim().to_string())
            .filter(|ns| !ns.is_empty());
        if let Some(ns) = &route_namespace {
            if !matches_pattern(DNS1123_LABEL, ns)? {
                return Err(Error::InvalidConfigError(format!(
                    "route namespace {ns} is not a valid namespace name"
                )));
            }
        }

        if self.request_timeout_secs == 0 {
            return Err(Error::InvalidConfigError(
                "request timeout must be at least one second".to_string(),
            ));
        }

        Ok(ControllerConfig {
            supported_gateway_classes,
            route_namespace,
            hostname_pattern: HostnamePattern::new(self.hostname_pattern)?,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        })
    }
}

/// Process-wide settings, fixed at startup and shared read-only by the
/// reconcilers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ControllerConfig {
    pub supported_gateway_classes: Vec<String>,
    pub route_namespace: Option<String>,
    pub hostname_pattern: HostnamePattern,
    pub request_timeout: Duration,
}

impl ControllerConfig {
    pub fn supports_gateway_class(&self, class_name: &str) -> bool {
        self.supported_gateway_classes
            .iter()
            .any(|class| class == class_name)
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            supported_gateway_classes: vec![DEFAULT_GATEWAY_CLASSES.to_string()],
            route_namespace: None,
            hostname_pattern: HostnamePattern(DEFAULT_HOSTNAME_PATTERN.to_string()),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// A hostname template with `{service}` and `{namespace}` placeholders.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostnamePattern(String);

impl HostnamePattern {
    pub fn new(pattern: impl Into<String>) -> Result<Self> {
        let pattern = pattern.into();
        if !pattern.contains(SERVICE_PLACEHOLDER) {
            return Err(Error::InvalidConfigError(format!(
                "hostname pattern {pattern} must contain {SERVICE_PLACEHOLDER}"
            )));
        }
        let sample = Self(pattern.clone()).render("service", "namespace");
        if !matches_pattern(DNS1123_SUBDOMAIN, &sample)? {
            return Err(Error::InvalidConfigError(format!(
                "hostname pattern {pattern} does not produce a valid hostname"
            )));
        }
        Ok(Self(pattern))
    }

    pub fn render(&self, service: &str, namespace: &str) -> String {
        self.0
            .replace(SERVICE_PLACEHOLDER, service)
            .replace(NAMESPACE_PLACEHOLDER, namespace)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn matches_pattern(pattern: &str, value: &str) -> Result<bool> {
    let re = Regex::new(pattern).map_err(|e| Error::InvalidConfigError(e.to_string()))?;
    Ok(re.is_match(value))
}
