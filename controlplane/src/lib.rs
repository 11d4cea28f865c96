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

use std::{fmt, sync::Arc, time::Duration};

use thiserror::Error;

pub use gateway_controller::controller as gateway_controller;
pub use service_controller::controller as service_controller;

pub mod conditions;
pub mod config;
pub mod consts;
pub mod gateway_controller;
pub mod gateway_utils;
pub mod naming;
pub mod port_selector;
pub mod route;
pub mod service_controller;
pub mod service_utils;
pub mod store;
pub mod traits;

#[cfg(test)]
mod testing;

use config::ControllerConfig;
use naming::NamingStrategy;
use store::ResourceStore;

// Context for our reconcilers
#[derive(Clone)]
pub struct Context {
    /// Reads and writes Services, Routes and Gateways.
    pub store: Arc<dyn ResourceStore>,
    /// Immutable process configuration.
    pub config: Arc<ControllerConfig>,
    /// Derives the names linking Gateways, Services and Routes.
    pub naming: Arc<dyn NamingStrategy>,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("kube error: {0}")]
    KubeError(#[source] kube::Error),
    #[error("conflict writing {0}; the object was modified concurrently")]
    Conflict(String),
    #[error("timed out waiting for the API server: {0}")]
    Timeout(String),
    #[error("failed to update status of {kind} {name}: {source}")]
    StatusWriteError {
        kind: &'static str,
        name: String,
        #[source]
        source: Box<Error>,
    },
    #[error("invalid configuration: `{0}`")]
    InvalidConfigError(String),
    #[error("error querying CRDs: `{0}`; are the Gateway API and Route CRDs installed?")]
    CRDNotFoundError(#[source] kube::Error),
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl Error {
    pub fn status_write(kind: &'static str, key: &NamespacedName, source: Error) -> Self {
        Error::StatusWriteError {
            kind,
            name: key.to_string(),
            source: Box::new(source),
        }
    }

    /// Returns true if the error, or the status write it wraps, was an
    /// optimistic-concurrency rejection.
    pub fn is_conflict(&self) -> bool {
        match self {
            Error::Conflict(_) => true,
            Error::StatusWriteError { source, .. } => source.is_conflict(),
            _ => false,
        }
    }

    // Delay used by the controllers' error policy before retrying.
    pub fn requeue_after(&self) -> Duration {
        match self {
            Error::StatusWriteError { .. } => consts::STATUS_WRITE_RETRY_DELAY,
            _ => consts::ERROR_RETRY_DELAY,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamespacedName {
    pub name: String,
    pub namespace: String,
}

impl NamespacedName {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }

    // Builds the key of a namespaced object from its metadata.
    pub fn from_meta(meta: &kube::core::ObjectMeta) -> Result<Self> {
        let name = meta
            .name
            .clone()
            .ok_or(Error::InvalidConfigError("invalid name".to_string()))?;
        let namespace = meta
            .namespace
            .clone()
            .ok_or(Error::InvalidConfigError("invalid namespace".to_string()))?;
        Ok(Self { name, namespace })
    }
}

impl fmt::Display for NamespacedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}
