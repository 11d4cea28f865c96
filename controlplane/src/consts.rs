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

// Prefix of every Route created for a LoadBalancer Service.
pub const ROUTE_NAME_PREFIX: &str = "tinylb-";

// Label marking a Route as managed by tinylb.
pub const MANAGED_LABEL: &str = "tinylb.io/managed";

// Label carrying the name of the Service a Route was created for.
pub const SERVICE_NAME_LABEL: &str = "tinylb.io/service";

// Label carrying the UID of the Service a Route was created for.
pub const SERVICE_UID_LABEL: &str = "tinylb.io/service-uid";

// Field manager for tinylb status writes.
pub const TINYLB_FIELD_MANAGER: &str = "tinylb-field-manager";

pub const LOAD_BALANCER_SERVICE_TYPE: &str = "LoadBalancer";

pub const HOSTNAME_ADDRESS_TYPE: &str = "Hostname";

pub const PASSTHROUGH_TERMINATION: &str = "passthrough";

pub const DEFAULT_HOSTNAME_PATTERN: &str = "{service}-{namespace}.apps-crc.testing";

pub const DEFAULT_GATEWAY_CLASSES: &str = "istio";

// How long to wait before checking again on a Service or Route that is
// expected but not ready yet.
pub const DEPENDENCY_RECHECK_DELAY: Duration = Duration::from_secs(30);

// Retry delay after a failed status write.
pub const STATUS_WRITE_RETRY_DELAY: Duration = Duration::from_secs(10);

// Retry delay for any other reconcile error.
pub const ERROR_RETRY_DELAY: Duration = Duration::from_secs(5);
