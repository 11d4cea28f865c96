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

use k8s_openapi::api::core::v1::ServicePort;

// Ports that usually carry HTTPS traffic. Routes use passthrough TLS, so
// these win over plain HTTP ports.
const HTTPS_PORTS: [i32; 2] = [443, 8443];
const HTTP_PORTS: [i32; 2] = [80, 8080];

// Health, metrics and admin ports of common meshes and ingress controllers.
const MANAGEMENT_PORTS: [i32; 4] = [15021, 15090, 9090, 8181];

// Chooses the Service port a Route should target. Each tier scans the whole
// list before the next one is tried, so the first port matching the highest
// tier wins:
//   1. 443 or 8443
//   2. 80 or 8080
//   3. a name containing "https"
//   4. a name containing "http"
//   5. any port that is not a known management port
//   6. the first port
pub fn select_port(ports: &[ServicePort]) -> Option<&ServicePort> {
    ports
        .iter()
        .find(|p| HTTPS_PORTS.contains(&p.port))
        .or_else(|| ports.iter().find(|p| HTTP_PORTS.contains(&p.port)))
        .or_else(|| ports.iter().find(|p| name_contains(p, "https")))
        .or_else(|| ports.iter().find(|p| name_contains(p, "http")))
        .or_else(|| ports.iter().find(|p| !MANAGEMENT_PORTS.contains(&p.port)))
        .or_else(|| ports.first())
}

fn name_contains(port: &ServicePort, needle: &str) -> bool {
    port.name
        .as_deref()
        .is_some_and(|name| name.to_lowercase().contains(needle))
}
