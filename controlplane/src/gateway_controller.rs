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

use std::{ops::Sub, sync::Arc, time::Instant};

use crate::gateway_utils::*;
use crate::{
    conditions::set_condition,
    service_utils::{get_ingress, is_load_balancer},
    store::Lookup,
    Context, Error, NamespacedName, Result,
};

use futures::StreamExt;
use gateway_api::apis::standard::gateways::Gateway;
use kube::{
    api::{Api, ListParams},
    runtime::{controller::Action, watcher::Config, Controller},
    Client,
};
use tracing::{debug, info, warn};

pub async fn reconcile(gateway: Arc<Gateway>, ctx: Arc<Context>) -> Result<Action> {
    let key = NamespacedName::from_meta(&gateway.metadata)?;
    sync_gateway(&ctx, &key).await
}

// Reflects the state of the Service and Route behind a Gateway in the
// Gateway's Accepted and Programmed conditions and its addresses.
pub async fn sync_gateway(ctx: &Context, key: &NamespacedName) -> Result<Action> {
    let start = Instant::now();

    let gateway = match ctx.store.get_gateway(key).await? {
        Lookup::Found(gateway) => gateway,
        Lookup::NotFound => {
            debug!(gateway = %key, "gateway deleted");
            return Ok(Action::await_change());
        }
    };

    // Only reconcile the Gateway object if it belongs to a supported gateway class.
    let class_name = gateway.spec.gateway_class_name.as_str();
    if !ctx.config.supports_gateway_class(class_name) {
        debug!(gateway = %key, class = class_name, "gateway class not supported, skipping");
        return Ok(Action::await_change());
    }
    info!(gateway = %key, class = class_name, "processing gateway");

    let generation = gateway.metadata.generation;
    let mut gw = gateway.clone();
    set_condition(&mut gw, get_accepted_condition(generation));

    let readiness = match check_readiness(ctx, &gateway).await {
        Ok(readiness) => readiness,
        Err(error) => {
            // The Gateway is ours whatever its dependencies look like, so
            // Accepted is recorded before the lookup is retried.
            write_status_if_changed(ctx, key, &gateway, &gw).await?;
            return Err(error);
        }
    };

    set_condition(&mut gw, readiness.programmed_condition(generation));
    set_gateway_status_addresses(&mut gw, readiness.hostname());

    if write_status_if_changed(ctx, key, &gateway, &gw).await? {
        match &readiness {
            Readiness::Programmed { hostname } => {
                info!(gateway = %key, hostname = ?hostname, "gateway is programmed")
            }
            other => info!(gateway = %key, state = ?other, "gateway not programmed"),
        }
    } else {
        debug!(gateway = %key, "gateway status up to date");
    }

    let duration = Instant::now().sub(start);
    info!("finished reconciling in {:?} ms", duration.as_millis());
    Ok(readiness.action())
}

// Writes the desired status unless it matches what was read. Returns whether
// a write happened.
async fn write_status_if_changed(
    ctx: &Context,
    key: &NamespacedName,
    current: &Gateway,
    desired: &Gateway,
) -> Result<bool> {
    if !status_changed(current, desired)? {
        return Ok(false);
    }
    ctx.store
        .update_gateway_status(desired)
        .await
        .map_err(|e| Error::status_write("Gateway", key, e))?;
    Ok(true)
}

// Follows the Gateway to its Service and the Service to its Route.
async fn check_readiness(ctx: &Context, gateway: &Gateway) -> Result<Readiness> {
    let service_key = ctx.naming.service_for_gateway(gateway)?;
    debug!(service = %service_key, "looking for LoadBalancer service");

    let service = match ctx.store.get_service(&service_key).await? {
        Lookup::Found(service) => service,
        Lookup::NotFound => return Ok(Readiness::ServiceNotFound(service_key)),
    };
    if !is_load_balancer(&service) {
        return Ok(Readiness::ServiceNotLoadBalancer(service_key));
    }
    if get_ingress(&service).is_empty() {
        return Ok(Readiness::ServicePending(service_key));
    }

    let route_key = ctx.naming.route_for_service(&service_key);
    let route = match ctx.store.get_route(&route_key).await? {
        Lookup::Found(route) => route,
        Lookup::NotFound => return Ok(Readiness::RouteNotFound(route_key)),
    };

    Ok(Readiness::Programmed {
        hostname: resolve_hostname(&service, &route),
    })
}

pub async fn controller(client: Client, ctx: Context) -> Result<()> {
    let gateway = Api::<Gateway>::all(client);
    gateway
        .list(&ListParams::default().limit(1))
        .await
        .map_err(Error::CRDNotFoundError)?;

    Controller::new(gateway, Config::default().any_semantic())
        .shutdown_on_signal()
        .run(reconcile, error_policy, Arc::new(ctx))
        .filter_map(|x| async move { std::result::Result::ok(x) })
        .for_each(|_| futures::future::ready(()))
        .await;

    Ok(())
}

fn error_policy(_: Arc<Gateway>, error: &Error, _: Arc<Context>) -> Action {
    if error.is_conflict() {
        info!("status write lost a race, retrying with a fresh read: {}", error);
    } else {
        warn!("reconcile failed: {:?}", error);
    }
    Action::requeue(error.requeue_after())
}
