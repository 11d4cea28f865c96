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

use crate::{
    route::Route,
    service_utils::*,
    store::{Created, Lookup},
    Context, Error, NamespacedName, Result,
};

use futures::StreamExt;
use k8s_openapi::api::core::v1::Service;
use kube::{
    api::{Api, ListParams},
    runtime::{controller::Action, watcher::Config, Controller},
    Client,
};
use tracing::{debug, info, warn};

pub async fn reconcile(service: Arc<Service>, ctx: Arc<Context>) -> Result<Action> {
    let key = NamespacedName::from_meta(&service.metadata)?;
    sync_service(&ctx, &key).await
}

// Gives a LoadBalancer Service without an external address a Route and
// publishes the Route's hostname as the Service's ingress.
//
// Progress is read back from the cluster on every pass: a Service that
// already has ingress is done, and an existing Route is left alone so a pass
// that created the Route but failed to write status resumes at the status
// write.
pub async fn sync_service(ctx: &Context, key: &NamespacedName) -> Result<Action> {
    let start = Instant::now();

    let service = match ctx.store.get_service(key).await? {
        Lookup::Found(service) => service,
        Lookup::NotFound => {
            debug!(service = %key, "service deleted; owned route is garbage collected");
            return Ok(Action::await_change());
        }
    };

    if !is_load_balancer(&service) {
        return Ok(Action::await_change());
    }

    // Once an address is published the Service is never revisited, even if
    // its ports change later.
    if !get_ingress(&service).is_empty() {
        debug!(service = %key, "service already has an external address");
        return Ok(Action::await_change());
    }

    info!(service = %key, "processing LoadBalancer service without external address");

    let route_key = ctx.naming.route_for_service(key);
    let host = ctx.naming.route_hostname(key);
    let route = build_route_for_service(&service, &route_key, &host)?;
    create_route_if_not_exists(ctx, &route_key, &route).await?;

    let mut updated = service.clone();
    set_ingress_hostname(&mut updated, &host);
    ctx.store
        .update_service_status(&updated)
        .await
        .map_err(|e| Error::status_write("Service", key, e))?;

    info!(
        service = %key,
        route = %route_key,
        hostname = %host,
        "published route hostname as service ingress"
    );
    let duration = Instant::now().sub(start);
    info!("finished reconciling in {:?} ms", duration.as_millis());
    Ok(Action::await_change())
}

// Creates the Route unless one with the same name exists. An existing Route
// is never updated.
async fn create_route_if_not_exists(
    ctx: &Context,
    route_key: &NamespacedName,
    route: &Route,
) -> Result<()> {
    if let Lookup::Found(_) = ctx.store.get_route(route_key).await? {
        debug!(route = %route_key, "route exists");
        return Ok(());
    }

    match ctx.store.create_route(route).await? {
        Created::Created(_) => {
            info!(
                route = %route_key,
                target_port = ?route.spec.port.as_ref().map(|p| &p.target_port),
                "created route for LoadBalancer service"
            );
        }
        Created::AlreadyExists => {
            debug!(route = %route_key, "route created concurrently");
        }
    }
    Ok(())
}

pub async fn controller(client: Client, ctx: Context) -> Result<()> {
    let services = Api::<Service>::all(client.clone());
    let routes = Api::<Route>::all(client);
    routes
        .list(&ListParams::default().limit(1))
        .await
        .map_err(Error::CRDNotFoundError)?;

    Controller::new(services, Config::default().any_semantic())
        .owns(routes, Config::default())
        .shutdown_on_signal()
        .run(reconcile, error_policy, Arc::new(ctx))
        .filter_map(|x| async move { std::result::Result::ok(x) })
        .for_each(|_| futures::future::ready(()))
        .await;

    Ok(())
}

fn error_policy(_: Arc<Service>, error: &Error, _: Arc<Context>) -> Action {
    if error.is_conflict() {
        info!("status write lost a race, retrying with a fresh read: {}", error);
    } else {
        warn!("reconcile failed: {:?}", error);
    }
    Action::requeue(error.requeue_after())
}
