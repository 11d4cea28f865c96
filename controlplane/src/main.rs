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

use std::sync::Arc;

use tinylb::{config::Args, naming::ConventionNaming, store::KubeStore, *};

use anyhow::Context as _;
use clap::Parser;
use kube::Client;
use tokio::try_join;
use tracing::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Args::parse()
        .into_config()
        .context("invalid controller configuration")?;
    info!(
        gateway_classes = ?config.supported_gateway_classes,
        route_namespace = ?config.route_namespace,
        hostname_pattern = config.hostname_pattern.as_str(),
        "starting tinylb controllers"
    );

    let client = Client::try_default()
        .await
        .context("failed to create kube Client")?;
    let ctx = tinylb::Context {
        store: Arc::new(KubeStore::new(client.clone(), config.request_timeout)),
        naming: Arc::new(ConventionNaming::from_config(&config)),
        config: Arc::new(config),
    };

    if let Err(error) = try_join!(
        service_controller(client.clone(), ctx.clone()),
        gateway_controller(client, ctx),
    ) {
        error!("failed to start controllers: {error:?}");
        std::process::exit(1);
    }
    Ok(())
}
