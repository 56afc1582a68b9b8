// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use sam_node::{
    api::{start_server, AppState},
    config::ServiceConfig,
    sam::SamModel,
    version,
};
use std::{env, net::SocketAddr, sync::Arc};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let config = ServiceConfig::from_env();

    info!("Starting {}", version::get_version_string());
    info!("Model: {}", config.model_variant);
    info!("Checkpoint: {}", config.checkpoint_dir);
    info!("Device: {}", config.device);

    // Model load failure is fatal: the process never serves requests
    // with a partially loaded model
    let model = SamModel::load(&config.model_variant, &config.checkpoint_dir, &config.device)
        .await
        .map_err(|e| anyhow::anyhow!("failed to start SAM service: {}", e))?;

    let state = AppState {
        engine: Arc::new(model),
    };

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    start_server(addr, state).await
}
