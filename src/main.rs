use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Server;
use casabonita_proxy::{
    api::http::{self, AppState},
    config::Config,
    logicware::{
        self,
        auth::{ApiKeyCredentials, TokenManager},
    },
    mantra,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().context("invalid configuration")?;

    let reqwest_client = reqwest::Client::builder()
        .build()
        .context("failed to build the HTTP client")?;

    let credentials = ApiKeyCredentials {
        client: reqwest_client.clone(),
        base_url: config.logicware_api_url.clone(),
        api_key: config.api_key.clone(),
        subdomain: config.subdomain.clone(),
    };
    let tokens = Arc::new(TokenManager::new(credentials));

    let logicware = logicware::Client {
        http: reqwest_client.clone(),
        base_url: config.logicware_api_url.clone(),
        subdomain: config.subdomain.clone(),
        tokens: Arc::clone(&tokens),
    };
    let mantra = mantra::Client {
        http: reqwest_client,
        base_url: config.mantra_api_url.clone(),
        group_id: config.mantra.group_id.clone(),
        api_key: config.mantra.api_key.clone(),
        tag_id: config.mantra.tag_id.clone(),
    };

    info!(
        message = "Starting Casa Bonita Proxy API",
        port = config.port,
        environment = config.environment.as_str(),
        api_key_configured = config.api_key_configured(),
        subdomain_configured = config.subdomain_configured(),
        mantra_configured = config.mantra.is_configured(),
    );
    info!(
        message = "Endpoints",
        health = %format!("http://localhost:{}/health", config.port),
        token = %format!("http://localhost:{}/auth/external/token", config.port),
        stock = %format!("http://localhost:{}/api/units/stock", config.port),
        leads = %format!("http://localhost:{}/api/leads/create", config.port),
        mantra = %format!("http://localhost:{}/api/mantra/contact", config.port),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = Arc::new(AppState {
        config,
        tokens,
        logicware,
        mantra,
    });
    let app = http::routes(state);

    Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!(message = "Server closed gracefully");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(message = "Failed to listen for the shutdown signal", error = %err);
    }
}
