// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum_server::{tls_rustls::RustlsConfig, Handle};
use tracing_subscriber::EnvFilter;

use secret_manager_server::{
    api::router,
    auth::JwksManager,
    config::{AppConfig, LogFormat, DEFAULT_LOG_FILTER},
    state::{AppState, AuthConfig},
    storage::{InMemoryParameterStore, PassphraseCipher},
};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Time allowed for in-flight requests after Ctrl-C.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = AppConfig::from_env()?;
    init_tracing(config.log_format);

    let cipher = PassphraseCipher::new(&config.encryption_passphrase)?;

    let jwks = match &config.jwks_url {
        Some(url) => Some(JwksManager::new(url)?),
        None => {
            tracing::warn!("JWKS_URL not set, token signatures are NOT verified (development mode)");
            None
        }
    };

    let store = InMemoryParameterStore::new().with_page_size(config.store_page_size);
    let state = AppState::new(Arc::new(store), cipher).with_auth_config(AuthConfig {
        jwks,
        issuer: config.token_issuer.clone(),
        audience: config.token_audience.clone(),
        identity_region: config.identity_region.clone(),
    });
    let app = router(state);

    let handle = Handle::new();
    tokio::spawn(shutdown_on_ctrl_c(handle.clone()));

    let addr = config.bind_addr;
    match &config.tls {
        Some(tls) => {
            // Must happen before any TLS operation.
            rustls::crypto::ring::default_provider()
                .install_default()
                .map_err(|_| "failed to install rustls crypto provider")?;

            let tls_config = RustlsConfig::from_pem_file(&tls.cert, &tls.key).await?;
            tracing::info!(%addr, "Secret manager listening on https (docs at /docs)");
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            tracing::info!(%addr, "Secret manager listening on http (docs at /docs)");
            axum_server::bind(addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
    }

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_on_ctrl_c(handle: Handle<SocketAddr>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received, draining connections");
    handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
}
