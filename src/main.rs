// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{net::SocketAddr, sync::Arc};

use axum_server::tls_rustls::RustlsConfig;
use forum_gateway::{
    api::router,
    config::AppConfig,
    state::AppState,
    storage::{InMemoryDirectory, RedbDirectory, UserDirectory},
    telemetry,
};

#[tokio::main]
async fn main() {
    let config = AppConfig::from_env().expect("Invalid configuration");
    telemetry::init(config.log_format);

    // Install the ring crypto provider for rustls (must be done before any TLS operations)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let directory: Arc<dyn UserDirectory> = match &config.directory_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "opening account directory");
            Arc::new(
                RedbDirectory::open(path, &config.directory_collection)
                    .expect("Failed to open account directory"),
            )
        }
        None => {
            tracing::warn!("DIRECTORY_PATH not set; account directory is in-memory");
            Arc::new(InMemoryDirectory::new())
        }
    };

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("Failed to parse bind address");
    let tls = config.tls.clone();
    let forum_url = config.forum_base_url.clone();

    let state = AppState::from_config(config, directory).expect("Failed to build forum client");
    let app = router(state);

    match tls {
        Some(paths) => {
            let tls_config = RustlsConfig::from_pem_file(&paths.cert, &paths.key)
                .await
                .expect("Failed to load TLS certificate and key");

            tracing::info!(%addr, forum = %forum_url, "Forum gateway listening on https (docs at /docs)");
            axum_server::bind_rustls(addr, tls_config)
                .serve(app.into_make_service())
                .await
                .expect("HTTPS server failed");
        }
        None => {
            tracing::info!(%addr, forum = %forum_url, "Forum gateway listening on http (docs at /docs)");
            axum_server::bind(addr)
                .serve(app.into_make_service())
                .await
                .expect("HTTP server failed");
        }
    }
}
