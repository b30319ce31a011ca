// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{DecryptionNetwork, DisclosureRequest, ErrorBody, NetworkError, DISCLOSE_ROUTE};
use actix_web::{
    dev::ServerHandle, http::StatusCode, middleware::Logger, web, App, HttpResponse, HttpServer,
};
use anyhow::{Context, Result};
use std::{net::SocketAddr, sync::Arc};
use tracing::info;

pub const DEFAULT_KMS_PORT: u16 = 50055;

#[derive(Clone)]
struct ServerState {
    network: Arc<dyn DecryptionNetwork>,
}

/// Serves a [`DecryptionNetwork`] over HTTP for [`crate::HttpDecryptionNetwork`] clients
pub struct KmsServer {
    network: Arc<dyn DecryptionNetwork>,
    host: String,
    port: u16,
}

/// A server running in the background
pub struct RunningServer {
    pub addr: SocketAddr,
    handle: ServerHandle,
}

impl RunningServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn stop(self) {
        self.handle.stop(true).await;
    }
}

impl KmsServer {
    pub fn new(network: Arc<dyn DecryptionNetwork>) -> Self {
        Self {
            network,
            host: "127.0.0.1".to_string(),
            port: DEFAULT_KMS_PORT,
        }
    }

    /// Port 0 picks a free port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_host<S: Into<String>>(mut self, host: S) -> Self {
        self.host = host.into();
        self
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Binds and spawns the server on the current tokio runtime
    pub fn spawn(self) -> Result<RunningServer> {
        let bind_addr = self.bind_address();
        let state = ServerState {
            network: self.network,
        };
        let server = HttpServer::new(move || {
            App::new()
                .app_data(web::Data::new(state.clone()))
                .wrap(Logger::default())
                .route(&format!("/{DISCLOSE_ROUTE}"), web::post().to(handle_disclose))
                .route("/health", web::get().to(handle_health_check))
        })
        .workers(1)
        .bind(&bind_addr)
        .with_context(|| format!("Could not bind decryption network to {bind_addr}"))?;

        let addr = server
            .addrs()
            .first()
            .copied()
            .context("Server bound no address")?;
        let server = server.run();
        let handle = server.handle();
        tokio::spawn(server);
        info!("Decryption network listening on http://{}", addr);
        Ok(RunningServer { addr, handle })
    }
}

fn error_response(error: &NetworkError) -> HttpResponse {
    let status = match error {
        NetworkError::Denied(_) => StatusCode::FORBIDDEN,
        NetworkError::ContextMismatch(_) => StatusCode::CONFLICT,
        NetworkError::NotReady(_) => StatusCode::NOT_FOUND,
        NetworkError::Malformed(_) => StatusCode::UNPROCESSABLE_ENTITY,
        NetworkError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    HttpResponse::build(status).json(ErrorBody {
        error: error.to_string(),
    })
}

async fn handle_disclose(
    state: web::Data<ServerState>,
    request: web::Json<DisclosureRequest>,
) -> HttpResponse {
    match state.network.disclose(request.into_inner()).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => error_response(&e),
    }
}

async fn handle_health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}
