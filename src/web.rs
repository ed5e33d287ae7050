use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::skill::{RequestEnvelope, SkillHandler};
use crate::{CareFinderError, Result};

const MAX_BODY_BYTES: usize = 64 * 1024;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub fn router(handler: Arc<SkillHandler>) -> Router {
    Router::new()
        .route("/skill", post(skill))
        .route("/health", get(health))
        .with_state(handler)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    REQUEST_TIMEOUT,
                )),
        )
}

async fn skill(
    State(handler): State<Arc<SkillHandler>>,
    Json(envelope): Json<RequestEnvelope>,
) -> Response {
    match handler.handle(envelope).await {
        Ok(response) => Json(response).into_response(),
        Err(e @ CareFinderError::InvalidRequest { .. }) => {
            (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() }))).into_response()
        }
        Err(e) => {
            tracing::error!("Skill request failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal error" })),
            )
                .into_response()
        }
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "version": crate::VERSION }))
}

pub async fn run(config: &ServerConfig, handler: Arc<SkillHandler>) -> Result<()> {
    let app = router(handler);
    let addr: SocketAddr = config.socket_address().parse().map_err(|e| {
        CareFinderError::config(format!("Invalid bind address {}: {e}", config.socket_address()))
    })?;

    #[cfg(feature = "tls")]
    {
        if let (Some(cert), Some(key)) = (&config.tls_cert_path, &config.tls_key_path) {
            let tls = axum_server::tls_rustls::RustlsConfig::from_pem_file(cert, key).await?;
            tracing::info!("Skill endpoint running at https://{}", addr);
            axum_server::bind_rustls(addr, tls)
                .serve(app.into_make_service())
                .await?;
            return Ok(());
        }
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Skill endpoint running at http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
