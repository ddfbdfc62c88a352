//! `publishing serve`: HTTP JSON API for dataset proposals.
//!
//! Endpoints:
//! - GET    /health                                 - Server status (exempt from auth)
//! - GET    /publishing/info                        - Information documents
//! - GET    /publishing/repositories                - Repositories with questions
//! - GET    /publishing/questions                   - Survey questions
//! - GET    /publishing/proposal                    - Caller's proposals
//! - POST   /publishing/proposal                    - Create a proposal
//! - PUT    /publishing/proposal                    - Update a DRAFT proposal
//! - DELETE /publishing/proposal?proposal_node_id=  - Delete a proposal
//! - POST   /publishing/proposal/submit?node_id=    - DRAFT → SUBMITTED
//! - POST   /publishing/proposal/withdraw?node_id=  - SUBMITTED → WITHDRAWN
//! - GET    /publishing/submission?status=          - Workspace proposals (publishers)
//! - POST   /publishing/submission/accept?node_id=  - SUBMITTED → ACCEPTED (publishers)
//! - POST   /publishing/submission/reject?node_id=  - SUBMITTED → REJECTED (publishers)
//!
//! Caller identity comes from headers set by the upstream authorizer; see
//! [`claims::Claims`]. All responses use Content-Type: application/json.

mod claims;
mod error;
mod handlers;
mod middleware;
mod state;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::{middleware as axum_middleware, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use self::handlers::{
    handle_accept_proposal, handle_create_proposal, handle_delete_proposal, handle_health,
    handle_list_proposals, handle_list_submissions, handle_not_found, handle_publishing_info,
    handle_questions, handle_reject_proposal, handle_repositories, handle_submit_proposal,
    handle_update_proposal, handle_withdraw_proposal,
};
use self::middleware::auth_middleware;
use self::state::AppState;
use crate::config::ServeConfig;

/// Maximum request body size: 1 MB.
const MAX_BODY_SIZE: usize = 1024 * 1024;

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/publishing/info", get(handle_publishing_info))
        .route("/publishing/repositories", get(handle_repositories))
        .route("/publishing/questions", get(handle_questions))
        .route(
            "/publishing/proposal",
            get(handle_list_proposals)
                .post(handle_create_proposal)
                .put(handle_update_proposal)
                .delete(handle_delete_proposal),
        )
        .route("/publishing/proposal/submit", post(handle_submit_proposal))
        .route("/publishing/proposal/withdraw", post(handle_withdraw_proposal))
        .route("/publishing/submission", get(handle_list_submissions))
        .route("/publishing/submission/accept", post(handle_accept_proposal))
        .route("/publishing/submission/reject", post(handle_reject_proposal))
        .fallback(handle_not_found)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .with_state(state)
}

/// Start the HTTP server and run until Ctrl+C.
///
/// When TLS cert/key paths are configured (and the `tls` feature is
/// enabled), the server listens over HTTPS using `axum-server` with rustls.
pub async fn start_server(config: ServeConfig) -> anyhow::Result<()> {
    let service = crate::wiring::build_service(&config).await?;
    let api_key = config.server.api_key.clone().filter(|k| !k.is_empty());
    if api_key.is_some() {
        info!("API key authentication enabled");
    }

    let state = Arc::new(AppState::new(service, api_key, config.request_timeout()));
    let app = router(state);
    let addr = config.server.listen;

    #[cfg(feature = "tls")]
    if let (Some(cert_path), Some(key_path)) = (&config.server.tls_cert, &config.server.tls_key) {
        let tls =
            axum_server::tls_rustls::RustlsConfig::from_pem_file(cert_path, key_path).await?;
        info!(%addr, "publishing service listening on https");
        axum_server::bind_rustls(addr, tls)
            .serve(app.into_make_service_with_connect_info::<std::net::SocketAddr>())
            .await?;
        return Ok(());
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "publishing service listening on http");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("server shut down");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    info!("received shutdown signal");
}
