use std::sync::Arc;
use anyhow::Context;
use axum::handler::HandlerWithoutStateExt;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use crate::config::Config;
use crate::helpers::handler_404::page_not_found_handler;
use crate::repositories::ReservationRepo;

pub mod health_check;
pub mod reservation_controller;

#[derive(Clone)]
pub struct AppState {
    pub reservation_repo: Arc<dyn ReservationRepo>,
    pub enforce_unique_plate: bool,
}

pub async fn serve(
    app_state: AppState,
    config: &Config,
) -> anyhow::Result<()> {
    let application = application(app_state, parse_origins(&config.origin_urls));

    let address = config.listen_address();
    info!("API server listening on: {}", address);
    axum::Server::try_bind(&address)
        .with_context(|| format!("Error binding the API server to {}", address))?
        .serve(application.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Error spinning up the API server")
}

pub fn application(app_state: AppState, origins: Vec<HeaderValue>) -> Router {
    router_endpoints(app_state)
        .fallback_service(page_not_found_handler.into_service())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_methods([
                            Method::GET,
                            Method::POST,
                            Method::PATCH,
                            Method::DELETE,
                            Method::OPTIONS
                        ])
                        .allow_origin(origins)
                        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
                )
        )
}

pub fn router_endpoints(app_state: AppState) -> Router {
    health_check::router()
        .merge(reservation_controller::router(app_state))
}

fn parse_origins(origin_urls: &str) -> Vec<HeaderValue> {
    origin_urls
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| match s.parse::<HeaderValue>() {
            Ok(origin) => Some(origin),
            Err(e) => {
                warn!("Ignoring invalid origin url: {}, due to: {}", s, e);
                None
            }
        })
        .collect()
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for the shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, draining connections");
}
