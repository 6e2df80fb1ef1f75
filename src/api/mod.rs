use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::Store;
use crate::services::{AuthService, VirtualMachineService};
use crate::state::SharedState;

pub mod auth;
mod error;
mod extract;
mod observability;
pub mod records;
mod system;
mod types;
pub mod users;
mod validation;

pub use error::ApiError;
pub use extract::{ApiForm, ApiJson, ApiPath, ApiQuery};
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &Store {
        &self.shared.store
    }

    #[must_use]
    pub fn auth_service(&self) -> &Arc<dyn AuthService> {
        &self.shared.auth_service
    }

    #[must_use]
    pub fn vm_service(&self) -> &Arc<dyn VirtualMachineService> {
        &self.shared.vm_service
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config().server.cors_allowed_origins);

    let api_router = Router::new()
        .merge(create_protected_router(state.clone()))
        .route("/login", post(auth::login))
        .route("/users", post(users::register))
        .route("/health", get(system::health))
        .with_state(state);

    Router::new()
        .route("/", get(system::root))
        .nest("/api/v1", api_router)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::security_headers_middleware))
        .layer(middleware::from_fn(observability::logging_middleware))
}

/// `*` anywhere in the list allows every origin.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    layer.allow_origin(origins)
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/records",
            get(records::list_records).post(records::create_record),
        )
        .route(
            "/records/{id}",
            get(records::get_record)
                .put(records::update_record)
                .delete(records::delete_record),
        )
        .route(
            "/virtual-machines",
            get(records::list_records).post(records::create_record),
        )
        .route(
            "/virtual-machines/{id}",
            get(records::get_record)
                .put(records::update_record)
                .delete(records::delete_record),
        )
        .route(
            "/users/me",
            get(users::get_current_user).put(users::update_current_user),
        )
        .route("/admin/users", get(users::list_users))
        .route("/admin/users/{id}", get(users::get_user))
        .route("/admin/users/{id}/active", put(users::set_user_active))
        .route("/metrics", get(system::get_metrics))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
