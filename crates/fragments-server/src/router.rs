use std::sync::Arc;
use std::time::Duration;

use axum::extract::{DefaultBodyLimit, Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use fragments_store::Storage;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{AuthProvider, Credentials};
use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::handler;

/// Shared handler state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub storage: Storage,
    pub auth: Arc<dyn AuthProvider>,
    pub api_url: Option<String>,
    pub max_body_bytes: usize,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(storage: Storage, auth: Arc<dyn AuthProvider>) -> Self {
        let defaults = ServerConfig::default();
        Self {
            storage,
            auth,
            api_url: defaults.api_url,
            max_body_bytes: defaults.max_body_bytes,
            request_timeout: Duration::from_secs(defaults.request_timeout_secs),
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            storage: config.build_storage(),
            auth: config.build_auth(),
            api_url: config.api_url.clone(),
            max_body_bytes: config.max_body_bytes,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("storage", &self.storage)
            .field("api_url", &self.api_url)
            .field("max_body_bytes", &self.max_body_bytes)
            .finish_non_exhaustive()
    }
}

/// Authenticate the request and attach the caller's [`Identity`].
///
/// [`Identity`]: crate::auth::Identity
async fn require_identity(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ServerResult<Response> {
    let credentials = Credentials::from_headers(request.headers())?;
    let identity = state.auth.authenticate(&credentials).await?;
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Build the axum router with all fragment endpoints.
pub fn build_router(state: AppState) -> Router {
    let fragments = Router::new()
        .route(
            "/v1/fragments",
            get(handler::list_fragments).post(handler::create_fragment),
        )
        .route(
            "/v1/fragments/:id",
            get(handler::get_fragment)
                .put(handler::update_fragment)
                .delete(handler::delete_fragment),
        )
        .route("/v1/fragments/:id/info", get(handler::get_info))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_identity));

    Router::new()
        .route("/", get(handler::health))
        .merge(fragments)
        .layer(DefaultBodyLimit::max(state.max_body_bytes))
        .layer(TimeoutLayer::new(state.request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
