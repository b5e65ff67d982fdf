pub mod middleware;

use axum::Router;
use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use axum::http::{StatusCode, header};
use axum::middleware::from_fn;
use axum::response::{Html, IntoResponse, Response};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_http::trace::TraceLayer;

use crate::assets::{AssetState, create_asset_router};
use crate::auth::{AuthState, create_login_router, login_redirect_middleware};
use crate::config::Config;
use crate::db::Gateway;
use crate::task::StoreError;
use crate::task::web::{TaskState, create_task_router};
use crate::view::{self, NotFoundTemplate};
use middleware::RequestSpan;

/// Custom error type for web handler operations.
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    /// Represents an error during template rendering.
    /// The specific `askama::Error` is captured as the source of this error.
    #[error("Template rendering failed")]
    Template(#[from] askama::Error),
    /// Represents a failed task store operation.
    #[error("Task store operation failed")]
    Store(#[from] StoreError),
    /// The requested page does not exist.
    #[error("Page not found")]
    NotFound,
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        match self {
            WebError::NotFound => not_found_response(),
            err => {
                tracing::error!("Request failed: {:?}", err);
                internal_error_response()
            }
        }
    }
}

fn internal_error_response() -> Response {
    let user_facing_error_message =
        "An unexpected error occurred while processing your request. Please try again later.";
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html(format!(
            "<h1>Internal Server Error</h1><p>{}</p>",
            user_facing_error_message
        )),
    )
        .into_response()
}

fn not_found_response() -> Response {
    match view::render_with_status(StatusCode::NOT_FOUND, &NotFoundTemplate) {
        Ok(response) => response,
        Err(err) => {
            tracing::error!("Failed to render not found page: {:?}", err);
            internal_error_response()
        }
    }
}

/// Path parameters that must parse as `T`. A segment that does not parse means
/// no route matched, so the rejection is the not found page.
pub struct IdPath<T>(pub T);

impl<T, S> FromRequestParts<S> for IdPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(IdPath(value)),
            Err(rejection) => {
                tracing::debug!("Unmatched path parameters: {}", rejection);
                Err(WebError::NotFound)
            }
        }
    }
}

/// Handler for any request no route matched.
#[tracing::instrument]
pub async fn not_found_handler() -> WebError {
    WebError::NotFound
}

/// Builds the application router: public login and asset routes, task routes
/// behind the login redirect, and the not found fallback.
pub fn create_app(config: Arc<Config>, gateway: Gateway) -> Router {
    let auth_state = Arc::new(AuthState::from_config(&config));
    let login_router = create_login_router(auth_state);

    let asset_router = create_asset_router(Arc::new(AssetState::from_config(&config)));

    let protected_routes = create_task_router(Arc::new(TaskState { gateway }))
        .route_layer(from_fn(login_redirect_middleware));

    Router::new()
        .merge(protected_routes)
        .merge(login_router)
        .merge(asset_router)
        .fallback(not_found_handler)
        .method_not_allowed_fallback(not_found_handler)
        .layer(
            ServiceBuilder::new()
                .layer(SetSensitiveRequestHeadersLayer::new([header::COOKIE]))
                .layer(TraceLayer::new_for_http().make_span_with(RequestSpan)),
        )
}

#[tracing::instrument(skip(config))]
pub async fn start_web_server(config: Config) -> anyhow::Result<()> {
    let server_address = format!("0.0.0.0:{}", &config.port);
    let listener = tokio::net::TcpListener::bind(&server_address).await?;
    tracing::info!("Web server running on http://{}", server_address);

    let gateway = Gateway::postgres(config.connection_url());
    let app = create_app(Arc::new(config), gateway);

    axum::serve(listener, app).await?;
    Ok(())
}
