//! Static files under `/public`.

use axum::{
    Router,
    extract::{Path, Request, State},
    response::{IntoResponse, Response},
    routing::get,
};
use std::path::{Component, PathBuf};
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::config::Config;
use crate::web::WebError;

#[derive(Clone, Debug)]
pub struct AssetState {
    pub public_dir: PathBuf,
}

impl AssetState {
    pub fn from_config(config: &Config) -> Self {
        Self {
            public_dir: config.public_dir.clone(),
        }
    }
}

/// Turns the decoded wildcard part of a `/public/...` URL into a path relative
/// to the public directory.
///
/// Returns `None` for any path with a `..` segment and for paths that name the
/// directory itself.
pub fn resolve_public_path(requested: &str) -> Option<PathBuf> {
    let segments: Vec<&str> = requested
        .split(['/', '\\'])
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect();

    if segments.is_empty() || segments.contains(&"..") {
        return None;
    }

    let relative: PathBuf = segments.iter().collect();
    // Drive prefixes and roots would escape the public directory on join.
    relative
        .components()
        .all(|component| matches!(component, Component::Normal(_)))
        .then_some(relative)
}

/// Handler for `GET /public/{*path}`.
#[tracing::instrument(skip(state, request))]
async fn static_file_handler(
    State(state): State<Arc<AssetState>>,
    Path(path): Path<String>,
    request: Request,
) -> Result<Response, WebError> {
    let Some(relative) = resolve_public_path(&path) else {
        tracing::warn!("Rejected static file path {:?}", path);
        return Err(WebError::NotFound);
    };

    let file_path = state.public_dir.join(relative);
    match tokio::fs::metadata(&file_path).await {
        Ok(metadata) if metadata.is_file() => {}
        _ => return Err(WebError::NotFound),
    }

    let response = ServeFile::new(&file_path)
        .oneshot(request)
        .await
        .unwrap_or_else(|never| match never {});
    Ok(response.into_response())
}

/// Creates the router that serves the public directory.
pub fn create_asset_router(state: Arc<AssetState>) -> Router {
    Router::new()
        .route("/public/{*path}", get(static_file_handler))
        .with_state(state)
}
