use axum::extract::MatchedPath;
use axum::http::Request;
use tower_http::trace::MakeSpan;
use tracing::Span;

use crate::auth::is_authenticated;

/// Span maker for request tracing.
///
/// Records the method, path, matched route and whether the browser carries a
/// session. Cookie values, query strings and bodies are never recorded.
#[derive(Clone, Debug)]
pub struct RequestSpan;

impl<B> MakeSpan<B> for RequestSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let matched_path = request
            .extensions()
            .get::<MatchedPath>()
            .map(MatchedPath::as_str);

        tracing::info_span!(
            "request",
            method = %request.method(),
            path = request.uri().path(),
            matched_path,
            authenticated = is_authenticated(request.headers()),
        )
    }
}
