use axum::Router;
use axum::extract::{Form, Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::Cookie;
use std::sync::Arc;

use crate::config::Config;
use crate::view::{self, LoginTemplate};
use crate::web::WebError;

/// Name of the cookie that marks a logged-in browser.
pub const SESSION_COOKIE: &str = "loggedIn";
const SESSION_VALUE: &str = "1";

/// Authentication state containing the shared password.
#[derive(Clone)]
pub struct AuthState {
    password: String,
}

impl AuthState {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
        }
    }

    /// Creates a new AuthState from the application config.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.password.clone())
    }

    fn accepts(&self, submitted_password: &str) -> bool {
        submitted_password.as_bytes() == self.password.as_bytes()
    }
}

/// Represents the login request payload.
#[derive(serde::Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub password: String,
}

/// Checks a submitted password against the shared password.
///
/// On a match the session cookie is added to the jar and the browser is sent to
/// the task list. Otherwise the jar is returned untouched and the browser goes
/// back to the login page.
pub fn attempt_login(
    state: &AuthState,
    jar: CookieJar,
    submitted_password: &str,
) -> (CookieJar, Redirect) {
    if !state.accepts(submitted_password) {
        tracing::info!("Rejected login attempt");
        return (jar, Redirect::to("/login"));
    }

    let cookie = Cookie::build((SESSION_COOKIE, SESSION_VALUE))
        .secure(true)
        .http_only(true)
        .build();
    tracing::info!("Accepted login attempt");
    (jar.add(cookie), Redirect::to("/"))
}

/// Returns true when the request carries `loggedIn=1`.
pub fn is_authenticated(headers: &HeaderMap) -> bool {
    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .is_some_and(|cookie| cookie.value() == SESSION_VALUE)
}

/// Creates a login router with authentication routes.
pub fn create_login_router(state: Arc<AuthState>) -> Router<()> {
    Router::new()
        .route(
            "/login",
            axum::routing::get(login_page_handler).post(login_handler),
        )
        .with_state(state)
}

/// Login redirect middleware that sends unauthenticated requests to the login page.
/// Nothing behind this middleware runs for such requests.
pub async fn login_redirect_middleware(request: Request, next: Next) -> Response {
    if !is_authenticated(request.headers()) {
        tracing::debug!(path = %request.uri().path(), "Redirecting unauthenticated request");
        return Redirect::to("/login").into_response();
    }

    next.run(request).await
}

/// Handles the login form submission.
pub async fn login_handler(
    State(state): State<Arc<AuthState>>,
    jar: CookieJar,
    Form(payload): Form<LoginRequest>,
) -> (CookieJar, Redirect) {
    attempt_login(&state, jar, &payload.password)
}

/// Handles GET requests to display the login page.
#[tracing::instrument]
pub async fn login_page_handler() -> Result<Response, WebError> {
    Ok(view::render(&LoginTemplate)?)
}
