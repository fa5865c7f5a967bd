//! Session authentication for the gallery.
//!
//! A single shared password unlocks the gallery. A successful login issues a
//! signed, expiring session token stored in the `gallery_session` cookie.
//!
//! # Token Scheme
//!
//! ```text
//! token     = "{expiry}.{signature}"
//! signature = hex(HMAC-SHA256(secret_key, "gallery-session:{expiry}"))
//! ```
//!
//! # Security Properties
//!
//! - **Stateless**: the server keeps no session table; the token is the proof
//! - **Time-limited**: tokens expire after the configured TTL
//! - **Constant-time comparison**: signatures and passwords are compared with
//!   `subtle` to prevent timing attacks
//!
//! # Example
//!
//! ```rust
//! use bucket_gallery::server::auth::SessionAuth;
//! use std::time::Duration;
//!
//! let auth = SessionAuth::new("my-secret-key", Duration::from_secs(3600));
//! let token = auth.issue();
//! assert!(auth.verify(&token).is_ok());
//! ```

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::{
    extract::{OriginalUri, Query, Request, State},
    http::{header, HeaderMap, StatusCode, Uri},
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::{debug, info, warn};

use super::handlers::ErrorResponse;
use super::pages::login_page_html;

/// Name of the session cookie.
pub const SESSION_COOKIE_NAME: &str = "gallery_session";

/// Domain separator mixed into every signature.
const TOKEN_CONTEXT: &str = "gallery-session";

/// Shown when a login is attempted but no password is configured.
pub const NOT_CONFIGURED_MESSAGE: &str = "Server is not configured. Contact admin.";

/// Shown when the submitted password does not match.
pub const INVALID_PASSWORD_MESSAGE: &str = "Invalid password";

// =============================================================================
// Types
// =============================================================================

/// HMAC-SHA256 type alias
type HmacSha256 = Hmac<Sha256>;

/// Authentication error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No session cookie on the request
    MissingSession,

    /// Cookie value is not `{expiry}.{hex}`
    MalformedToken,

    /// Token has expired
    Expired {
        /// When the token expired
        expired_at: u64,
        /// Current time
        current_time: u64,
    },

    /// Signature does not match
    InvalidSignature,
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingSession => write!(f, "Authentication required"),
            AuthError::MalformedToken => write!(f, "Malformed session token"),
            AuthError::Expired {
                expired_at,
                current_time,
            } => write!(
                f,
                "Session expired at {} (current time: {})",
                expired_at, current_time
            ),
            AuthError::InvalidSignature => write!(f, "Invalid session signature"),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = StatusCode::UNAUTHORIZED;
        let message = self.to_string();

        // A forged signature is worth noticing; missing or stale sessions are routine
        match &self {
            AuthError::InvalidSignature | AuthError::MalformedToken => {
                warn!(status = status.as_u16(), "Authentication failed: {}", message);
            }
            _ => {
                debug!(status = status.as_u16(), "Authentication failed: {}", message);
            }
        }

        let error_response = ErrorResponse::with_status("unauthorized", message, status);
        (status, Json(error_response)).into_response()
    }
}

// =============================================================================
// Session Authentication
// =============================================================================

/// Issues and verifies session tokens and checks the shared password.
#[derive(Clone)]
pub struct SessionAuth {
    /// Secret key for HMAC computation
    secret_key: Vec<u8>,

    /// Shared viewer password; `None` disables login
    password: Option<String>,

    /// Lifetime of issued tokens
    ttl: Duration,
}

impl SessionAuth {
    /// Create an authenticator with the given secret key and token lifetime.
    ///
    /// No password is configured: every login attempt is refused until
    /// [`with_password`](Self::with_password) is called.
    pub fn new(secret_key: impl AsRef<[u8]>, ttl: Duration) -> Self {
        Self {
            secret_key: secret_key.as_ref().to_vec(),
            password: None,
            ttl,
        }
    }

    /// Set the shared viewer password. Empty passwords count as unset.
    pub fn with_password(mut self, password: Option<impl Into<String>>) -> Self {
        self.password = password.map(Into::into).filter(|p| !p.is_empty());
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Whether a viewer password is configured.
    pub fn password_configured(&self) -> bool {
        self.password.is_some()
    }

    /// Check a submitted password against the configured one.
    pub fn check_password(&self, candidate: &str) -> bool {
        match &self.password {
            Some(password) => candidate.as_bytes().ct_eq(password.as_bytes()).into(),
            None => false,
        }
    }

    /// Issue a token valid for the configured TTL.
    pub fn issue(&self) -> String {
        self.issue_with_expiry(now_secs().saturating_add(self.ttl.as_secs()))
    }

    /// Issue a token that expires at a specific Unix timestamp.
    pub fn issue_with_expiry(&self, expiry: u64) -> String {
        format!("{}.{}", expiry, hex::encode(self.compute_signature(expiry)))
    }

    /// Verify a token: expiry first, then the signature.
    pub fn verify(&self, token: &str) -> Result<(), AuthError> {
        let (expiry, signature) = token.split_once('.').ok_or(AuthError::MalformedToken)?;
        let expiry: u64 = expiry.parse().map_err(|_| AuthError::MalformedToken)?;

        let current_time = now_secs();
        if current_time > expiry {
            return Err(AuthError::Expired {
                expired_at: expiry,
                current_time,
            });
        }

        let provided = hex::decode(signature).map_err(|_| AuthError::MalformedToken)?;
        let expected = self.compute_signature(expiry);

        if provided.ct_eq(&expected).into() {
            Ok(())
        } else {
            Err(AuthError::InvalidSignature)
        }
    }

    fn compute_signature(&self, expiry: u64) -> Vec<u8> {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret_key).expect("HMAC can take key of any size");
        mac.update(format!("{}:{}", TOKEN_CONTEXT, expiry).as_bytes());
        mac.finalize().into_bytes().to_vec()
    }

    /// Build the session cookie carrying a freshly issued token.
    pub fn session_cookie(&self) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE_NAME, self.issue()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .build()
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Whether a `next` target is a path on this site.
///
/// Rejects absolute and protocol-relative URLs so the login form cannot be
/// used as an open redirect.
pub fn is_safe_next(next: &str) -> bool {
    next.starts_with('/') && !next.starts_with("//") && !next.starts_with("/\\")
}

/// Whether an unauthenticated request should get JSON instead of a redirect.
fn wants_json(uri: &Uri, headers: &HeaderMap) -> bool {
    uri.path().starts_with("/api")
        || headers
            .get(header::ACCEPT)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|accept| accept.contains("application/json"))
}

/// Login URL that returns to `uri` after signing in.
fn login_redirect_target(uri: &Uri) -> String {
    let next = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    format!("/login?next={}", urlencoding::encode(next))
}

// =============================================================================
// Axum Middleware
// =============================================================================

/// Axum middleware guarding the gallery routes.
///
/// Requests with a valid session cookie pass through. Others get a JSON 401
/// when they target `/api` or accept JSON, and a redirect to the login page
/// otherwise.
///
/// # Example
///
/// ```ignore
/// use axum::{Router, middleware};
/// use bucket_gallery::server::auth::{SessionAuth, session_middleware};
///
/// let auth = SessionAuth::new("secret-key", Duration::from_secs(86400));
/// let app = Router::new()
///     .route("/", get(index_handler))
///     .layer(middleware::from_fn_with_state(auth, session_middleware));
/// ```
pub async fn session_middleware(
    State(auth): State<SessionAuth>,
    OriginalUri(original_uri): OriginalUri,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    let result = match jar.get(SESSION_COOKIE_NAME) {
        Some(cookie) => auth.verify(cookie.value()),
        None => Err(AuthError::MissingSession),
    };

    match result {
        Ok(()) => next.run(request).await,
        Err(e) if wants_json(&original_uri, request.headers()) => e.into_response(),
        Err(e) => {
            debug!(path = original_uri.path(), error = %e, "Redirecting to login");
            Redirect::to(&login_redirect_target(&original_uri)).into_response()
        }
    }
}

// =============================================================================
// Login / Logout Handlers
// =============================================================================

/// Query parameters for the login page.
#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    /// Where to go after a successful login
    #[serde(default)]
    pub next: Option<String>,
}

/// Login form body.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub password: String,
}

/// Render the login form.
///
/// # Endpoint
///
/// `GET /login?next={path}`
pub async fn login_page_handler(Query(query): Query<LoginQuery>) -> Html<String> {
    Html(login_page_html(None, query.next.as_deref()))
}

/// Check the submitted password.
///
/// # Endpoint
///
/// `POST /login?next={path}` with form field `password`
///
/// # Response
///
/// - `303 See Other` to `next` (when local) or `/`, with the session cookie
/// - `401 Unauthorized` with the form and "Invalid password"
/// - `503 Service Unavailable` with the form when no password is configured
pub async fn login_submit_handler(
    State(auth): State<SessionAuth>,
    Query(query): Query<LoginQuery>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let next = query.next.as_deref();

    if !auth.password_configured() {
        warn!("Login attempted but no viewer password is configured");
        let html = login_page_html(Some(NOT_CONFIGURED_MESSAGE), next);
        return (StatusCode::SERVICE_UNAVAILABLE, Html(html)).into_response();
    }

    if !auth.check_password(&form.password) {
        debug!("Login rejected: invalid password");
        let html = login_page_html(Some(INVALID_PASSWORD_MESSAGE), next);
        return (StatusCode::UNAUTHORIZED, Html(html)).into_response();
    }

    let redirect_to = next.filter(|n| is_safe_next(n)).unwrap_or("/");
    info!(redirect_to, "Viewer signed in");

    (jar.add(auth.session_cookie()), Redirect::to(redirect_to)).into_response()
}

/// Clear the session and return to the login page.
///
/// # Endpoint
///
/// `GET /logout`
pub async fn logout_handler(jar: CookieJar) -> (CookieJar, Redirect) {
    let cookie = Cookie::build((SESSION_COOKIE_NAME, "")).path("/").build();
    (jar.remove(cookie), Redirect::to("/login"))
}

// =============================================================================
// Tests
// =============================================================================
