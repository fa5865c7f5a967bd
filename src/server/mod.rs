//! HTTP server layer for Bucket Gallery.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │        GET /   GET /api/images   GET /api/image/{*name}         │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌───────────┐  ┌──────────┐  │
//! │  │  handlers   │  │    auth     │  │   pages   │  │  routes  │  │
//! │  │ (requests)  │  │ (sessions)  │  │  (HTML)   │  │ (router) │  │
//! │  └─────────────┘  └─────────────┘  └───────────┘  └──────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod handlers;
pub mod pages;
pub mod routes;

pub use auth::{
    is_safe_next, session_middleware, AuthError, SessionAuth, SESSION_COOKIE_NAME,
};
pub use handlers::{
    health_handler, AppState, ErrorResponse, HealthResponse, ImageError, PageQueryParams,
    RefreshResponse,
};
pub use routes::{create_router, RouterConfig};
