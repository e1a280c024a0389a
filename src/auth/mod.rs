pub mod auth;
pub mod handlers;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod verification;

/// Cookie carrying the access token for browser clients.
pub const AUTH_COOKIE: &str = "auth";
