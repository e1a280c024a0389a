use actix_web::{
    Error, HttpMessage, ResponseError,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    http::header::{AUTHORIZATION, HeaderMap},
    middleware::Next,
    web::Data,
};
use tracing::debug;
use uuid::Uuid;

use crate::auth::{AUTH_COOKIE, auth::AuthUser, jwt::verify_token};
use crate::config::Config;
use crate::error::ApiError;
use crate::model::user::UserId;
use crate::store::Store;

/// Bearer header wins over the cookie when both are present.
fn credential(headers: &HeaderMap, cookie: Option<String>) -> Result<String, ApiError> {
    if let Some(value) = headers.get(AUTHORIZATION) {
        let value = value
            .to_str()
            .map_err(|_| ApiError::Unauthorized("Invalid Authorization header encoding".into()))?;
        return value
            .strip_prefix("Bearer ")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                ApiError::Unauthorized("Authorization header must start with Bearer".into())
            });
    }

    cookie
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".into()))
}

pub fn resolve_identity(
    headers: &HeaderMap,
    cookie: Option<String>,
    config: &Config,
    store: &Store,
) -> Result<AuthUser, ApiError> {
    let token = credential(headers, cookie)?;

    let claims = verify_token(&token, &config.jwt_secret).map_err(|e| {
        debug!(error = %e, "Rejected access token");
        ApiError::Unauthorized("Invalid or expired token".into())
    })?;

    let user_id = Uuid::parse_str(&claims.sub)
        .map(UserId)
        .map_err(|_| ApiError::Unauthorized("Invalid token subject".into()))?;

    match store.user(user_id) {
        Some(user) if user.is_active => Ok(AuthUser {
            user_id: user.id,
            email: user.email,
        }),
        Some(_) => Err(ApiError::Unauthorized("Inactive user".into())),
        None => Err(ApiError::Unauthorized("Unknown user".into())),
    }
}

/// Rejects anonymous requests before they reach a handler and attaches `AuthUser` otherwise.
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| ApiError::Internal("App config missing".into()))?;
    let store = req
        .app_data::<Data<Store>>()
        .ok_or_else(|| ApiError::Internal("Store missing".into()))?;

    let cookie = req.cookie(AUTH_COOKIE).map(|c| c.value().to_string());

    match resolve_identity(req.headers(), cookie, config, store) {
        Ok(auth_user) => {
            req.extensions_mut().insert(auth_user);
            next.call(req).await
        }
        Err(e) => {
            let resp = e.error_response();
            Ok(req.into_response(resp))
        }
    }
}
