use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Fields are optional so blank and missing input get the same 400 detail.
#[derive(Deserialize, ToSchema)]
pub struct RegisterReq {
    #[schema(example = "jane@example.com")]
    pub email: Option<String>,
    #[schema(example = "s3cret-pass")]
    pub password: Option<String>,
    #[schema(example = "jane", nullable = true)]
    pub username: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginReqDto {
    /// Account email or username.
    #[schema(example = "jane@example.com")]
    pub username: Option<String>,
    #[schema(example = "s3cret-pass")]
    pub password: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct RequestVerifyReq {
    #[schema(example = "jane@example.com")]
    pub email: Option<String>,
}

#[derive(Deserialize, IntoParams)]
pub struct VerifyQuery {
    /// Token delivered by email.
    pub token: Option<String>,
}

/// Partial update. On `/users/me` the `is_*` flags are ignored.
#[derive(Deserialize, ToSchema)]
pub struct UserUpdate {
    #[schema(example = "jane@example.com")]
    pub email: Option<String>,
    #[schema(example = "jane")]
    pub username: Option<String>,
    pub password: Option<String>,
    pub is_active: Option<bool>,
    pub is_superuser: Option<bool>,
    pub is_verified: Option<bool>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct DetailResponse {
    pub detail: String,
}

impl DetailResponse {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    #[schema(example = "bearer")]
    pub token_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub email: String,
    pub exp: usize,
    pub jti: String,
}
