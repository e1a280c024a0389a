//! Single-use email verification tokens.
//!
//! Only a SHA-256 digest of each token is kept. Tokens have no expiry timer; one
//! lives until it is consumed or the process restarts.

use moka::future::Cache;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::model::user::UserId;

#[derive(Clone)]
pub struct VerificationTokens {
    tokens: Cache<String, UserId>,
}

impl Default for VerificationTokens {
    fn default() -> Self {
        Self::new()
    }
}

impl VerificationTokens {
    pub fn new() -> Self {
        // no max_capacity / time_to_live: unbounded and never evicted
        Self {
            tokens: Cache::builder().build(),
        }
    }

    fn digest(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Returns the raw token to be delivered by email.
    pub async fn issue(&self, user: UserId) -> String {
        let token = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
        self.tokens.insert(Self::digest(&token), user).await;
        token
    }

    /// Removes the token and returns its owner; a second call with the same token fails.
    pub async fn consume(&self, token: &str) -> ApiResult<UserId> {
        self.tokens
            .remove(&Self::digest(token))
            .await
            .ok_or(ApiError::InvalidOrExpiredToken)
    }
}
