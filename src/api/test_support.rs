//! Shared fixtures for HTTP handler tests.

use std::sync::Arc;

use actix_web::{
    http::header::AUTHORIZATION,
    test::TestRequest,
    web::{self, Data},
};

use crate::{
    auth::{jwt::generate_access_token, verification::VerificationTokens},
    config::Config,
    model::user::User,
    routes,
    store::Store,
    utils::mailer::{EmailQueue, EmailTransport, LogTransport},
};

/// Builds a service wired exactly like production, around a fresh store.
macro_rules! init_app {
    ($app:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap($crate::routes::cors(&$app.config))
                .configure(|cfg| $app.configure(cfg)),
        )
        .await
    };
}
pub(crate) use init_app;

pub struct TestApp {
    pub config: Data<Config>,
    pub store: Data<Store>,
    pub tokens: Data<VerificationTokens>,
    pub mailer: Data<EmailQueue>,
}

impl TestApp {
    /// Must run inside the actix test runtime: it spawns the mail worker.
    pub fn new() -> Self {
        Self::with_transport(Arc::new(LogTransport))
    }

    pub fn with_transport(transport: Arc<dyn EmailTransport>) -> Self {
        Self::build(Config::for_tests(), transport)
    }

    pub fn with_config(config: Config) -> Self {
        Self::build(config, Arc::new(LogTransport))
    }

    fn build(config: Config, transport: Arc<dyn EmailTransport>) -> Self {
        Self {
            config: Data::new(config),
            store: Data::new(Store::new()),
            tokens: Data::new(VerificationTokens::new()),
            mailer: Data::new(EmailQueue::start(transport, 16)),
        }
    }

    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.config.clone())
            .app_data(self.store.clone())
            .app_data(self.tokens.clone())
            .app_data(self.mailer.clone());
        routes::configure(cfg, &self.config);
    }

    /// Registers a user directly in the store and returns a valid access token.
    pub fn login_as(&self, email: &str) -> String {
        self.user_with_token(email).1
    }

    /// Registers a user directly in the store and returns it with a valid access token.
    pub fn user_with_token(&self, email: &str) -> (User, String) {
        let user = self
            .store
            .register_user(email, None, "not-a-real-hash".into())
            .unwrap();
        let token =
            generate_access_token(&user, &self.config.jwt_secret, self.config.access_token_ttl)
                .unwrap();
        (user, token)
    }

    pub fn get(&self, uri: &str, token: &str) -> TestRequest {
        TestRequest::get()
            .uri(uri)
            .insert_header((AUTHORIZATION, format!("Bearer {token}")))
    }

    pub fn post(&self, uri: &str, token: &str) -> TestRequest {
        TestRequest::post()
            .uri(uri)
            .insert_header((AUTHORIZATION, format!("Bearer {token}")))
    }

    pub fn patch(&self, uri: &str, token: &str) -> TestRequest {
        TestRequest::patch()
            .uri(uri)
            .insert_header((AUTHORIZATION, format!("Bearer {token}")))
    }

    pub fn delete(&self, uri: &str, token: &str) -> TestRequest {
        TestRequest::delete()
            .uri(uri)
            .insert_header((AUTHORIZATION, format!("Bearer {token}")))
    }
}
