use crate::{
    auth::{
        AUTH_COOKIE,
        auth::AuthUser,
        jwt::generate_access_token,
        password::{hash_password, verify_password},
        verification::VerificationTokens,
    },
    config::Config,
    error::{ApiError, ApiResult},
    model::user::{User, UserId, UserPatch, UserRead},
    models::{
        DetailResponse, LoginReqDto, LoginResponse, RegisterReq, RequestVerifyReq, UserUpdate,
        VerifyQuery,
    },
    store::Store,
    utils::mailer::{EmailQueue, OutgoingEmail},
    validation::{email_address, required},
};
use actix_web::{
    HttpResponse,
    cookie::{Cookie, time::Duration},
    web,
};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

async fn send_verification(
    tokens: &VerificationTokens,
    mailer: &EmailQueue,
    config: &Config,
    user_id: UserId,
    email: &str,
) {
    let token = tokens.issue(user_id).await;
    mailer.enqueue(OutgoingEmail::verification(
        &config.email.frontend_url,
        email,
        &token,
    ));
}

/// Register a new account and send a verification email
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterReq,
    responses(
        (status = 200, description = "User registered", body = DetailResponse),
        (status = 400, description = "Missing fields, malformed email or user already exists", body = DetailResponse)
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_register", skip_all)]
pub async fn register(
    body: web::Json<RegisterReq>,
    store: web::Data<Store>,
    tokens: web::Data<VerificationTokens>,
    mailer: web::Data<EmailQueue>,
    config: web::Data<Config>,
) -> ApiResult<HttpResponse> {
    let email = required(body.email.as_deref(), "Email and password are required")?;
    let password = required(body.password.as_deref(), "Email and password are required")?;
    let email = email_address(email)?.to_string();
    let username = body
        .username
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty());

    let hashed = hash_password(password).map_err(|e| {
        error!(error = %e, "Failed to hash password");
        ApiError::Internal("Failed to register user".into())
    })?;

    let mut user = store.register_user(&email, username, hashed)?;
    info!(user_id = %user.id, "User registered");

    if config.superuser_email.as_deref() == Some(user.email.as_str()) {
        user = store.update_user(
            user.id,
            UserPatch {
                is_superuser: Some(true),
                ..UserPatch::default()
            },
        )?;
        warn!(user_id = %user.id, "Registered account granted superuser");
    }

    send_verification(&tokens, &mailer, &config, user.id, &user.email).await;

    Ok(HttpResponse::Ok().json(DetailResponse::new(
        "User registered successfully. Check your email to verify your account.",
    )))
}

/// Request a fresh verification email
#[utoipa::path(
    post,
    path = "/auth/request-verify",
    request_body = RequestVerifyReq,
    responses(
        (status = 200, description = "Verification requested", body = DetailResponse),
        (status = 400, description = "Missing email", body = DetailResponse)
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_request_verify", skip_all)]
pub async fn request_verify(
    body: web::Json<RequestVerifyReq>,
    store: web::Data<Store>,
    tokens: web::Data<VerificationTokens>,
    mailer: web::Data<EmailQueue>,
    config: web::Data<Config>,
) -> ApiResult<HttpResponse> {
    let email = required(body.email.as_deref(), "Email is required")?;

    // Same answer whether or not the account exists.
    match store.find_user_by_email(email) {
        Some(user) if user.is_active && !user.is_verified => {
            send_verification(&tokens, &mailer, &config, user.id, &user.email).await;
        }
        Some(_) => debug!("Verification not needed"),
        None => debug!("Verification requested for unknown email"),
    }

    Ok(HttpResponse::Ok().json(DetailResponse::new(
        "If the account exists and is not yet verified, a verification email has been sent.",
    )))
}

/// Consume a verification token
#[utoipa::path(
    get,
    path = "/auth/verify",
    params(VerifyQuery),
    responses(
        (status = 200, description = "Email verified", body = DetailResponse),
        (status = 400, description = "Invalid or expired token", body = DetailResponse)
    ),
    tag = "Auth"
)]
pub async fn verify(
    query: web::Query<VerifyQuery>,
    store: web::Data<Store>,
    tokens: web::Data<VerificationTokens>,
) -> ApiResult<HttpResponse> {
    let token = required(query.token.as_deref(), "Token is required")?;

    let user_id = tokens.consume(token).await?;
    let user = store.mark_verified(user_id)?;
    info!(user_id = %user.id, "Email verified");

    Ok(HttpResponse::Ok().json(DetailResponse::new("Email verified successfully")))
}

/// Log in and receive an access token (also set as the `auth` cookie)
#[utoipa::path(
    post,
    path = "/auth/jwt/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Missing fields", body = DetailResponse),
        (status = 401, description = "Bad credentials", body = DetailResponse)
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(store, config, user),
    fields(username = user.username.as_deref().unwrap_or_default())
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    store: web::Data<Store>,
    config: web::Data<Config>,
) -> ApiResult<HttpResponse> {
    info!("Login request received");

    let login = required(user.username.as_deref(), "Username or password required")?;
    let password = user
        .password
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Username or password required".into()))?;

    let bad_credentials = || ApiError::Unauthorized("LOGIN_BAD_CREDENTIALS".into());

    let db_user = store.find_user_by_login(login).ok_or_else(|| {
        info!("Invalid credentials: user not found");
        bad_credentials()
    })?;

    if let Err(e) = verify_password(password, &db_user.hashed_password) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return Err(bad_credentials());
    }
    if !db_user.is_active {
        info!(user_id = %db_user.id, "Login refused: inactive user");
        return Err(bad_credentials());
    }

    debug!("Generating access token");
    let access_token = generate_access_token(&db_user, &config.jwt_secret, config.access_token_ttl)
        .map_err(|e| {
            error!(error = %e, "Failed to sign access token");
            ApiError::Internal("Failed to issue token".into())
        })?;

    let cookie = Cookie::build(AUTH_COOKIE, access_token.clone())
        .path("/")
        .http_only(true)
        .max_age(Duration::seconds(config.access_token_ttl as i64))
        .finish();

    info!(user_id = %db_user.id, "Login successful");

    Ok(HttpResponse::Ok().cookie(cookie).json(LoginResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

/// Clear the `auth` cookie
#[utoipa::path(
    post,
    path = "/auth/jwt/logout",
    responses((status = 204, description = "Logged out")),
    tag = "Auth"
)]
pub async fn logout() -> HttpResponse {
    let mut cookie = Cookie::build(AUTH_COOKIE, "").path("/").finish();
    cookie.make_removal();
    HttpResponse::NoContent().cookie(cookie).finish()
}

/// Current user
#[utoipa::path(
    get,
    path = "/users/me",
    responses(
        (status = 200, description = "Authenticated user", body = UserRead),
        (status = 401, description = "Unauthorized", body = DetailResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn me(auth: AuthUser, store: web::Data<Store>) -> ApiResult<HttpResponse> {
    let user = current_user(&store, &auth)?;
    Ok(HttpResponse::Ok().json(UserRead::from(&user)))
}

/// Email, username and password changes shared by both update routes.
fn profile_patch(body: &UserUpdate, current: &User) -> ApiResult<UserPatch> {
    let email = body
        .email
        .as_deref()
        .map(|raw| email_address(raw).map(|addr| addr.to_string().to_lowercase()))
        .transpose()?;
    let email_changed = email.as_deref().is_some_and(|e| e != current.email);

    let hashed_password = match body.password.as_deref() {
        Some(p) if p.trim().is_empty() => {
            return Err(ApiError::BadRequest("Password must not be blank".into()));
        }
        Some(p) => Some(hash_password(p).map_err(|e| {
            error!(error = %e, "Failed to hash password");
            ApiError::Internal("Failed to update user".into())
        })?),
        None => None,
    };

    Ok(UserPatch {
        email,
        username: body
            .username
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string),
        hashed_password,
        // a new address has to be verified again
        is_verified: email_changed.then_some(false),
        ..UserPatch::default()
    })
}

fn current_user(store: &Store, auth: &AuthUser) -> ApiResult<User> {
    store
        .user(auth.user_id)
        .ok_or_else(|| ApiError::Unauthorized("Unknown user".into()))
}

fn require_superuser(store: &Store, auth: &AuthUser) -> ApiResult<User> {
    let user = current_user(store, auth)?;
    if !user.is_superuser {
        info!(user_id = %user.id, "Superuser route refused");
        return Err(ApiError::Forbidden("Forbidden".into()));
    }
    Ok(user)
}

/// Update the current user's email, username or password
#[utoipa::path(
    patch,
    path = "/users/me",
    request_body = UserUpdate,
    responses(
        (status = 200, description = "Updated user", body = UserRead),
        (status = 400, description = "Invalid field or email already taken", body = DetailResponse),
        (status = 401, description = "Unauthorized", body = DetailResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(name = "users_update_me", skip_all, fields(user_id = %auth.user_id))]
pub async fn update_me(
    auth: AuthUser,
    body: web::Json<UserUpdate>,
    store: web::Data<Store>,
) -> ApiResult<HttpResponse> {
    let current = current_user(&store, &auth)?;
    let user = store.update_user(current.id, profile_patch(&body, &current)?)?;
    info!("User updated own profile");
    Ok(HttpResponse::Ok().json(UserRead::from(&user)))
}

/// Fetch any user (superuser only)
#[utoipa::path(
    get,
    path = "/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = UserRead),
        (status = 401, description = "Unauthorized", body = DetailResponse),
        (status = 403, description = "Not a superuser", body = DetailResponse),
        (status = 404, description = "User not found", body = DetailResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn get_user(
    auth: AuthUser,
    path: web::Path<Uuid>,
    store: web::Data<Store>,
) -> ApiResult<HttpResponse> {
    require_superuser(&store, &auth)?;
    let user = store
        .user(UserId(path.into_inner()))
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(HttpResponse::Ok().json(UserRead::from(&user)))
}

/// Update any user, including the `is_*` flags (superuser only)
#[utoipa::path(
    patch,
    path = "/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = UserUpdate,
    responses(
        (status = 200, description = "Updated user", body = UserRead),
        (status = 400, description = "Invalid field or email already taken", body = DetailResponse),
        (status = 401, description = "Unauthorized", body = DetailResponse),
        (status = 403, description = "Not a superuser", body = DetailResponse),
        (status = 404, description = "User not found", body = DetailResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(name = "users_update", skip_all, fields(by = %auth.user_id))]
pub async fn update_user(
    auth: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<UserUpdate>,
    store: web::Data<Store>,
) -> ApiResult<HttpResponse> {
    require_superuser(&store, &auth)?;
    let target = store
        .user(UserId(path.into_inner()))
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let mut patch = profile_patch(&body, &target)?;
    patch.is_active = body.is_active;
    patch.is_superuser = body.is_superuser;
    if body.is_verified.is_some() {
        patch.is_verified = body.is_verified;
    }

    let user = store.update_user(target.id, patch)?;
    info!(user_id = %user.id, "User updated by superuser");
    Ok(HttpResponse::Ok().json(UserRead::from(&user)))
}

/// Delete any user and the records they own (superuser only)
#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 401, description = "Unauthorized", body = DetailResponse),
        (status = 403, description = "Not a superuser", body = DetailResponse),
        (status = 404, description = "User not found", body = DetailResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn delete_user(
    auth: AuthUser,
    path: web::Path<Uuid>,
    store: web::Data<Store>,
) -> ApiResult<HttpResponse> {
    require_superuser(&store, &auth)?;
    let id = UserId(path.into_inner());
    store.delete_user(id)?;
    info!(user_id = %id, by = %auth.user_id, "User deleted");
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use crate::api::test_support::{TestApp, init_app};
    use crate::config::Config;
    use crate::model::user::{UserId, UserPatch};
    use crate::utils::mailer::{EmailError, EmailTransport, OutgoingEmail};
    use actix_web::{http::StatusCode, test};
    use futures::future::BoxFuture;
    use serde_json::{Value, json};
    use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

    struct Capture(UnboundedSender<OutgoingEmail>);

    impl EmailTransport for Capture {
        fn send<'a>(&'a self, email: &'a OutgoingEmail) -> BoxFuture<'a, Result<(), EmailError>> {
            Box::pin(async move {
                self.0
                    .send(email.clone())
                    .map_err(|e| EmailError::Send(e.to_string()))
            })
        }
    }

    struct AlwaysFails;

    impl EmailTransport for AlwaysFails {
        fn send<'a>(&'a self, _: &'a OutgoingEmail) -> BoxFuture<'a, Result<(), EmailError>> {
            Box::pin(async { Err(EmailError::Send("smtp down".into())) })
        }
    }

    fn capturing_app() -> (TestApp, UnboundedReceiver<OutgoingEmail>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (TestApp::with_transport(Arc::new(Capture(tx))), rx)
    }

    async fn next_token(outbox: &mut UnboundedReceiver<OutgoingEmail>) -> String {
        let email = tokio::time::timeout(Duration::from_secs(5), outbox.recv())
            .await
            .unwrap()
            .unwrap();
        email
            .body
            .split("token=")
            .nth(1)
            .and_then(|rest| rest.split_whitespace().next())
            .unwrap()
            .to_string()
    }

    fn register_req(body: Value) -> test::TestRequest {
        test::TestRequest::post().uri("/auth/register").set_json(body)
    }

    #[actix_web::test]
    async fn register_then_verify_once() {
        let (app, mut outbox) = capturing_app();
        let svc = init_app!(app);

        let resp = test::call_service(
            &svc,
            register_req(json!({"email": "jane@example.com", "password": "pw"})).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["detail"].is_string());

        let token = next_token(&mut outbox).await;
        let uri = format!("/auth/verify?token={token}");

        let resp = test::call_service(&svc, test::TestRequest::get().uri(&uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(
            app.store
                .find_user_by_email("jane@example.com")
                .unwrap()
                .is_verified
        );

        let resp = test::call_service(&svc, test::TestRequest::get().uri(&uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], "INVALID_OR_EXPIRED_TOKEN");
    }

    #[actix_web::test]
    async fn register_rejects_missing_fields_and_duplicates() {
        let app = TestApp::new();
        let svc = init_app!(app);

        for body in [
            json!({"email": "jane@example.com"}),
            json!({"password": "pw"}),
            json!({"email": "  ", "password": "pw"}),
        ] {
            let resp = test::call_service(&svc, register_req(body).to_request()).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        }

        let body = json!({"email": "jane@example.com", "password": "pw", "username": "jane"});
        let resp = test::call_service(&svc, register_req(body.clone()).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = test::call_service(&svc, register_req(body).to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], "ALREADY_EXISTS");
    }

    #[actix_web::test]
    async fn email_failure_does_not_fail_registration() {
        let app = TestApp::with_transport(Arc::new(AlwaysFails));
        let svc = init_app!(app);

        let resp = test::call_service(
            &svc,
            register_req(json!({"email": "jane@example.com", "password": "pw"})).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn request_verify_issues_a_fresh_token() {
        let (app, mut outbox) = capturing_app();
        let svc = init_app!(app);

        test::call_service(
            &svc,
            register_req(json!({"email": "jane@example.com", "password": "pw"})).to_request(),
        )
        .await;
        let _registration_token = next_token(&mut outbox).await;

        let resp = test::call_service(
            &svc,
            test::TestRequest::post()
                .uri("/auth/request-verify")
                .set_json(json!({"email": "jane@example.com"}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let token = next_token(&mut outbox).await;
        let resp = test::call_service(
            &svc,
            test::TestRequest::get()
                .uri(&format!("/auth/verify?token={token}"))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn request_verify_requires_email() {
        let app = TestApp::new();
        let svc = init_app!(app);
        let resp = test::call_service(
            &svc,
            test::TestRequest::post()
                .uri("/auth/request-verify")
                .set_json(json!({}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        // unknown address: same answer as a known one
        let resp = test::call_service(
            &svc,
            test::TestRequest::post()
                .uri("/auth/request-verify")
                .set_json(json!({"email": "nobody@example.com"}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn unknown_verification_token_is_rejected() {
        let app = TestApp::new();
        let svc = init_app!(app);
        let resp = test::call_service(
            &svc,
            test::TestRequest::get().uri("/auth/verify?token=nope").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], "INVALID_OR_EXPIRED_TOKEN");
    }

    #[actix_web::test]
    async fn login_issues_token_and_cookie() {
        let app = TestApp::new();
        let svc = init_app!(app);

        test::call_service(
            &svc,
            register_req(json!({"email": "jane@example.com", "password": "pw", "username": "jane"}))
                .to_request(),
        )
        .await;

        let resp = test::call_service(
            &svc,
            test::TestRequest::post()
                .uri("/auth/jwt/login")
                .set_json(json!({"username": "jane", "password": "wrong"}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = test::call_service(
            &svc,
            test::TestRequest::post()
                .uri("/auth/jwt/login")
                .set_json(json!({"username": "jane@example.com", "password": "pw"}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let cookie = resp
            .response()
            .cookies()
            .find(|c| c.name() == crate::auth::AUTH_COOKIE)
            .map(|c| c.value().to_string())
            .unwrap();
        let body: Value = test::read_body_json(resp).await;
        let token = body["access_token"].as_str().unwrap().to_string();
        assert_eq!(cookie, token);

        let resp = test::call_service(&svc, app.get("/users/me", &token).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let me: Value = test::read_body_json(resp).await;
        assert_eq!(me["email"], "jane@example.com");
        assert_eq!(me["username"], "jane");
        assert!(me.get("hashed_password").is_none());

        let resp = test::call_service(
            &svc,
            test::TestRequest::get()
                .uri("/departments")
                .cookie(actix_web::cookie::Cookie::new(crate::auth::AUTH_COOKIE, token))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn logout_clears_cookie() {
        let app = TestApp::new();
        let svc = init_app!(app);
        let resp = test::call_service(
            &svc,
            test::TestRequest::post().uri("/auth/jwt/logout").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        let cleared = resp
            .response()
            .cookies()
            .find(|c| c.name() == crate::auth::AUTH_COOKIE)
            .unwrap();
        assert_eq!(cleared.value(), "");
    }

    #[actix_web::test]
    async fn register_rejects_malformed_email() {
        let app = TestApp::new();
        let svc = init_app!(app);
        let resp = test::call_service(
            &svc,
            register_req(json!({"email": "not-an-email", "password": "pw"})).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["detail"], "Invalid email address");
        assert!(app.store.find_user_by_email("not-an-email").is_none());
    }

    #[actix_web::test]
    async fn configured_address_registers_as_superuser() {
        let app = TestApp::with_config(Config {
            superuser_email: Some("root@example.com".into()),
            ..Config::for_tests()
        });
        let svc = init_app!(app);
        for email in ["Root@Example.com", "jane@example.com"] {
            let resp = test::call_service(
                &svc,
                register_req(json!({"email": email, "password": "pw"})).to_request(),
            )
            .await;
            assert_eq!(resp.status(), StatusCode::OK);
        }
        assert!(app.store.find_user_by_email("root@example.com").unwrap().is_superuser);
        assert!(!app.store.find_user_by_email("jane@example.com").unwrap().is_superuser);
    }

    #[actix_web::test]
    async fn update_me_changes_profile_but_not_flags() {
        let app = TestApp::new();
        let svc = init_app!(app);
        let (jane, token) = app.user_with_token("jane@example.com");
        app.user_with_token("bob@example.com");
        app.store.mark_verified(jane.id).unwrap();

        let resp = test::call_service(
            &svc,
            app.patch("/users/me", &token)
                .set_json(json!({
                    "email": "jane.doe@example.com",
                    "username": "janie",
                    "is_superuser": true,
                    "is_active": false
                }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let me: Value = test::read_body_json(resp).await;
        assert_eq!(me["email"], "jane.doe@example.com");
        assert_eq!(me["username"], "janie");
        assert_eq!(me["is_superuser"], false);
        assert_eq!(me["is_active"], true);
        assert_eq!(me["is_verified"], false);

        for (body, code) in [
            (json!({"email": "bob@example.com"}), "ALREADY_EXISTS"),
            (json!({"email": "nope"}), "BAD_REQUEST"),
            (json!({"password": "  "}), "BAD_REQUEST"),
        ] {
            let resp = test::call_service(
                &svc,
                app.patch("/users/me", &token).set_json(body).to_request(),
            )
            .await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            let err: Value = test::read_body_json(resp).await;
            assert_eq!(err["code"], code);
        }
    }

    #[actix_web::test]
    async fn password_change_applies_to_login() {
        let app = TestApp::new();
        let svc = init_app!(app);
        let token = app.login_as("jane@example.com");

        let resp = test::call_service(
            &svc,
            app.patch("/users/me", &token)
                .set_json(json!({"password": "new-pass"}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = test::call_service(
            &svc,
            test::TestRequest::post()
                .uri("/auth/jwt/login")
                .set_json(json!({"username": "jane@example.com", "password": "new-pass"}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn user_admin_routes_require_superuser() {
        let app = TestApp::new();
        let svc = init_app!(app);
        let (_, plain_token) = app.user_with_token("jane@example.com");
        let (bob, _) = app.user_with_token("bob@example.com");
        let uri = format!("/users/{}", bob.id);

        let resp = test::call_service(&svc, app.get(&uri, &plain_token).to_request()).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let err: Value = test::read_body_json(resp).await;
        assert_eq!(err["code"], "FORBIDDEN");

        for req in [
            app.patch(&uri, &plain_token).set_json(json!({"is_active": false})),
            app.delete(&uri, &plain_token),
        ] {
            let resp = test::call_service(&svc, req.to_request()).await;
            assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        }
        assert!(app.store.user(bob.id).unwrap().is_active);
    }

    #[actix_web::test]
    async fn superuser_manages_other_accounts() {
        let app = TestApp::new();
        let svc = init_app!(app);
        let (admin, admin_token) = app.user_with_token("root@example.com");
        app.store
            .update_user(
                admin.id,
                UserPatch {
                    is_superuser: Some(true),
                    ..UserPatch::default()
                },
            )
            .unwrap();
        let (bob, bob_token) = app.user_with_token("bob@example.com");
        let uri = format!("/users/{}", bob.id);

        let resp = test::call_service(&svc, app.get(&uri, &admin_token).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["email"], "bob@example.com");

        let missing = format!("/users/{}", UserId::new());
        let resp = test::call_service(&svc, app.get(&missing, &admin_token).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let resp =
            test::call_service(&svc, app.get("/users/not-a-uuid", &admin_token).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = test::call_service(
            &svc,
            app.patch(&uri, &admin_token)
                .set_json(json!({"is_active": false, "is_verified": true}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["is_active"], false);
        assert_eq!(body["is_verified"], true);

        // deactivated accounts lose access immediately
        let resp = test::call_service(&svc, app.get("/users/me", &bob_token).to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = test::call_service(&svc, app.delete(&uri, &admin_token).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        let resp = test::call_service(&svc, app.delete(&uri, &admin_token).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(app.store.user(bob.id).is_none());
    }
}
