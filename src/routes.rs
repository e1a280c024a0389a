use crate::{
    api::{cash, department, employee, report, session, upload},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
    error::ApiError,
};
use actix_cors::Cors;
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::{
    Error, HttpRequest, HttpResponse, Responder,
    error::{JsonPayloadError, PathError, QueryPayloadError},
    middleware::{Condition, from_fn},
    web,
};
use serde_json::json;

/// Per-IP limiter allowing `requests_per_min`, bursting up to the same amount.
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / u64::from(requests_per_min)).max(1);
    let cfg: GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware> = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_default();
    Governor::new(&cfg)
}

/// Cross-origin access for the browser frontend, cookies included.
pub fn cors(config: &Config) -> Cors {
    let origin = config.email.frontend_url.trim_end_matches('/');
    let cors = if origin == "*" {
        Cors::default().allow_any_origin()
    } else {
        Cors::default().allowed_origin(origin)
    };
    cors.allowed_methods(["GET", "POST", "PATCH", "DELETE", "OPTIONS"])
        .allow_any_header()
        .supports_credentials()
        .max_age(3600)
}

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> Error {
    match err {
        JsonPayloadError::Deserialize(e) => {
            ApiError::InvalidArgument(format!("Invalid request body: {e}")).into()
        }
        other => ApiError::BadRequest(other.to_string()).into(),
    }
}

fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> Error {
    ApiError::BadRequest(err.to_string()).into()
}

fn path_error(_err: PathError, _req: &HttpRequest) -> Error {
    ApiError::NotFound("Not found".into()).into()
}

async fn index() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "message": "Welcome to the Business Data Tracker API!"
    }))
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    let limited = |requests_per_min: u32| {
        Condition::new(config.rate_limit_enabled, build_limiter(requests_per_min))
    };

    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .app_data(web::QueryConfig::default().error_handler(query_error))
        .app_data(web::PathConfig::default().error_handler(path_error));

    // Public routes
    cfg.service(web::resource("/").route(web::get().to(index)))
        .service(web::resource("/uploaded-data").route(web::get().to(upload::uploaded_data)))
        .service(
            web::scope("/auth")
                .service(
                    web::resource("/register")
                        .wrap(limited(config.rate_register_per_min))
                        .route(web::post().to(handlers::register)),
                )
                .service(
                    web::resource("/request-verify")
                        .wrap(limited(config.rate_verify_per_min))
                        .route(web::post().to(handlers::request_verify)),
                )
                .service(
                    web::resource("/verify")
                        .wrap(limited(config.rate_verify_per_min))
                        .route(web::get().to(handlers::verify)),
                )
                .service(
                    web::resource("/jwt/login")
                        .wrap(limited(config.rate_login_per_min))
                        .route(web::post().to(handlers::login)),
                )
                .service(web::resource("/jwt/logout").route(web::post().to(handlers::logout))),
        );

    // Protected routes. Registered last: the empty scope matches every remaining path.
    cfg.service(
        web::scope("")
            .wrap(from_fn(auth_middleware))
            .service(
                web::resource("/users/me")
                    .route(web::get().to(handlers::me))
                    .route(web::patch().to(handlers::update_me)),
            )
            .service(
                web::resource("/users/{id}")
                    .route(web::get().to(handlers::get_user))
                    .route(web::patch().to(handlers::update_user))
                    .route(web::delete().to(handlers::delete_user)),
            )
            .service(
                web::resource("/departments")
                    .route(web::post().to(department::create_department))
                    .route(web::get().to(department::list_departments)),
            )
            .service(
                web::resource("/employees")
                    .route(web::post().to(employee::create_employee))
                    .route(web::get().to(employee::list_employees)),
            )
            .service(web::resource("/sessions").route(web::post().to(session::create_session)))
            .service(
                web::resource("/sessions/aggregate")
                    .route(web::get().to(session::session_aggregate)),
            )
            .service(
                web::scope("/cash")
                    .service(
                        web::resource("/transaction").route(web::post().to(cash::add_transaction)),
                    )
                    .service(web::resource("/summary").route(web::get().to(cash::summary)))
                    .service(web::resource("/summary/pdf").route(web::get().to(cash::summary_pdf))),
            )
            .service(web::resource("/export/pdf").route(web::get().to(report::export_pdf)))
            .service(web::resource("/upload-data").route(web::post().to(upload::upload_data))),
    );
}
