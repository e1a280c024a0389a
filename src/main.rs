use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer};

mod aggregate;
mod api;
mod auth;
mod config;
mod docs;
mod error;
mod model;
mod models;
mod report;
mod routes;
mod store;
mod utils;
mod validation;

use config::Config;

use crate::auth::verification::VerificationTokens;
use crate::docs::ApiDoc;
use crate::store::Store;
use crate::utils::mailer::{EmailQueue, transport_from_config};
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let level = config
        .log_level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::DEBUG);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(level)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let transport = transport_from_config(&config.email)?;
    let mailer = Data::new(EmailQueue::start(transport, config.email.queue_capacity));
    let store = Data::new(Store::new());
    let tokens = Data::new(VerificationTokens::new());

    let server_addr = config.server_addr.clone();
    let config_data = Data::new(config);

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .wrap(routes::cors(&config_data))
            .service(
                // wildcard {_:.*} matches the UI's JS/CSS assets
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(config_data.clone())
            .app_data(store.clone())
            .app_data(tokens.clone())
            .app_data(mailer.clone())
            .configure(|cfg| routes::configure(cfg, &config_data))
    })
    .bind(&server_addr)?
    .run()
    .await?;

    Ok(())
}
