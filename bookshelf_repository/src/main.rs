use std::sync::Arc;

use actix_web::{App, HttpServer};
use anyhow::Context;
use paperclip::actix::{web, OpenApiExt};
use tracing_actix_web::TracingLogger;

use bookshelf_repository::app_config::{config_app, json_config, API_SPEC_PATH};
use bookshelf_repository::books_repository::{
    BookRepository, InMemoryBookRepository, PostgresBooksRepository,
};
use bookshelf_repository::settings::Settings;
use bookshelf_repository::telemetry::{init_telemetry, shutdown_telemetry};

const APP_NAME: &str = "bookshelf_repository";

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    init_telemetry(APP_NAME)?;

    let books_repository: Arc<dyn BookRepository> = if settings.use_in_memory_db {
        tracing::info!("Using in memory books repository");
        Arc::new(InMemoryBookRepository::default())
    } else {
        Arc::new(
            PostgresBooksRepository::init(settings.postgres_config()?)
                .await
                .context("Failed to init postgres")?,
        )
    };

    tracing::info!(
        "starting HTTP server at http://{}:{}",
        settings.server_host,
        settings.server_port
    );

    HttpServer::new(move || {
        App::new()
            .wrap_api()
            .app_data(web::Data::new(books_repository.clone()))
            .app_data(json_config())
            .wrap(TracingLogger::default())
            .configure(config_app)
            .with_json_spec_at(API_SPEC_PATH)
            .build()
    })
    .bind((settings.server_host.as_str(), settings.server_port))
    .context("Failed to bind server address")?
    .run()
    .await
    .context("Server failed")?;

    shutdown_telemetry();
    Ok(())
}
