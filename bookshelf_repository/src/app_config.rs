use actix_web::error::InternalError;
use actix_web::HttpResponse;
use paperclip::actix::web;

use crate::api::MessageResponse;
use crate::handlers;

/// Path of the generated OpenAPI v2 document
pub const API_SPEC_PATH: &str = "/apispec/v2";

pub fn config_app(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/health").route(web::get().to(handlers::health)))
        .service(
            web::scope("/api")
                .service(
                    web::resource("/create_books").route(web::post().to(handlers::create_book)),
                )
                .service(web::resource("/books").route(web::get().to(handlers::get_all_books)))
                // id may be empty here, handlers answer that case themselves
                .service(
                    web::resource("/get_books/{id:[^/]*}")
                        .route(web::get().to(handlers::get_book)),
                )
                .service(
                    web::resource("/delete_book/{id:[^/]*}")
                        .route(web::delete().to(handlers::delete_book)),
                ),
        );
}

/// Body that cannot be parsed into a book is rejected with 422
pub fn json_config() -> actix_web::web::JsonConfig {
    actix_web::web::JsonConfig::default().error_handler(|err, _req| {
        tracing::warn!("Failed to parse request body: {}", err);
        InternalError::from_response(
            err,
            HttpResponse::UnprocessableEntity()
                .json(MessageResponse::new(handlers::REQUEST_FAILED)),
        )
        .into()
    })
}
