use std::sync::Arc;

use actix_web::web::Data;
use actix_web::Error;
use actix_web::HttpResponse;
use paperclip::actix::{
    api_v2_operation,
    web::{self},
};

use crate::api::{Book, BookId, BookListResponse, BookResponse, MessageResponse};
use crate::books_repository::{BookRepository, BookRepositoryError};

const BOOK_ADDED: &str = "book has been added";
pub(crate) const REQUEST_FAILED: &str = "request failed";
const COULD_NOT_CREATE_BOOK: &str = "could not create book";
const BOOKS_FETCHED: &str = "books fetched successfully";
const COULD_NOT_GET_BOOKS: &str = "could not get books";
const ID_CANNOT_BE_EMPTY: &str = "id cannot be empty";
const BOOK_FETCHED: &str = "book id fetched successfully";
const COULD_NOT_GET_BOOK: &str = "could not get the book";
const BOOK_DELETED: &str = "book deleted successfully";
const COULD_NOT_DELETE_BOOK: &str = "could not delete book";

/// Empty id is answered with 500, id that is not a number with 400
fn parse_book_id(raw_id: &str, failure_message: &str) -> Result<BookId, HttpResponse> {
    if raw_id.is_empty() {
        return Err(
            HttpResponse::InternalServerError().json(MessageResponse::new(ID_CANNOT_BE_EMPTY))
        );
    }
    raw_id.parse().map_err(|err| {
        tracing::warn!("Invalid book id {:?}: {}", raw_id, err);
        HttpResponse::BadRequest().json(MessageResponse::new(failure_message))
    })
}

#[api_v2_operation]
pub async fn health() -> Result<HttpResponse, Error> {
    Ok(HttpResponse::Ok().finish())
}

#[api_v2_operation]
pub async fn create_book(
    books_repository: Data<Arc<dyn BookRepository>>,
    book: web::Json<Book>,
) -> Result<HttpResponse, Error> {
    Ok(match books_repository.add_book(book.into_inner()).await {
        Ok(book_id) => {
            tracing::info!("Added book {}", book_id);
            HttpResponse::Ok().json(MessageResponse::new(BOOK_ADDED))
        }
        Err(err) => {
            tracing::error!("Add book failed {}", err);
            HttpResponse::BadRequest().json(MessageResponse::new(COULD_NOT_CREATE_BOOK))
        }
    })
}

#[api_v2_operation]
pub async fn get_all_books(
    books_repository: Data<Arc<dyn BookRepository>>,
) -> Result<HttpResponse, Error> {
    Ok(match books_repository.list_books().await {
        Ok(books) => HttpResponse::Ok().json(BookListResponse {
            message: BOOKS_FETCHED.to_string(),
            data: books,
        }),
        Err(err) => {
            tracing::error!("Get all books failed {}", err);
            HttpResponse::BadRequest().json(MessageResponse::new(COULD_NOT_GET_BOOKS))
        }
    })
}

#[api_v2_operation]
pub async fn get_book(
    books_repository: Data<Arc<dyn BookRepository>>,
    book_id: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let book_id = match parse_book_id(&book_id, COULD_NOT_GET_BOOK) {
        Ok(book_id) => book_id,
        Err(response) => return Ok(response),
    };

    Ok(match books_repository.get_book(book_id).await {
        Ok(book) => HttpResponse::Ok().json(BookResponse {
            message: BOOK_FETCHED.to_string(),
            data: book,
        }),
        Err(BookRepositoryError::NotFound(_)) => {
            tracing::info!("Book {} not found", book_id);
            HttpResponse::BadRequest().json(MessageResponse::new(COULD_NOT_GET_BOOK))
        }
        Err(err) => {
            tracing::error!("Get book failed {}", err);
            HttpResponse::BadRequest().json(MessageResponse::new(COULD_NOT_GET_BOOK))
        }
    })
}

#[api_v2_operation]
pub async fn delete_book(
    books_repository: Data<Arc<dyn BookRepository>>,
    book_id: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let book_id = match parse_book_id(&book_id, COULD_NOT_DELETE_BOOK) {
        Ok(book_id) => book_id,
        Err(response) => return Ok(response),
    };

    Ok(match books_repository.delete_book(book_id).await {
        Ok(deleted) => {
            if !deleted {
                tracing::info!("Book {} was not present, nothing deleted", book_id);
            }
            HttpResponse::Ok().json(MessageResponse::new(BOOK_DELETED))
        }
        Err(err) => {
            tracing::error!("Delete book failed {}", err);
            HttpResponse::BadRequest().json(MessageResponse::new(COULD_NOT_DELETE_BOOK))
        }
    })
}

#[cfg(test)]
mod handler_tests {
    use std::sync::Arc;

    use actix_web::body::MessageBody;
    use actix_web::dev::ServiceResponse;
    use actix_web::http::header::ContentType;
    use actix_web::http::StatusCode;
    use actix_web::{test, web, App};
    use paperclip::actix::OpenApiExt;
    use serde_json::{json, Value};

    use crate::api::{Book, BookId};
    use crate::app_config::{config_app, json_config, API_SPEC_PATH};
    use crate::books_repository::{BookRepository, BookRepositoryError, InMemoryBookRepository};

    struct FailingBookRepository;

    #[async_trait::async_trait]
    impl BookRepository for FailingBookRepository {
        async fn add_book(&self, _book: Book) -> Result<BookId, BookRepositoryError> {
            Err(BookRepositoryError::Other("connection lost".to_string()))
        }

        async fn list_books(&self) -> Result<Vec<Book>, BookRepositoryError> {
            Err(BookRepositoryError::Other("connection lost".to_string()))
        }

        async fn get_book(&self, _book_id: BookId) -> Result<Book, BookRepositoryError> {
            Err(BookRepositoryError::Other("connection lost".to_string()))
        }

        async fn delete_book(&self, _book_id: BookId) -> Result<bool, BookRepositoryError> {
            Err(BookRepositoryError::Other("connection lost".to_string()))
        }
    }

    macro_rules! init_app {
        ($repo:expr) => {{
            let books_repository: Arc<dyn BookRepository> = $repo;
            test::init_service(
                App::new()
                    .wrap_api()
                    .app_data(web::Data::new(books_repository))
                    .app_data(json_config())
                    .configure(config_app)
                    .with_json_spec_at(API_SPEC_PATH)
                    .build(),
            )
            .await
        }};
    }

    async fn read_json<B: MessageBody>(response: ServiceResponse<B>) -> Value {
        test::read_body_json(response).await
    }

    #[actix_web::test]
    async fn create_then_list_returns_created_book() {
        let app = init_app!(Arc::new(InMemoryBookRepository::default()));

        let request = test::TestRequest::post()
            .uri("/api/create_books")
            .set_json(json!({"author": "A", "title": "T", "publisher": "P"}))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await, json!({"message": "book has been added"}));

        let request = test::TestRequest::get().uri("/api/books").to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            read_json(response).await,
            json!({
                "message": "books fetched successfully",
                "data": [{"id": 1, "author": "A", "title": "T", "publisher": "P"}]
            })
        );
    }

    #[actix_web::test]
    async fn list_on_empty_repository_returns_empty_data() {
        let app = init_app!(Arc::new(InMemoryBookRepository::default()));

        let request = test::TestRequest::get().uri("/api/books").to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await["data"], json!([]));
    }

    #[actix_web::test]
    async fn create_with_missing_fields_stores_nulls() {
        let repo = Arc::new(InMemoryBookRepository::default());
        let app = init_app!(repo.clone());

        let request = test::TestRequest::post()
            .uri("/api/create_books")
            .set_json(json!({"title": "T", "id": 55}))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);

        let books = repo.list_books().await.unwrap();
        assert_eq!(
            books,
            vec![Book {
                id: Some(1),
                title: Some("T".to_string()),
                ..Book::default()
            }]
        );
    }

    #[actix_web::test]
    async fn create_with_unparseable_body_returns_422_and_adds_nothing() {
        let repo = Arc::new(InMemoryBookRepository::default());
        let app = init_app!(repo.clone());

        let request = test::TestRequest::post()
            .uri("/api/create_books")
            .insert_header(ContentType::plaintext())
            .set_payload("not a json")
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(read_json(response).await, json!({"message": "request failed"}));

        let request = test::TestRequest::post()
            .uri("/api/create_books")
            .insert_header(ContentType::json())
            .set_payload("{\"author\": ")
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let request = test::TestRequest::post()
            .uri("/api/create_books")
            .set_json(json!({"author": 1, "title": "T", "publisher": "P"}))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(read_json(response).await, json!({"message": "request failed"}));

        assert!(repo.list_books().await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn get_book_by_id() {
        let repo = Arc::new(InMemoryBookRepository::default());
        let app = init_app!(repo.clone());
        let id = repo.add_book(Book::new("A", "T", "P")).await.unwrap();

        let request = test::TestRequest::get()
            .uri(&format!("/api/get_books/{}", id))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            read_json(response).await,
            json!({
                "message": "book id fetched successfully",
                "data": {"id": id, "author": "A", "title": "T", "publisher": "P"}
            })
        );
    }

    #[actix_web::test]
    async fn get_book_not_found_returns_400_without_data() {
        let app = init_app!(Arc::new(InMemoryBookRepository::default()));

        let request = test::TestRequest::get()
            .uri("/api/get_books/42")
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = read_json(response).await;
        assert_eq!(body, json!({"message": "could not get the book"}));
        assert!(body.get("data").is_none());

        let request = test::TestRequest::get()
            .uri("/api/get_books/abc")
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn empty_id_returns_500() {
        let app = init_app!(Arc::new(InMemoryBookRepository::default()));

        let request = test::TestRequest::get().uri("/api/get_books/").to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(read_json(response).await, json!({"message": "id cannot be empty"}));

        let request = test::TestRequest::delete()
            .uri("/api/delete_book/")
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(read_json(response).await, json!({"message": "id cannot be empty"}));
    }

    #[actix_web::test]
    async fn delete_removes_only_given_book() {
        let repo = Arc::new(InMemoryBookRepository::default());
        let app = init_app!(repo.clone());
        let id_1 = repo.add_book(Book::new("A", "T", "P")).await.unwrap();
        let id_2 = repo.add_book(Book::new("B", "U", "Q")).await.unwrap();

        let request = test::TestRequest::delete()
            .uri(&format!("/api/delete_book/{}", id_1))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            read_json(response).await,
            json!({"message": "book deleted successfully"})
        );

        assert_eq!(
            repo.list_books().await.unwrap(),
            vec![Book::new("B", "U", "Q").with_id(id_2)]
        );
    }

    #[actix_web::test]
    async fn delete_of_missing_book_is_idempotent() {
        let repo = Arc::new(InMemoryBookRepository::default());
        let app = init_app!(repo.clone());
        repo.add_book(Book::new("A", "T", "P")).await.unwrap();

        for _ in 0..2 {
            let request = test::TestRequest::delete()
                .uri("/api/delete_book/999")
                .to_request();
            let response = test::call_service(&app, request).await;
            assert_eq!(response.status(), StatusCode::OK);
        }
        assert_eq!(repo.list_books().await.unwrap().len(), 1);

        let request = test::TestRequest::delete()
            .uri("/api/delete_book/not-a-number")
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            read_json(response).await,
            json!({"message": "could not delete book"})
        );
    }

    #[actix_web::test]
    async fn repository_failures_return_400() {
        let app = init_app!(Arc::new(FailingBookRepository));

        let request = test::TestRequest::post()
            .uri("/api/create_books")
            .set_json(json!({"author": "A", "title": "T", "publisher": "P"}))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read_json(response).await, json!({"message": "could not create book"}));

        let request = test::TestRequest::get().uri("/api/books").to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read_json(response).await, json!({"message": "could not get books"}));

        let request = test::TestRequest::get().uri("/api/get_books/1").to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let request = test::TestRequest::delete()
            .uri("/api/delete_book/1")
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn health_is_ok() {
        let app = init_app!(Arc::new(InMemoryBookRepository::default()));

        let request = test::TestRequest::get().uri("/health").to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn api_spec_lists_book_routes() {
        let app = init_app!(Arc::new(InMemoryBookRepository::default()));

        let request = test::TestRequest::get().uri("/apispec/v2").to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);

        let spec = read_json(response).await;
        let paths = spec["paths"].as_object().expect("No paths in api spec");
        for path in ["/health", "/api/create_books", "/api/books"] {
            assert!(paths.contains_key(path), "{} missing in api spec", path);
        }
        assert_eq!(paths.len(), 5);
    }
}
