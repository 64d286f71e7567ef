pub use in_memory_books_repository::InMemoryBookRepository;
pub use postgres_books_repository::{PostgresBooksRepository, PostgresBooksRepositoryConfig};

use crate::api::{Book, BookId};

mod in_memory_books_repository;
mod postgres_books_repository;

#[derive(thiserror::Error, Debug)]
pub enum BookRepositoryError {
    #[error("Book {0} not found")]
    NotFound(BookId),

    #[error("DatabaseFailure failure {0}")]
    DatabaseFailure(#[from] tokio_postgres::Error),

    #[error("Other error {0}")]
    Other(String),
}

#[async_trait::async_trait]
pub trait BookRepository: Send + Sync {
    /// Adds book to repository, returns an id assigned to the book.
    /// Id present in the passed book is ignored
    async fn add_book(&self, book: Book) -> Result<BookId, BookRepositoryError>;
    /// Lists all books in the repository, ordered by id
    async fn list_books(&self) -> Result<Vec<Book>, BookRepositoryError>;
    /// Retrieves the book from repository
    async fn get_book(&self, book_id: BookId) -> Result<Book, BookRepositoryError>;
    /// Deletes book from the repository, returns true if book was deleted and false if it was not found
    async fn delete_book(&self, book_id: BookId) -> Result<bool, BookRepositoryError>;
}
