use anyhow::{bail, Context};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::policies::ExponentialBackoff;
use reqwest_retry::RetryTransientMiddleware;
use reqwest_tracing::TracingMiddleware;

use crate::api::{Book, BookId, BookListResponse, BookResponse, MessageResponse};

pub struct BookshelfRepositoryClient {
    url: String,
    /// Retries transient failures, used only for idempotent requests
    client: ClientWithMiddleware,
    /// Used for creating books, a retried create could add the book twice
    non_retrying_client: ClientWithMiddleware,
}

impl BookshelfRepositoryClient {
    pub fn new(url: &str) -> anyhow::Result<Self> {
        let reqwest_client = reqwest::Client::builder()
            .build()
            .context("Failed to build reqwest client")?;
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(3);
        let client = ClientBuilder::new(reqwest_client.clone())
            // Insert the tracing middleware
            .with(TracingMiddleware::default())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();
        let non_retrying_client = ClientBuilder::new(reqwest_client)
            .with(TracingMiddleware::default())
            .build();

        Ok(Self {
            url: url.to_string(),
            client,
            non_retrying_client,
        })
    }

    /// Calls POST /api/create_books endpoint
    /// Service does not return the id of created book
    pub async fn create_book(&self, book: &Book) -> anyhow::Result<()> {
        let response = self
            .non_retrying_client
            .post(format!("{}/api/create_books", self.url))
            .json(book)
            .send()
            .await?;

        if !response.status().is_success() {
            bail!("Failed to create book {}", error_message(response).await)
        }
        Ok(())
    }

    /// Calls GET /api/books endpoint
    pub async fn list_books(&self) -> anyhow::Result<Vec<Book>> {
        let response = self
            .client
            .get(format!("{}/api/books", self.url))
            .send()
            .await?;

        if !response.status().is_success() {
            bail!("Failed to list books {}", error_message(response).await)
        }
        let books: BookListResponse = response.json().await?;
        Ok(books.data)
    }

    /// Calls GET /api/get_books/{id} endpoint
    /// Missing book is reported as an error, service does not distinguish it from other failures
    pub async fn get_book(&self, book_id: BookId) -> anyhow::Result<Book> {
        let response = self
            .client
            .get(format!("{}/api/get_books/{}", self.url, book_id))
            .send()
            .await?;

        if !response.status().is_success() {
            bail!("Failed to get book {}", error_message(response).await)
        }
        let book: BookResponse = response.json().await?;
        Ok(book.data)
    }

    /// Calls DELETE /api/delete_book/{id} endpoint
    /// Deleting a book that does not exist succeeds
    pub async fn delete_book(&self, book_id: BookId) -> anyhow::Result<()> {
        let response = self
            .client
            .delete(format!("{}/api/delete_book/{}", self.url, book_id))
            .send()
            .await?;

        if !response.status().is_success() {
            bail!("Failed to delete book {}", error_message(response).await)
        }
        Ok(())
    }
}

async fn error_message(response: reqwest::Response) -> String {
    let status = response.status();
    let message = response
        .json::<MessageResponse>()
        .await
        .map(|body| body.message)
        .unwrap_or_default();
    format!("({}): {}", status, message)
}
