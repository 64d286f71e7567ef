use anyhow::{bail, Context};
use tokio_postgres::config::SslMode;
use tokio_postgres::{Client, NoTls, Row, Statement};

use crate::api::{Book, BookId};
use crate::books_repository::{BookRepository, BookRepositoryError};

/// Columns of the books table besides the primary key.
/// Missing ones are added on startup
const BOOK_COLUMNS: [&str; 3] = ["author", "title", "publisher"];

pub struct PostgresBooksRepository {
    client: Client,
}

#[derive(Debug, Clone)]
pub struct PostgresBooksRepositoryConfig {
    pub hostname: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub dbname: String,
    pub sslmode: String,
}

impl PostgresBooksRepositoryConfig {
    fn ssl_mode(&self) -> anyhow::Result<SslMode> {
        Ok(match self.sslmode.as_str() {
            "disable" => SslMode::Disable,
            "prefer" => SslMode::Prefer,
            // connections are made without TLS, modes that need it cannot be honored
            other => bail!("Unsupported sslmode {}, expected disable or prefer", other),
        })
    }

    /// Values are passed as they are, no escaping needed for passwords with spaces or quotes
    fn connection_config(&self) -> anyhow::Result<tokio_postgres::Config> {
        let mut config = tokio_postgres::Config::new();
        config
            .host(&self.hostname)
            .port(self.port)
            .user(&self.username)
            .password(&self.password)
            .dbname(&self.dbname)
            .ssl_mode(self.ssl_mode()?);
        Ok(config)
    }
}

impl PostgresBooksRepository {
    pub async fn init(config: PostgresBooksRepositoryConfig) -> anyhow::Result<Self> {
        tracing::info!(
            "Postgres connection: host={} port={} user={} dbname={} sslmode={}",
            config.hostname,
            config.port,
            config.username,
            config.dbname,
            config.sslmode
        );
        let (client, connection) = config
            .connection_config()?
            .connect(NoTls)
            .await
            .context("Failed to start postgres")?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("Postgres connection error: {}", e);
            }
        });

        let repository = Self { client };
        repository.migrate().await?;
        Ok(repository)
    }

    /// Makes sure the books table and all of its columns exist
    async fn migrate(&self) -> anyhow::Result<()> {
        self.client
            .batch_execute("CREATE TABLE IF NOT EXISTS books (id BIGSERIAL PRIMARY KEY)")
            .await
            .context("Failed to setup table")?;

        for column in BOOK_COLUMNS {
            self.client
                .batch_execute(&format!(
                    "ALTER TABLE books ADD COLUMN IF NOT EXISTS {} TEXT",
                    column
                ))
                .await
                .with_context(|| format!("Failed to add column {}", column))?;
        }
        tracing::info!("Books table migrated");
        Ok(())
    }
}

fn to_db_id(book_id: BookId) -> Option<i64> {
    i64::try_from(book_id).ok()
}

fn from_db_id(id: i64) -> Result<BookId, BookRepositoryError> {
    BookId::try_from(id).map_err(|_| BookRepositoryError::Other(format!("Invalid book id {}", id)))
}

fn book_from_row(row: &Row) -> Result<Book, BookRepositoryError> {
    Ok(Book {
        id: Some(from_db_id(row.try_get("id")?)?),
        author: row.try_get("author")?,
        title: row.try_get("title")?,
        publisher: row.try_get("publisher")?,
    })
}

#[async_trait::async_trait]
impl BookRepository for PostgresBooksRepository {
    async fn add_book(&self, book: Book) -> Result<BookId, BookRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare("INSERT INTO books (author, title, publisher) VALUES ($1, $2, $3) RETURNING id")
            .await?;

        let rows = self
            .client
            .query(&stmt, &[&book.author, &book.title, &book.publisher])
            .await?;

        let book_id: i64 = rows
            .first()
            .ok_or_else(|| BookRepositoryError::Other("Id not returned".to_string()))?
            .try_get(0)?;

        from_db_id(book_id)
    }

    async fn list_books(&self) -> Result<Vec<Book>, BookRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare("SELECT id, author, title, publisher FROM books ORDER BY id")
            .await?;

        let rows = self.client.query(&stmt, &[]).await?;

        rows.iter().map(book_from_row).collect()
    }

    async fn get_book(&self, book_id: BookId) -> Result<Book, BookRepositoryError> {
        let db_id = to_db_id(book_id).ok_or(BookRepositoryError::NotFound(book_id))?;
        let stmt: Statement = self
            .client
            .prepare("SELECT id, author, title, publisher FROM books WHERE id = ($1)")
            .await?;

        let rows = self.client.query(&stmt, &[&db_id]).await?;

        book_from_row(
            rows.first()
                .ok_or(BookRepositoryError::NotFound(book_id))?,
        )
    }

    async fn delete_book(&self, book_id: BookId) -> Result<bool, BookRepositoryError> {
        let Some(db_id) = to_db_id(book_id) else {
            return Ok(false);
        };
        let stmt: Statement = self
            .client
            .prepare("DELETE FROM books WHERE id = ($1)")
            .await?;

        let deleted = self.client.execute(&stmt, &[&db_id]).await?;
        Ok(deleted > 0)
    }
}
