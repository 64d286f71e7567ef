use paperclip::actix::Apiv2Schema;
use serde::{Deserialize, Serialize};

pub type BookId = u64;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
/// Book record, used both as creation payload and as stored record.
/// `id` is assigned by the repository, any value sent on creation is ignored.
/// Fields missing from the payload are stored as null.
pub struct Book {
    #[serde(default)]
    pub id: Option<BookId>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub publisher: Option<String>,
}

impl Book {
    pub fn new(author: &str, title: &str, publisher: &str) -> Self {
        Self {
            id: None,
            author: Some(author.to_string()),
            title: Some(title.to_string()),
            publisher: Some(publisher.to_string()),
        }
    }

    /// Returns the same record with the given identity
    pub fn with_id(self, id: BookId) -> Self {
        Self {
            id: Some(id),
            ..self
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
pub struct BookListResponse {
    pub message: String,
    pub data: Vec<Book>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
pub struct BookResponse {
    pub message: String,
    pub data: Book,
}
