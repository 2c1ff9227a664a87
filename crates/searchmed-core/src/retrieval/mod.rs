//! Ephemeral passage retrieval over medication documents.
//!
//! A retrieval index lives for exactly one QA call: it is built from the
//! documents of one selected medication, queried once, and dropped. Nothing
//! here is shared across queries.

mod index;
mod loader;

pub use index::*;
pub use loader::*;

use std::collections::HashMap;

use thiserror::Error;

use searchmed_llm::LlmError;

/// Retrieval errors.
#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("document fetch from {url} failed: {cause}")]
    Fetch { url: String, cause: String },

    #[error("document at {0} contains no usable text")]
    EmptyDocument(String),

    #[error("medication {0} has no attached documents")]
    NoDocuments(String),

    #[error("embedding failed: {0}")]
    Embedding(#[from] LlmError),

    #[error("retrieval index contains no passages")]
    EmptyIndex,
}

pub type RetrievalResult<T> = Result<T, RetrievalError>;

/// A bounded chunk of document text used as a retrieval unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Passage {
    /// URL of the document this passage came from
    pub source_url: String,
    /// Passage text
    pub content: String,
    /// Position of the passage within its document
    pub index: usize,
}

/// Document-loading capability: fetch a document and split it into
/// passages.
pub trait DocumentLoader {
    fn load_and_split(&self, url: &str) -> RetrievalResult<Vec<Passage>>;
}

/// Mock loader for testing — serves canned passages per URL.
pub struct MockDocumentLoader {
    documents: HashMap<String, Vec<String>>,
    failure: Option<String>,
}

impl MockDocumentLoader {
    pub fn new() -> Self {
        Self {
            documents: HashMap::new(),
            failure: None,
        }
    }

    pub fn with_document(mut self, url: &str, passages: &[&str]) -> Self {
        self.documents
            .insert(url.to_string(), passages.iter().map(|p| p.to_string()).collect());
        self
    }

    /// A loader whose every fetch fails.
    pub fn unreachable(cause: &str) -> Self {
        Self {
            documents: HashMap::new(),
            failure: Some(cause.to_string()),
        }
    }
}

impl Default for MockDocumentLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentLoader for MockDocumentLoader {
    fn load_and_split(&self, url: &str) -> RetrievalResult<Vec<Passage>> {
        if let Some(cause) = &self.failure {
            return Err(RetrievalError::Fetch {
                url: url.to_string(),
                cause: cause.clone(),
            });
        }
        let passages = self.documents.get(url).ok_or_else(|| RetrievalError::Fetch {
            url: url.to_string(),
            cause: "no canned document for this URL".to_string(),
        })?;
        Ok(passages
            .iter()
            .enumerate()
            .map(|(index, content)| Passage {
                source_url: url.to_string(),
                content: content.clone(),
                index,
            })
            .collect())
    }
}
