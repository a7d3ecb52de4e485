//! The per-date fetch contract the retriever drives.

use std::sync::Arc;

use async_trait::async_trait;
use extracto_core::{DrawDate, DrawSet};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Other(String),
}

/// Which extract to ask for: the organization (province) and the
/// classification (game) codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawQuery {
    pub organization: u32,
    pub classification: u32,
}

impl DrawQuery {
    pub fn new(organization: u32, classification: u32) -> Self {
        Self {
            organization,
            classification,
        }
    }
}

/// Fetches the draws of a single date.
///
/// An empty [`DrawSet`] means the source has no draws for that date; errors
/// are reserved for failures to obtain an answer at all.
#[async_trait]
pub trait DrawFetcher: Send + Sync {
    async fn fetch(&self, query: DrawQuery, date: DrawDate) -> Result<DrawSet, FetchError>;
}

#[async_trait]
impl<F: DrawFetcher + ?Sized> DrawFetcher for Arc<F> {
    async fn fetch(&self, query: DrawQuery, date: DrawDate) -> Result<DrawSet, FetchError> {
        (**self).fetch(query, date).await
    }
}
