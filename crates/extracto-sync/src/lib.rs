//! Retrieval layer: the per-date fetch contract, batched range retrieval,
//! TTL memoization and the HTTP client for the extract service.

pub mod cache;
pub mod fetch;
pub mod retriever;
pub mod wire;

#[cfg(feature = "http")]
pub mod http;

pub use cache::CachedFetcher;
pub use fetch::{DrawFetcher, DrawQuery, FetchError};
pub use retriever::{BatchedRetriever, Retrieval, RetrievalReport, RetrieveError, RetrieverConfig};
pub use wire::ExtractoResponse;

#[cfg(feature = "http")]
pub use http::{ClientConfig, ExtractoClient};
