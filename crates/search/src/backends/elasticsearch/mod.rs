//! Elasticsearch engine implementation.
//!
//! Implements [`SearchEngineClient`](crate::engine::SearchEngineClient) over
//! the official `elasticsearch` client:
//!
//! - **Paging handles**: scroll contexts (`search?scroll=` / `_search/scroll`)
//! - **Aliases**: `_alias` existence, listing, and creation
//! - **Failures**: classified from the status code and the error body, so
//!   expired scroll contexts and scroll-context exhaustion are recognized
//!
//! # Example
//!
//! ```no_run
//! use kindgate_search::backends::elasticsearch::{ElasticsearchConfig, ElasticsearchEngine};
//!
//! # async fn run() -> Result<(), kindgate_search::error::EngineError> {
//! let engine = ElasticsearchEngine::new(ElasticsearchConfig::single_node("http://localhost:9200"))?;
//! engine.health_check().await?;
//! # Ok(())
//! # }
//! ```

mod backend;
mod engine;
mod response;

pub use backend::{ElasticsearchAuth, ElasticsearchConfig, ElasticsearchEngine};
pub use response::{classify_failure, parse_page};
