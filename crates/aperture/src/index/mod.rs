//! Retrieval-engine port
//!
//! The relevance core never talks to the engine directly; everything that
//! executes a query goes through [`IndexExecutor`].

pub mod elastic;
pub mod error;
pub mod models;

use async_trait::async_trait;
use futures::future::join_all;

pub use elastic::ElasticExecutor;
pub use error::{IndexError, IndexResult};
pub use models::{Bucket, Hit, SearchBody, SearchHits, Suggestion};

#[async_trait]
pub trait IndexExecutor: Send + Sync {
    async fn search(&self, body: &SearchBody) -> IndexResult<SearchHits>;

    /// Independent sub-queries in one round trip. Results come back in
    /// request order.
    async fn multi_search(&self, bodies: &[SearchBody]) -> IndexResult<Vec<SearchHits>> {
        join_all(bodies.iter().map(|body| self.search(body)))
            .await
            .into_iter()
            .collect()
    }

    /// Phrase-level spelling suggestions for `text`, best first.
    async fn suggest_phrase(&self, text: &str) -> IndexResult<Vec<Suggestion>>;
}
