//! Query seam for document questions.

use crate::error::SearchError;
use async_trait::async_trait;
use opscenter_core::api::Citation;

/// Candidate answer before the citation gate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchAnswer {
    pub answer: String,
    pub citations: Vec<Citation>,
}

#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn answer(&self, query: &str) -> Result<SearchAnswer, SearchError>;
}

/// Placeholder backend: never finds a source.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnintegratedSearch;

#[async_trait]
impl SearchBackend for UnintegratedSearch {
    async fn answer(&self, query: &str) -> Result<SearchAnswer, SearchError> {
        tracing::debug!(query_len = query.len(), "Search backend not integrated");
        Ok(SearchAnswer::default())
    }
}
