//! Search panel: free-text image search and its result grid.

use crate::api::Backend;
use crate::error::{ApiError, Result};
use crate::model::SearchResult;
use log::warn;

pub struct SearchPanel<B> {
    backend: B,
    query: String,
    results: Vec<SearchResult>,
}

impl<B: Backend> SearchPanel<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            query: String::new(),
            results: Vec::new(),
        }
    }

    /// Run a search, replacing the current results.
    ///
    /// A blank query clears the results without touching the backend and
    /// reports a validation error. A failed call also clears the results.
    pub async fn search(&mut self, query: &str) -> Result<&[SearchResult]> {
        let query = query.trim();
        self.query = query.to_string();
        if query.is_empty() {
            self.results.clear();
            return Err(ApiError::Validation("enter a search query".to_string()));
        }
        match self.backend.search_images(query).await {
            Ok(results) => {
                self.results = results;
                Ok(&self.results)
            }
            Err(e) => {
                warn!("search for '{}' failed: {}", query, e);
                self.results.clear();
                Err(e)
            }
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn results(&self) -> &[SearchResult] {
        &self.results
    }

    pub fn clear(&mut self) {
        self.query.clear();
        self.results.clear();
    }
}
