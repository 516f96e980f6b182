use async_trait::async_trait;
use nb_core::{ArticleSource, Error, FetchQuery, RawArticle, Result};
use tokio::sync::RwLock;

use crate::matches_query;

struct MemoryStore {
    articles: Vec<RawArticle>,
    failure: Option<String>,
    fetches: usize,
}

/// Serves a fixed batch from memory. Can be told to fail, which makes it the
/// stand-in for a flaky network in tests.
pub struct MemorySource {
    store: RwLock<MemoryStore>,
}

impl MemorySource {
    pub fn new(articles: Vec<RawArticle>) -> Self {
        Self {
            store: RwLock::new(MemoryStore {
                articles,
                failure: None,
                fetches: 0,
            }),
        }
    }

    pub async fn set_articles(&self, articles: Vec<RawArticle>) {
        self.store.write().await.articles = articles;
    }

    /// Makes every following fetch fail with `reason`; `None` heals it.
    pub async fn fail_with(&self, reason: Option<&str>) {
        self.store.write().await.failure = reason.map(str::to_string);
    }

    pub async fn fetch_count(&self) -> usize {
        self.store.read().await.fetches
    }
}

#[async_trait]
impl ArticleSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch(&self, query: &FetchQuery) -> Result<Vec<RawArticle>> {
        let mut store = self.store.write().await;
        store.fetches += 1;
        if let Some(reason) = &store.failure {
            return Err(Error::FetchFailed(reason.clone()));
        }
        Ok(store
            .articles
            .iter()
            .filter(|article| matches_query(article, query))
            .cloned()
            .collect())
    }
}
