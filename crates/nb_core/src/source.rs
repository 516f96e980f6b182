use async_trait::async_trait;
use crate::types::{FetchQuery, RawArticle};
use crate::Result;

#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Fetch one batch of article records for the given query
    async fn fetch(&self, query: &FetchQuery) -> Result<Vec<RawArticle>>;

    /// Fetch the latest articles
    async fn fetch_articles(&self) -> Result<Vec<RawArticle>> {
        self.fetch(&FetchQuery::Latest).await
    }

    /// Fetch articles matching a search term
    async fn fetch_articles_by_search_term(&self, term: &str) -> Result<Vec<RawArticle>> {
        self.fetch(&FetchQuery::Search(term.to_string())).await
    }
}
