use async_trait::async_trait;
use nb_core::{parse_batch, ArticleSource, FetchQuery, RawArticle, Result};
use std::path::PathBuf;
use tracing::debug;

use crate::matches_query;

/// Reads a JSON fixture from disk on every fetch.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ArticleSource for FileSource {
    fn name(&self) -> &str {
        "file"
    }

    async fn fetch(&self, query: &FetchQuery) -> Result<Vec<RawArticle>> {
        debug!("Reading articles from {}", self.path.display());
        let body = tokio::fs::read_to_string(&self.path).await?;
        let mut articles = parse_batch(&body)?;
        articles.retain(|article| matches_query(article, query));
        Ok(articles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_file_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"articles": [
                {{"id": 1, "headline": "Markets rally", "duration": "00:03"}},
                {{"id": 2, "headline": "Storm warning", "teaser": "Markets brace"}}
            ]}}"#
        )
        .unwrap();

        let source = FileSource::new(file.path());
        assert_eq!(source.fetch_articles().await.unwrap().len(), 2);
        assert_eq!(source.fetch_articles_by_search_term("storm").await.unwrap().len(), 1);
        assert_eq!(source.fetch_articles_by_search_term("markets").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let source = FileSource::new("/nonexistent/articles.json");
        assert!(matches!(source.fetch_articles().await, Err(nb_core::Error::Io(_))));
    }
}
