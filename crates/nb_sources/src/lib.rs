use nb_core::{ArticleSource, Error, FetchQuery, RawArticle, Result};
use std::sync::Arc;
use std::time::Duration;

pub mod sources;

pub use sources::*;

const DEFAULT_ARTICLES_PATH: &str = "articles";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Where and how to fetch articles from.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub url: Option<String>,
    pub articles_path: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl SourceConfig {
    pub fn new() -> Self {
        Self {
            url: None,
            articles_path: DEFAULT_ARTICLES_PATH.to_string(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_articles_path(mut self, path: impl Into<String>) -> Self {
        self.articles_path = path.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn require_url(&self, kind: &str) -> Result<&str> {
        self.url
            .as_deref()
            .ok_or_else(|| Error::InvalidUrl(format!("{} source needs a location (--url)", kind)))
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds a source by name: `http`, `file` or `memory`.
pub fn create_source(kind: &str, config: SourceConfig) -> Result<Arc<dyn ArticleSource>> {
    let source: Arc<dyn ArticleSource> = match kind {
        "http" => Arc::new(HttpSource::new(config)?),
        "file" => Arc::new(FileSource::new(config.require_url("file")?)),
        "memory" => Arc::new(MemorySource::new(Vec::new())),
        other => {
            return Err(Error::External(anyhow::anyhow!(
                "Unknown source: {} (expected http, file or memory)",
                other
            )))
        }
    };
    tracing::info!("📚 Using {} source", source.name());
    Ok(source)
}

/// Case-insensitive match of a search term against headline and teaser.
pub(crate) fn matches_query(article: &RawArticle, query: &FetchQuery) -> bool {
    let Some(term) = query.term() else {
        return true;
    };
    let term = term.to_lowercase();
    [&article.headline, &article.teaser]
        .into_iter()
        .flatten()
        .any(|text| text.to_lowercase().contains(&term))
}
