use async_trait::async_trait;
use nb_core::{parse_batch, ArticleSource, Error, FetchQuery, RawArticle, Result};
use reqwest::Client;
use std::fmt;
use tracing::debug;
use url::Url;

use crate::SourceConfig;

/// Fetches article batches from a JSON endpoint.
pub struct HttpSource {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl HttpSource {
    pub fn new(config: SourceConfig) -> Result<Self> {
        let base = config.require_url("http")?;
        let base = Url::parse(base).map_err(|e| Error::InvalidUrl(format!("{}: {}", base, e)))?;
        let endpoint = base
            .join(&config.articles_path)
            .map_err(|e| Error::InvalidUrl(format!("{}: {}", config.articles_path, e)))?;
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key,
        })
    }

    pub fn request_url(&self, query: &FetchQuery) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(term) = query.term() {
                pairs.append_pair("q", term);
            }
            if let Some(key) = &self.api_key {
                pairs.append_pair("apiKey", key);
            }
        }
        // An empty serializer still leaves a dangling `?`.
        if url.query() == Some("") {
            url.set_query(None);
        }
        url
    }
}

impl fmt::Debug for HttpSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpSource")
            .field("client", &"<reqwest::Client>")
            .field("endpoint", &self.endpoint.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[async_trait]
impl ArticleSource for HttpSource {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self, query: &FetchQuery) -> Result<Vec<RawArticle>> {
        let url = self.request_url(query);
        debug!("GET {}", self.endpoint);
        let body = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        parse_batch(&body)
    }
}
