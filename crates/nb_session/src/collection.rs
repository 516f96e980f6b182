use std::collections::HashSet;
use std::ops::Deref;
use std::sync::Arc;

use nb_core::{Article, ArticleId, Error, RawArticle, Result, SortKey};
use serde::Serialize;
use tracing::debug;

/// An ordered, immutable view of the working set.
///
/// Cloning is cheap; every re-derivation produces a fresh collection rather
/// than reordering an existing one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ArticleCollection(Arc<[Article]>);

impl ArticleCollection {
    pub fn empty() -> Self {
        Self(Arc::from(Vec::new()))
    }

    pub fn contains(&self, id: &ArticleId) -> bool {
        self.0.iter().any(|a| &a.id == id)
    }

    pub fn get(&self, id: &ArticleId) -> Option<&Article> {
        self.0.iter().find(|a| &a.id == id)
    }

    pub fn position(&self, id: &ArticleId) -> Option<usize> {
        self.0.iter().position(|a| &a.id == id)
    }

    pub fn first_id(&self) -> Option<&ArticleId> {
        self.0.first().map(|a| &a.id)
    }

    pub fn ids(&self) -> Vec<ArticleId> {
        self.0.iter().map(|a| a.id.clone()).collect()
    }
}

impl Default for ArticleCollection {
    fn default() -> Self {
        Self::empty()
    }
}

impl Deref for ArticleCollection {
    type Target = [Article];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<Article>> for ArticleCollection {
    fn from(articles: Vec<Article>) -> Self {
        Self(Arc::from(articles))
    }
}

/// Holds the last ingested batch (in ingestion order) and the active sort key.
#[derive(Debug, Default)]
pub struct CollectionManager {
    raw: Vec<Article>,
    sort_key: SortKey,
}

impl CollectionManager {
    pub fn new(sort_key: SortKey) -> Self {
        Self { raw: Vec::new(), sort_key }
    }

    pub fn sort_key(&self) -> SortKey {
        self.sort_key
    }

    /// Replaces the working set with `raw_articles`.
    ///
    /// The batch is validated as a whole: a record without a headline, or two
    /// records sharing an id, rejects the batch and leaves the previous
    /// working set in place.
    pub fn ingest(&mut self, raw_articles: Vec<RawArticle>) -> Result<ArticleCollection> {
        let mut seen = HashSet::with_capacity(raw_articles.len());
        let mut articles = Vec::with_capacity(raw_articles.len());

        for (index, raw) in raw_articles.into_iter().enumerate() {
            let article = raw.into_article(index)?;
            if !seen.insert(article.id.clone()) {
                return Err(Error::malformed(index, format!("duplicate id {}", article.id)));
            }
            articles.push(article);
        }

        debug!("Ingested {} articles", articles.len());
        self.raw = articles;
        Ok(self.ordered())
    }

    pub fn set_sort_key(&mut self, key: SortKey) -> ArticleCollection {
        self.sort_key = key;
        self.ordered()
    }

    /// Derives the ordering for the current key. `sort_by` is stable, so
    /// ties keep ingestion order.
    pub fn ordered(&self) -> ArticleCollection {
        let mut articles = self.raw.clone();
        match self.sort_key {
            // Undated articles compare lowest and therefore land last.
            SortKey::ByDate => articles.sort_by(|a, b| b.published_date.cmp(&a.published_date)),
            SortKey::ByDuration => articles.sort_by(|a, b| a.duration.cmp(&b.duration)),
        }
        ArticleCollection::from(articles)
    }
}
