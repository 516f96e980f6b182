use nb_core::{Article, ArticleId, FetchQuery, SectionName, SortKey};
use serde::Serialize;

use crate::collection::ArticleCollection;
use crate::sections::SectionState;

/// Immutable view of the session handed to the renderer after every event.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub articles: ArticleCollection,
    pub sort_key: SortKey,
    pub focus: Option<ArticleId>,
    pub sections: SectionState,
    /// Query that produced `articles`.
    pub query: FetchQuery,
    /// True while the latest issued fetch has not completed.
    pub loading: bool,
    /// Bumped on every state change.
    pub revision: u64,
}

impl SessionSnapshot {
    pub fn focused_article(&self) -> Option<&Article> {
        self.focus.as_ref().and_then(|id| self.articles.get(id))
    }

    pub fn open_section_for(&self, id: &ArticleId) -> Option<SectionName> {
        self.sections.open_section_for(id)
    }
}
