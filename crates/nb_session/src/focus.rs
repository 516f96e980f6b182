use nb_core::{ArticleId, Error, Result};
use tracing::debug;

use crate::collection::ArticleCollection;

/// Tracks the article shown in the detail pane.
#[derive(Debug, Default)]
pub struct FocusTracker {
    current: Option<ArticleId>,
}

impl FocusTracker {
    pub fn current(&self) -> Option<&ArticleId> {
        self.current.as_ref()
    }

    /// Focuses `id`, which must belong to `collection`. A foreign id leaves
    /// the focus where it was.
    pub fn select(&mut self, id: &ArticleId, collection: &ArticleCollection) -> Result<Option<ArticleId>> {
        if !collection.contains(id) {
            return Err(Error::UnknownArticle(id.clone()));
        }
        debug!("Focus moved to {}", id);
        self.current = Some(id.clone());
        Ok(self.current.clone())
    }

    pub fn reset_to_first(&mut self, collection: &ArticleCollection) -> Option<ArticleId> {
        self.current = collection.first_id().cloned();
        self.current.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nb_core::RawArticle;

    fn collection(ids: &[u64]) -> ArticleCollection {
        ids.iter()
            .enumerate()
            .map(|(i, id)| {
                RawArticle {
                    id: Some(ArticleId::from(*id)),
                    headline: Some(format!("Article {}", id)),
                    ..Default::default()
                }
                .into_article(i)
                .unwrap()
            })
            .collect::<Vec<_>>()
            .into()
    }

    #[test]
    fn test_reset_to_first() {
        let mut focus = FocusTracker::default();
        assert_eq!(focus.reset_to_first(&collection(&[3, 1, 2])), Some(ArticleId::from(3)));
        assert_eq!(focus.current(), Some(&ArticleId::from(3)));

        assert_eq!(focus.reset_to_first(&ArticleCollection::empty()), None);
        assert_eq!(focus.current(), None);
    }

    #[test]
    fn test_select_rejects_foreign_ids() {
        let items = collection(&[1, 2]);
        let mut focus = FocusTracker::default();
        focus.reset_to_first(&items);

        assert_eq!(focus.select(&ArticleId::from(2), &items).unwrap(), Some(ArticleId::from(2)));

        let err = focus.select(&ArticleId::from(42), &items).unwrap_err();
        assert!(matches!(err, Error::UnknownArticle(ref id) if id.as_str() == "42"));
        assert_eq!(focus.current(), Some(&ArticleId::from(2)));
    }
}
