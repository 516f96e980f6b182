use nb_core::{ArticleId, ArticleSource, Error, FetchQuery, RawArticle, Result, SectionName, SortKey};
use tracing::{debug, info, warn};

use crate::collection::{ArticleCollection, CollectionManager};
use crate::focus::FocusTracker;
use crate::sections::SectionMatrix;
use crate::snapshot::SessionSnapshot;

/// Identifies one issued fetch. Only the most recently issued ticket may
/// deliver data into the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    seq: u64,
    query: FetchQuery,
}

impl FetchTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn query(&self) -> &FetchQuery {
        &self.query
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The batch replaced the working set.
    Applied(SessionSnapshot),
    /// A newer fetch was issued after this one; the response was dropped.
    Superseded { seq: u64, latest: u64 },
}

/// Owns the collection, focus and section state of one browsing session.
///
/// Every method runs to completion synchronously; the only asynchronous
/// boundary is the fetch collaborator, which is bracketed by
/// [`begin_fetch`](Self::begin_fetch) and [`complete_fetch`](Self::complete_fetch).
#[derive(Debug, Default)]
pub struct SessionController {
    collection: CollectionManager,
    current: ArticleCollection,
    focus: FocusTracker,
    sections: SectionMatrix,
    query: FetchQuery,
    issued: u64,
    in_flight: bool,
    revision: u64,
}

impl SessionController {
    pub fn new(sort_key: SortKey) -> Self {
        Self {
            collection: CollectionManager::new(sort_key),
            ..Default::default()
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            articles: self.current.clone(),
            sort_key: self.collection.sort_key(),
            focus: self.focus.current().cloned(),
            sections: self.sections.state().clone(),
            query: self.query.clone(),
            loading: self.in_flight,
            revision: self.revision,
        }
    }

    /// Issues a new ticket, superseding any fetch still in flight.
    ///
    /// The visible state is kept until the new batch arrives so a failed
    /// fetch can leave the last good view in place.
    pub fn begin_fetch(&mut self, query: FetchQuery) -> FetchTicket {
        self.issued += 1;
        self.in_flight = true;
        self.revision += 1;
        info!("📡 Fetch #{} started ({})", self.issued, query);
        FetchTicket { seq: self.issued, query }
    }

    /// Delivers the result of the fetch identified by `ticket`.
    ///
    /// Stale tickets are dropped without touching state. A transport error
    /// or malformed batch clears the loading flag, leaves collection, focus
    /// and sections untouched, and is returned to the caller.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<RawArticle>>,
    ) -> Result<FetchOutcome> {
        if ticket.seq != self.issued {
            warn!("Discarding stale fetch #{} (latest is #{})", ticket.seq, self.issued);
            return Ok(FetchOutcome::Superseded { seq: ticket.seq, latest: self.issued });
        }

        self.in_flight = false;
        self.revision += 1;

        let raw = result.map_err(|e| {
            warn!("Fetch #{} failed: {}", ticket.seq, e);
            e.into_fetch_failure()
        })?;
        let collection = self.collection.ingest(raw).map_err(|e| {
            warn!("Fetch #{} rejected: {}", ticket.seq, e);
            e
        })?;

        self.sections.clear();
        self.focus.reset_to_first(&collection);
        self.current = collection;
        self.query = ticket.query;
        info!("✨ Fetch #{} applied: {} articles", ticket.seq, self.current.len());
        Ok(FetchOutcome::Applied(self.snapshot()))
    }

    /// Fetches `query` from `source` and applies it in one step.
    ///
    /// Holds `&mut self` across the await, so it cannot race with another
    /// fetch; use [`SessionDriver`](crate::SessionDriver) when fetches may overlap.
    pub async fn refresh(&mut self, source: &dyn ArticleSource, query: FetchQuery) -> Result<SessionSnapshot> {
        let ticket = self.begin_fetch(query);
        let result = source.fetch(ticket.query()).await;
        match self.complete_fetch(ticket, result)? {
            FetchOutcome::Applied(snapshot) => Ok(snapshot),
            FetchOutcome::Superseded { .. } => Ok(self.snapshot()),
        }
    }

    pub fn on_sort_key_changed(&mut self, key: SortKey) -> SessionSnapshot {
        debug!("Sort key changed to {}", key);
        self.current = self.collection.set_sort_key(key);
        self.focus.reset_to_first(&self.current);
        self.revision += 1;
        self.snapshot()
    }

    pub fn on_article_selected(&mut self, id: &ArticleId) -> Result<SessionSnapshot> {
        self.focus.select(id, &self.current)?;
        self.revision += 1;
        Ok(self.snapshot())
    }

    pub fn on_section_toggled(&mut self, id: &ArticleId, section: SectionName) -> Result<SessionSnapshot> {
        if !self.current.contains(id) {
            return Err(Error::UnknownArticle(id.clone()));
        }
        self.sections.toggle(id, section);
        self.revision += 1;
        Ok(self.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nb_core::parse_timestamp;

    fn raw(id: u64, date: &str, duration: &str) -> RawArticle {
        RawArticle {
            id: Some(ArticleId::from(id)),
            headline: Some(format!("Headline {}", id)),
            published_date: Some(parse_timestamp(date).unwrap()),
            duration: Some(duration.to_string()),
            ..Default::default()
        }
    }

    fn order(snapshot: &SessionSnapshot) -> Vec<String> {
        snapshot.articles.iter().map(|a| a.id.to_string()).collect()
    }

    fn loaded(batch: Vec<RawArticle>) -> SessionController {
        let mut controller = SessionController::default();
        let ticket = controller.begin_fetch(FetchQuery::Latest);
        controller.complete_fetch(ticket, Ok(batch)).unwrap();
        controller
    }

    #[test]
    fn test_two_article_walkthrough() {
        let mut controller = loaded(vec![raw(1, "2024-01-02", "00:05"), raw(2, "2024-01-03", "00:02")]);
        let one = ArticleId::from(1);
        let two = ArticleId::from(2);

        let snapshot = controller.on_sort_key_changed(SortKey::ByDate);
        assert_eq!(order(&snapshot), vec!["2", "1"]);
        assert_eq!(snapshot.focus, Some(two.clone()));

        let snapshot = controller.on_section_toggled(&two, SectionName::Summary).unwrap();
        assert_eq!(snapshot.open_section_for(&two), Some(SectionName::Summary));
        let snapshot = controller.on_section_toggled(&two, SectionName::Summary).unwrap();
        assert_eq!(snapshot.open_section_for(&two), None);

        controller.on_section_toggled(&one, SectionName::Article).unwrap();
        let snapshot = controller.on_sort_key_changed(SortKey::ByDuration);
        assert_eq!(order(&snapshot), vec!["2", "1"]);
        assert_eq!(snapshot.focus, Some(two.clone()));
        assert_eq!(snapshot.open_section_for(&two), None);
        assert_eq!(snapshot.open_section_for(&one), Some(SectionName::Article));
    }

    #[test]
    fn test_sections_follow_ids_across_reorder() {
        let mut controller = loaded(vec![raw(1, "2024-01-02", "00:01"), raw(2, "2024-01-03", "00:09")]);
        let one = ArticleId::from(1);

        controller.on_section_toggled(&one, SectionName::AiSummary).unwrap();
        let by_duration = controller.on_sort_key_changed(SortKey::ByDuration);
        assert_eq!(by_duration.articles.position(&one), Some(0));
        assert_eq!(by_duration.open_section_for(&one), Some(SectionName::AiSummary));

        let by_date = controller.on_sort_key_changed(SortKey::ByDate);
        assert_eq!(by_date.articles.position(&one), Some(1));
        assert_eq!(by_date.open_section_for(&one), Some(SectionName::AiSummary));
        assert_eq!(by_date.focus, Some(ArticleId::from(2)));
    }

    #[test]
    fn test_fresh_ingest_clears_sections_and_refocuses() {
        let mut controller = loaded(vec![raw(1, "2024-01-02", "00:01"), raw(2, "2024-01-03", "00:09")]);
        controller.on_section_toggled(&ArticleId::from(1), SectionName::Summary).unwrap();
        controller.on_article_selected(&ArticleId::from(1)).unwrap();

        let ticket = controller.begin_fetch(FetchQuery::Search("rates".to_string()));
        let outcome = controller
            .complete_fetch(ticket, Ok(vec![raw(1, "2024-01-01", "00:01"), raw(3, "2024-02-01", "00:03")]))
            .unwrap();
        let FetchOutcome::Applied(snapshot) = outcome else {
            panic!("expected the batch to be applied");
        };
        assert!(snapshot.sections.is_empty());
        assert_eq!(snapshot.focus, Some(ArticleId::from(3)));
        assert_eq!(snapshot.query, FetchQuery::Search("rates".to_string()));
        assert!(!snapshot.loading);
    }

    #[test]
    fn test_unknown_ids_are_rejected() {
        let mut controller = loaded(vec![raw(1, "2024-01-02", "00:01")]);
        let ghost = ArticleId::from(99);

        assert!(matches!(controller.on_article_selected(&ghost), Err(Error::UnknownArticle(_))));
        assert!(matches!(
            controller.on_section_toggled(&ghost, SectionName::Summary),
            Err(Error::UnknownArticle(_))
        ));
        assert!(controller.snapshot().sections.is_empty());
        assert_eq!(controller.snapshot().focus, Some(ArticleId::from(1)));
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let mut controller = SessionController::default();
        let old = controller.begin_fetch(FetchQuery::Latest);
        let new = controller.begin_fetch(FetchQuery::Search("tesla".to_string()));

        let outcome = controller.complete_fetch(new, Ok(vec![raw(2, "2024-01-03", "00:02")])).unwrap();
        assert!(matches!(outcome, FetchOutcome::Applied(_)));

        let outcome = controller.complete_fetch(old, Ok(vec![raw(1, "2024-01-02", "00:05")])).unwrap();
        assert_eq!(outcome, FetchOutcome::Superseded { seq: 1, latest: 2 });

        let snapshot = controller.snapshot();
        assert_eq!(order(&snapshot), vec!["2"]);
        assert_eq!(snapshot.query, FetchQuery::Search("tesla".to_string()));
    }

    #[test]
    fn test_stale_failure_does_not_clear_loading() {
        let mut controller = SessionController::default();
        let old = controller.begin_fetch(FetchQuery::Latest);
        let _new = controller.begin_fetch(FetchQuery::Latest);

        let outcome = controller
            .complete_fetch(old, Err(Error::FetchFailed("timeout".to_string())))
            .unwrap();
        assert!(matches!(outcome, FetchOutcome::Superseded { .. }));
        assert!(controller.snapshot().loading);
    }

    #[test]
    fn test_failures_keep_last_good_view() {
        let mut controller = loaded(vec![raw(1, "2024-01-02", "00:01"), raw(2, "2024-01-03", "00:09")]);
        controller.on_section_toggled(&ArticleId::from(1), SectionName::Article).unwrap();
        controller.on_article_selected(&ArticleId::from(1)).unwrap();
        let before = controller.snapshot();

        let ticket = controller.begin_fetch(FetchQuery::Latest);
        assert!(controller.snapshot().loading);
        let err = controller
            .complete_fetch(ticket, Err(Error::InvalidUrl("nowhere".to_string())))
            .unwrap_err();
        assert!(matches!(err, Error::FetchFailed(_)));

        let ticket = controller.begin_fetch(FetchQuery::Latest);
        let err = controller
            .complete_fetch(ticket, Ok(vec![RawArticle::default()]))
            .unwrap_err();
        assert!(matches!(err, Error::MalformedData { index: 0, .. }));

        let after = controller.snapshot();
        assert!(!after.loading);
        assert_eq!(after.articles, before.articles);
        assert_eq!(after.focus, before.focus);
        assert_eq!(after.sections, before.sections);
    }

    #[test]
    fn test_wire_batches_through_complete_fetch() {
        let mut controller = SessionController::default();
        let ticket = controller.begin_fetch(FetchQuery::Latest);
        let batch = nb_core::parse_batch(r#"[{"id": "1", "headline": "A"}, {"headline": "B"}]"#);
        let FetchOutcome::Applied(snapshot) = controller.complete_fetch(ticket, batch).unwrap() else {
            panic!("expected the batch to be applied");
        };
        assert_eq!(order(&snapshot), vec!["1", "#1"]);

        let ticket = controller.begin_fetch(FetchQuery::Latest);
        let batch = nb_core::parse_batch(r#"[{"headline": "A", "publishedDate": "soon"}]"#);
        let err = controller.complete_fetch(ticket, batch).unwrap_err();
        assert!(matches!(err, Error::MalformedData { index: 0, .. }));
        assert_eq!(order(&controller.snapshot()), vec!["1", "#1"]);
    }

    #[test]
    fn test_empty_batch() {
        let mut controller = loaded(vec![]);
        let snapshot = controller.on_sort_key_changed(SortKey::ByDuration);
        assert!(snapshot.articles.is_empty());
        assert_eq!(snapshot.focus, None);
        assert_eq!(snapshot.focused_article(), None);
    }
}
