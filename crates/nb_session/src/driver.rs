use std::sync::Arc;

use nb_core::{ArticleId, ArticleSource, Error, FetchQuery, RawArticle, Result, SectionName, SortKey};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::controller::{FetchOutcome, FetchTicket, SessionController};
use crate::snapshot::SessionSnapshot;

const EVENT_BUFFER: usize = 64;

/// User-facing events the environment feeds into the session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Refresh(FetchQuery),
    SortKeyChanged(SortKey),
    ArticleSelected(ArticleId),
    SectionToggled(ArticleId, SectionName),
    Shutdown,
}

/// Failures reported to the renderer. None of them alter the last good view.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionNotice {
    FetchFailed(String),
    MalformedData(String),
    UnknownArticle(ArticleId),
}

impl From<Error> for SessionNotice {
    fn from(err: Error) -> Self {
        match err {
            Error::UnknownArticle(id) => SessionNotice::UnknownArticle(id),
            e @ Error::MalformedData { .. } => SessionNotice::MalformedData(e.to_string()),
            other => SessionNotice::FetchFailed(other.into_fetch_failure().to_string()),
        }
    }
}

enum Message {
    Event(SessionEvent),
    Fetched(FetchTicket, Result<Vec<RawArticle>>),
}

/// Cloneable handle used by the environment to talk to a running session.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<Message>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    pub async fn send(&self, event: SessionEvent) -> Result<()> {
        self.tx
            .send(Message::Event(event))
            .await
            .map_err(|_| Error::External(anyhow::anyhow!("session has shut down")))
    }

    pub async fn refresh(&self, query: FetchQuery) -> Result<()> {
        self.send(SessionEvent::Refresh(query)).await
    }

    pub async fn sort_by(&self, key: SortKey) -> Result<()> {
        self.send(SessionEvent::SortKeyChanged(key)).await
    }

    pub async fn select(&self, id: ArticleId) -> Result<()> {
        self.send(SessionEvent::ArticleSelected(id)).await
    }

    pub async fn toggle(&self, id: ArticleId, section: SectionName) -> Result<()> {
        self.send(SessionEvent::SectionToggled(id, section)).await
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.send(SessionEvent::Shutdown).await
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }
}

/// Runs a [`SessionController`] on a single task. Fetches run on their own
/// tasks and report back through the same queue as user events, so every
/// state change is applied in order by one owner.
pub struct SessionDriver {
    controller: SessionController,
    source: Arc<dyn ArticleSource>,
    rx: mpsc::Receiver<Message>,
    fetch_tx: mpsc::WeakSender<Message>,
    snapshots: watch::Sender<SessionSnapshot>,
    notices: mpsc::UnboundedSender<SessionNotice>,
}

impl SessionDriver {
    pub fn new(
        controller: SessionController,
        source: Arc<dyn ArticleSource>,
    ) -> (Self, SessionHandle, mpsc::UnboundedReceiver<SessionNotice>) {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let (snapshot_tx, snapshot_rx) = watch::channel(controller.snapshot());
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();

        let driver = Self {
            controller,
            source,
            rx,
            fetch_tx: tx.downgrade(),
            snapshots: snapshot_tx,
            notices: notice_tx,
        };
        let handle = SessionHandle { tx, snapshots: snapshot_rx };
        (driver, handle, notice_rx)
    }

    /// Spawns the driver onto the current runtime.
    pub fn spawn(
        controller: SessionController,
        source: Arc<dyn ArticleSource>,
    ) -> (SessionHandle, mpsc::UnboundedReceiver<SessionNotice>, tokio::task::JoinHandle<()>) {
        let (driver, handle, notices) = Self::new(controller, source);
        let task = tokio::spawn(driver.run());
        (handle, notices, task)
    }

    /// Processes messages until `Shutdown` or until every handle and
    /// in-flight fetch has gone away.
    pub async fn run(mut self) {
        info!("🗞️ Session started with source {}", self.source.name());
        while let Some(message) = self.rx.recv().await {
            match message {
                Message::Event(SessionEvent::Shutdown) => break,
                Message::Event(event) => self.handle_event(event),
                Message::Fetched(ticket, result) => self.handle_fetched(ticket, result),
            }
        }
        info!("Session stopped");
    }

    fn handle_event(&mut self, event: SessionEvent) {
        debug!("Handling {:?}", event);
        let result = match event {
            SessionEvent::Refresh(query) => {
                self.start_fetch(query);
                Ok(self.controller.snapshot())
            }
            SessionEvent::SortKeyChanged(key) => Ok(self.controller.on_sort_key_changed(key)),
            SessionEvent::ArticleSelected(id) => self.controller.on_article_selected(&id),
            SessionEvent::SectionToggled(id, section) => self.controller.on_section_toggled(&id, section),
            SessionEvent::Shutdown => return,
        };
        self.settle(result);
    }

    fn handle_fetched(&mut self, ticket: FetchTicket, result: Result<Vec<RawArticle>>) {
        match self.controller.complete_fetch(ticket, result) {
            Ok(FetchOutcome::Applied(snapshot)) => self.publish(snapshot),
            Ok(FetchOutcome::Superseded { .. }) => {}
            Err(e) => self.settle(Err(e)),
        }
    }

    fn start_fetch(&mut self, query: FetchQuery) {
        let ticket = self.controller.begin_fetch(query);
        let Some(tx) = self.fetch_tx.upgrade() else {
            return;
        };
        let source = self.source.clone();
        tokio::spawn(async move {
            let result = source.fetch(ticket.query()).await;
            if tx.send(Message::Fetched(ticket, result)).await.is_err() {
                debug!("Session gone before fetch completed");
            }
        });
    }

    /// Publishes the outcome of an event. Errors still publish the current
    /// snapshot so the loading flag and revision stay in sync.
    fn settle(&mut self, result: Result<SessionSnapshot>) {
        match result {
            Ok(snapshot) => self.publish(snapshot),
            Err(e) => {
                warn!("Session event failed: {}", e);
                let _ = self.notices.send(SessionNotice::from(e));
                self.publish(self.controller.snapshot());
            }
        }
    }

    fn publish(&self, snapshot: SessionSnapshot) {
        self.snapshots.send_replace(snapshot);
    }
}
