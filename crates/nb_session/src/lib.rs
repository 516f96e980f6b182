pub mod collection;
pub mod controller;
pub mod driver;
pub mod focus;
pub mod sections;
pub mod snapshot;

pub use collection::{ArticleCollection, CollectionManager};
pub use controller::{FetchOutcome, FetchTicket, SessionController};
pub use driver::{SessionDriver, SessionEvent, SessionHandle, SessionNotice};
pub use focus::FocusTracker;
pub use sections::{SectionMatrix, SectionState};
pub use snapshot::SessionSnapshot;
