use std::collections::BTreeMap;

use nb_core::{ArticleId, SectionName};
use serde::Serialize;
use tracing::debug;

/// Which section, if any, is expanded on each article card.
///
/// Only open entries are stored; an id with no entry has nothing expanded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SectionState(BTreeMap<ArticleId, SectionName>);

impl SectionState {
    pub fn open_section_for(&self, id: &ArticleId) -> Option<SectionName> {
        self.0.get(id).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ArticleId, SectionName)> {
        self.0.iter().map(|(id, section)| (id, *section))
    }
}

/// Exclusive-open toggles, one slot per article id.
#[derive(Debug, Default)]
pub struct SectionMatrix {
    state: SectionState,
}

impl SectionMatrix {
    /// Closes `section` if it is the one open for `id`, otherwise opens it in
    /// place of whatever was open. Other ids are never touched.
    pub fn toggle(&mut self, id: &ArticleId, section: SectionName) -> SectionState {
        let slots = &mut self.state.0;
        if slots.get(id) == Some(&section) {
            slots.remove(id);
            debug!("Closed {} on {}", section, id);
        } else {
            slots.insert(id.clone(), section);
            debug!("Opened {} on {}", section, id);
        }
        self.state.clone()
    }

    pub fn open_section_for(&self, id: &ArticleId) -> Option<SectionName> {
        self.state.open_section_for(id)
    }

    pub fn state(&self) -> &SectionState {
        &self.state
    }

    pub fn clear(&mut self) {
        self.state = SectionState::default();
    }
}
