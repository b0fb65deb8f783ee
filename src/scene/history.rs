use super::SceneKind;

/// Oldest entries are dropped beyond this.
pub const MAX_HISTORY_ENTRIES: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub name: String,
    pub path: String,
    pub kind: SceneKind,
}

/// Scene name + path per constructed scene, for the back action.
#[derive(Debug, Default)]
pub struct NavigationHistory {
    entries: Vec<HistoryEntry>,
}

impl NavigationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: SceneKind) {
        let entry = HistoryEntry {
            name: kind.name().to_string(),
            path: kind.path(),
            kind,
        };
        log::debug!("History: {} {}", entry.name, entry.path);
        self.entries.push(entry);
        if self.entries.len() > MAX_HISTORY_ENTRIES {
            let excess = self.entries.len() - MAX_HISTORY_ENTRIES;
            self.entries.drain(..excess);
        }
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    /// Where "back" leads from the current entry. Galleries always lead back
    /// to a freshly built mirror; the mirror has nowhere to go.
    pub fn back_target(&self) -> Option<SceneKind> {
        match self.current()?.kind {
            SceneKind::Mirror => None,
            SceneKind::Gallery { .. } => Some(SceneKind::Mirror),
        }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn back_from_gallery_is_the_mirror() {
        let mut history = NavigationHistory::new();
        assert_eq!(history.back_target(), None);
        history.push(SceneKind::Mirror);
        assert_eq!(history.back_target(), None);
        history.push(SceneKind::Gallery { workshop: 2 });
        assert_eq!(history.back_target(), Some(SceneKind::Mirror));
        assert_eq!(history.current().unwrap().path, "/workshop/2");
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn long_sessions_keep_only_recent_entries() {
        let mut history = NavigationHistory::new();
        for round in 0..100 {
            history.push(SceneKind::Mirror);
            history.push(SceneKind::Gallery { workshop: round % 5 });
        }
        assert_eq!(history.len(), MAX_HISTORY_ENTRIES);
        assert_eq!(history.current().unwrap().kind, SceneKind::Gallery { workshop: 4 });
        assert_eq!(history.entries()[0].kind, SceneKind::Mirror);
        assert_eq!(history.back_target(), Some(SceneKind::Mirror));
    }
}
