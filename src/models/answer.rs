use serde::Serialize;
use std::collections::BTreeMap;

/// The learner's in-progress answers, keyed by 0-based question index.
///
/// Written only by the input handlers of the rendered quiz; the grader
/// reads it but never writes it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnswerStore {
    entries: BTreeMap<usize, String>,
}

impl AnswerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records (or overwrites) the answer for a question.
    pub fn record(&mut self, index: usize, answer: impl Into<String>) {
        self.entries.insert(index, answer.into());
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.entries.get(&index).map(String::as_str)
    }

    /// The trimmed answer, or `None` when absent or blank.
    pub fn answer_for(&self, index: usize) -> Option<&str> {
        self.get(index).map(str::trim).filter(|a| !a.is_empty())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn answered_count(&self) -> usize {
        self.entries.values().filter(|a| !a.trim().is_empty()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_interaction_overwrites_earlier() {
        let mut store = AnswerStore::new();
        store.record(0, "Rome");
        store.record(0, "Paris");
        assert_eq!(store.get(0), Some("Paris"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn blank_entries_count_as_unanswered() {
        let mut store = AnswerStore::new();
        store.record(1, "   ");
        store.record(2, " seven ");
        assert_eq!(store.answer_for(0), None);
        assert_eq!(store.answer_for(1), None);
        assert_eq!(store.answer_for(2), Some("seven"));
        assert_eq!(store.answered_count(), 1);

        store.clear();
        assert!(store.is_empty());
    }
}
