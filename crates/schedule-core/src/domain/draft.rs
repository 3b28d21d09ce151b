//! Parser Draft
//!
//! What the text/image parser hands back before anything is persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A parsed, not yet persisted schedule entry with optional subtasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedDraft {
    pub title: String,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub estimated_duration: Option<u32>,
    pub location: Option<String>,
    /// Raw text this draft was produced from
    pub original_text: String,
    #[serde(default)]
    pub subtasks: Vec<ParsedDraft>,
}

impl ParsedDraft {
    /// Draft that keeps the raw input as an unscheduled title.
    ///
    /// Used whenever the parser is unavailable or its output is unusable.
    pub fn literal(text: &str) -> Self {
        let trimmed = text.trim();
        Self {
            title: trimmed.to_string(),
            scheduled_date: None,
            estimated_duration: None,
            location: None,
            original_text: text.to_string(),
            subtasks: Vec::new(),
        }
    }

    pub fn has_subtasks(&self) -> bool {
        !self.subtasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_draft_is_unscheduled() {
        let draft = ParsedDraft::literal("  明日15時に会議 ");
        assert_eq!(draft.title, "明日15時に会議");
        assert_eq!(draft.original_text, "  明日15時に会議 ");
        assert!(draft.scheduled_date.is_none());
        assert!(!draft.has_subtasks());
    }
}
