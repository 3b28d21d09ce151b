//! Schedule Item Entity
//!
//! A schedule entry owned by one user, optionally nested under a parent
//! item (single parent, forming a tree).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::draft::ParsedDraft;
use super::ids::{ItemId, UserId};

/// A persisted schedule item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleItem {
    /// Store-assigned identifier
    pub id: ItemId,
    /// Owner, immutable after creation
    pub user_id: UserId,
    /// Display title, non-empty
    pub title: String,
    /// None renders as "unscheduled"
    pub scheduled_date: Option<DateTime<Utc>>,
    /// Minutes
    pub estimated_duration: Option<u32>,
    pub location: Option<String>,
    #[serde(default)]
    pub is_completed: bool,
    /// Created from an uploaded image
    #[serde(default)]
    pub is_from_image: bool,
    /// Parent item (None = root item)
    #[serde(default)]
    pub parent_id: Option<ItemId>,
    /// Raw input that produced this item
    #[serde(default)]
    pub original_text: String,
    // Maintained by the store
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ScheduleItem {
    /// Check if this is a root item (no parent)
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled_date.is_some()
    }
}

/// Item contents before the store assigns an id and timestamps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewScheduleItem {
    pub user_id: UserId,
    pub title: String,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub estimated_duration: Option<u32>,
    pub location: Option<String>,
    pub is_completed: bool,
    pub is_from_image: bool,
    pub parent_id: Option<ItemId>,
    pub original_text: String,
}

impl NewScheduleItem {
    /// Root or child item built from a parser draft (subtasks are not included)
    pub fn from_draft(
        user_id: UserId,
        draft: &ParsedDraft,
        parent_id: Option<ItemId>,
        is_from_image: bool,
    ) -> Self {
        let title = if draft.title.trim().is_empty() {
            draft.original_text.trim().to_string()
        } else {
            draft.title.trim().to_string()
        };
        Self {
            user_id,
            title,
            scheduled_date: draft.scheduled_date,
            estimated_duration: draft.estimated_duration,
            location: draft.location.clone(),
            is_completed: false,
            is_from_image,
            parent_id,
            original_text: draft.original_text.clone(),
        }
    }

    /// Materialize as a stored item
    pub fn into_item(self, id: ItemId, now: DateTime<Utc>) -> ScheduleItem {
        ScheduleItem {
            id,
            user_id: self.user_id,
            title: self.title,
            scheduled_date: self.scheduled_date,
            estimated_duration: self.estimated_duration,
            location: self.location,
            is_completed: self.is_completed,
            is_from_image: self.is_from_image,
            parent_id: self.parent_id,
            original_text: self.original_text,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }
}

/// Partial update; `None` leaves a field untouched.
///
/// Nullable fields use `Option<Option<_>>` so they can be cleared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduleUpdate {
    pub title: Option<String>,
    pub scheduled_date: Option<Option<DateTime<Utc>>>,
    pub estimated_duration: Option<Option<u32>>,
    pub location: Option<Option<String>>,
    pub parent_id: Option<Option<ItemId>>,
    pub is_completed: Option<bool>,
}

impl ScheduleUpdate {
    pub fn title(title: impl Into<String>) -> Self {
        Self { title: Some(title.into()), ..Default::default() }
    }

    pub fn scheduled_date(date: Option<DateTime<Utc>>) -> Self {
        Self { scheduled_date: Some(date), ..Default::default() }
    }

    pub fn parent(parent_id: Option<ItemId>) -> Self {
        Self { parent_id: Some(parent_id), ..Default::default() }
    }

    pub fn completed(is_completed: bool) -> Self {
        Self { is_completed: Some(is_completed), ..Default::default() }
    }

    pub fn is_empty(&self) -> bool {
        self.field_paths().is_empty()
    }

    /// Document field names touched by this update
    pub fn field_paths(&self) -> Vec<&'static str> {
        let mut paths = Vec::new();
        if self.title.is_some() {
            paths.push("title");
        }
        if self.scheduled_date.is_some() {
            paths.push("scheduledDate");
        }
        if self.estimated_duration.is_some() {
            paths.push("estimatedDuration");
        }
        if self.location.is_some() {
            paths.push("location");
        }
        if self.parent_id.is_some() {
            paths.push("parentId");
        }
        if self.is_completed.is_some() {
            paths.push("isCompleted");
        }
        paths
    }

    /// Apply to an in-memory copy (timestamps are the caller's job)
    pub fn apply_to(&self, item: &mut ScheduleItem) {
        if let Some(title) = &self.title {
            item.title = title.clone();
        }
        if let Some(date) = self.scheduled_date {
            item.scheduled_date = date;
        }
        if let Some(duration) = self.estimated_duration {
            item.estimated_duration = duration;
        }
        if let Some(location) = &self.location {
            item.location = location.clone();
        }
        if let Some(parent_id) = &self.parent_id {
            item.parent_id = parent_id.clone();
        }
        if let Some(done) = self.is_completed {
            item.is_completed = done;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn draft(title: &str) -> ParsedDraft {
        ParsedDraft {
            title: title.to_string(),
            scheduled_date: Some(Utc.with_ymd_and_hms(2024, 1, 20, 6, 0, 0).unwrap()),
            estimated_duration: Some(60),
            location: Some("渋谷".to_string()),
            original_text: "明日15時に渋谷で会議".to_string(),
            subtasks: Vec::new(),
        }
    }

    #[test]
    fn test_new_item_from_draft() {
        let new_item = NewScheduleItem::from_draft(UserId::from("u1"), &draft("会議"), None, false);
        assert_eq!(new_item.title, "会議");
        assert_eq!(new_item.location.as_deref(), Some("渋谷"));
        assert!(!new_item.is_completed);

        let item = new_item.into_item(ItemId::from("a"), Utc::now());
        assert!(item.is_root());
        assert!(item.is_scheduled());
        assert_eq!(item.created_at, item.updated_at);
    }

    #[test]
    fn test_blank_draft_title_falls_back_to_original_text() {
        let new_item = NewScheduleItem::from_draft(UserId::from("u1"), &draft("  "), Some(ItemId::from("p")), true);
        assert_eq!(new_item.title, "明日15時に渋谷で会議");
        assert_eq!(new_item.parent_id, Some(ItemId::from("p")));
        assert!(new_item.is_from_image);
    }

    #[test]
    fn test_update_field_paths_and_apply() {
        let mut item = NewScheduleItem::from_draft(UserId::from("u1"), &draft("会議"), None, false)
            .into_item(ItemId::from("a"), Utc::now());

        let update = ScheduleUpdate {
            title: Some("打ち合わせ".to_string()),
            scheduled_date: Some(None),
            ..Default::default()
        };
        assert_eq!(update.field_paths(), vec!["title", "scheduledDate"]);

        update.apply_to(&mut item);
        assert_eq!(item.title, "打ち合わせ");
        assert!(item.scheduled_date.is_none());
        assert_eq!(item.estimated_duration, Some(60));
        assert!(ScheduleUpdate::default().is_empty());
    }

    #[test]
    fn test_item_serializes_camel_case() {
        let item = NewScheduleItem::from_draft(UserId::from("u1"), &draft("会議"), None, false)
            .into_item(ItemId::from("a"), Utc::now());
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["isCompleted"], false);
        assert!(json.get("scheduledDate").is_some());
    }
}
