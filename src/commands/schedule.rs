//! Schedule Commands
//!
//! Thin wrappers over `ScheduleService` with logging.

use chrono::{DateTime, Utc};
use schedule_core::{DropZone, ItemId, ParsedDraft, ScheduleItem, ScheduleService};

pub async fn refresh_schedules(service: &ScheduleService) -> Result<(), String> {
    service.refresh().await.map_err(|e| e.to_string())
}

/// Parse free text into a draft; nothing is stored yet
pub async fn parse_schedule_text(service: &ScheduleService, text: &str) -> Result<ParsedDraft, String> {
    service.draft_from_text(text).await.map_err(|e| e.to_string())
}

pub async fn parse_schedule_image(service: &ScheduleService, bytes: &[u8], mime: &str) -> Result<ParsedDraft, String> {
    tracing::debug!(bytes = bytes.len(), mime, "parsing schedule image");
    service.draft_from_image(bytes, mime).await.map_err(|e| e.to_string())
}

/// Store a draft and its subtasks under `parent_id` (None = root)
pub async fn create_schedule(
    service: &ScheduleService,
    draft: &ParsedDraft,
    parent_id: Option<ItemId>,
    is_from_image: bool,
) -> Result<Vec<ItemId>, String> {
    service
        .create_from_draft(draft, parent_id, is_from_image)
        .await
        .map_err(|e| e.to_string())
}

pub async fn set_schedule_completed(service: &ScheduleService, id: &ItemId, completed: bool) -> Result<(), String> {
    service.set_completed(id, completed).await.map_err(|e| e.to_string())
}

pub async fn update_schedule_title(service: &ScheduleService, id: &ItemId, title: &str) -> Result<(), String> {
    service.edit_title(id, title).await.map_err(|e| e.to_string())
}

pub async fn update_schedule_date(
    service: &ScheduleService,
    id: &ItemId,
    date: Option<DateTime<Utc>>,
) -> Result<(), String> {
    service.edit_date(id, date).await.map_err(|e| e.to_string())
}

/// Returns false when the delete policy protects the item
pub async fn delete_schedule(service: &ScheduleService, snapshot: &[ScheduleItem], id: &ItemId) -> Result<bool, String> {
    service.delete(snapshot, id).await.map_err(|e| e.to_string())
}

/// Returns false for drops that were ignored
pub async fn move_schedule(
    service: &ScheduleService,
    snapshot: &[ScheduleItem],
    dragged: &ItemId,
    target: &ItemId,
    zone: DropZone,
) -> Result<bool, String> {
    tracing::debug!(item_id = %dragged, target = %target, zone = ?zone, "drop");
    service
        .reparent(snapshot, dragged, target, zone)
        .await
        .map_err(|e| e.to_string())
}
