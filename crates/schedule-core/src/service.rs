//! Schedule Service
//!
//! Every user intent goes through here: the injected store and parser are
//! the only collaborators. Cheap to clone (shared `Rc`s).

use chrono::{DateTime, Utc};
use std::rc::Rc;

use crate::domain::{ItemId, NewScheduleItem, ParsedDraft, ScheduleItem, ScheduleUpdate, UserId};
use crate::error::{ServiceError, ServiceResult};
use crate::gesture::DeletePolicy;
use crate::parser::ScheduleParser;
use crate::repository::{ScheduleStore, Subscription};
use crate::tree::{children_of, find_item, plan_reparent, DropZone};

#[derive(Clone)]
pub struct ScheduleService {
    store: Rc<dyn ScheduleStore>,
    parser: Rc<dyn ScheduleParser>,
    user_id: UserId,
    delete_policy: DeletePolicy,
}

impl ScheduleService {
    pub fn new(store: Rc<dyn ScheduleStore>, parser: Rc<dyn ScheduleParser>, user_id: UserId) -> Self {
        Self {
            store,
            parser,
            user_id,
            delete_policy: DeletePolicy::default(),
        }
    }

    pub fn with_delete_policy(mut self, policy: DeletePolicy) -> Self {
        self.delete_policy = policy;
        self
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn delete_policy(&self) -> DeletePolicy {
        self.delete_policy
    }

    pub fn supports_images(&self) -> bool {
        self.parser.supports_images()
    }

    pub async fn subscribe(&self) -> ServiceResult<Subscription> {
        Ok(self.store.subscribe(&self.user_id).await?)
    }

    pub async fn refresh(&self) -> ServiceResult<()> {
        Ok(self.store.refresh(&self.user_id).await?)
    }

    /// Parse free text and persist the result under `parent` (None = root).
    ///
    /// A parser failure still creates an unscheduled item titled with the
    /// input. Returns the root id followed by any subtask ids.
    pub async fn add_from_text(&self, text: &str, parent: Option<&ItemId>) -> ServiceResult<Vec<ItemId>> {
        let draft = self.draft_from_text(text).await?;
        self.create_from_draft(&draft, parent.cloned(), false).await
    }

    /// Parse without persisting; parser failures yield a literal draft
    pub async fn draft_from_text(&self, text: &str) -> ServiceResult<ParsedDraft> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ServiceError::InvalidInput("schedule text is empty".to_string()));
        }

        match self.parser.parse_text(text).await {
            Ok(draft) => Ok(draft),
            Err(e) => {
                tracing::warn!("parse failed, keeping text as title: {}", e);
                Ok(ParsedDraft::literal(text))
            }
        }
    }

    /// Extract a schedule from an image. Parser errors are returned as-is.
    pub async fn add_from_image(&self, bytes: &[u8], mime: &str) -> ServiceResult<Vec<ItemId>> {
        let draft = self.draft_from_image(bytes, mime).await?;
        self.create_from_draft(&draft, None, true).await
    }

    pub async fn draft_from_image(&self, bytes: &[u8], mime: &str) -> ServiceResult<ParsedDraft> {
        if bytes.is_empty() {
            return Err(ServiceError::InvalidInput("image is empty".to_string()));
        }
        Ok(self.parser.parse_image(bytes, mime).await?)
    }

    /// Persist a draft as one item plus one child per subtask
    pub async fn create_from_draft(
        &self,
        draft: &ParsedDraft,
        parent: Option<ItemId>,
        is_from_image: bool,
    ) -> ServiceResult<Vec<ItemId>> {
        let root = NewScheduleItem::from_draft(self.user_id.clone(), draft, parent, is_from_image);
        if root.title.is_empty() {
            return Err(ServiceError::InvalidInput("schedule title is empty".to_string()));
        }
        let root_id = self.store.create(root).await?;

        let mut ids = vec![root_id.clone()];
        for subtask in &draft.subtasks {
            let child =
                NewScheduleItem::from_draft(self.user_id.clone(), subtask, Some(root_id.clone()), is_from_image);
            if child.title.is_empty() {
                continue;
            }
            match self.store.create(child).await {
                Ok(id) => ids.push(id),
                Err(e) => {
                    self.discard_created(&ids).await;
                    return Err(e.into());
                }
            }
        }
        tracing::info!(item_id = %root_id, subtasks = ids.len() - 1, "created schedule");
        Ok(ids)
    }

    /// Remove a partially stored draft, newest first, so a retry does not duplicate it
    async fn discard_created(&self, ids: &[ItemId]) {
        for id in ids.iter().rev() {
            if let Err(e) = self.store.delete(id).await {
                tracing::warn!(item_id = %id, "could not roll back created schedule: {}", e);
            }
        }
    }

    pub async fn set_completed(&self, id: &ItemId, completed: bool) -> ServiceResult<()> {
        self.store.set_completed(id, completed).await?;
        tracing::debug!(item_id = %id, completed, "completion changed");
        Ok(())
    }

    pub async fn edit_title(&self, id: &ItemId, title: &str) -> ServiceResult<()> {
        self.save_edit(id, title, None).await
    }

    pub async fn edit_date(&self, id: &ItemId, date: Option<DateTime<Utc>>) -> ServiceResult<()> {
        Ok(self.store.update(id, ScheduleUpdate::scheduled_date(date)).await?)
    }

    /// Quick-edit save: title always, date only when given as `Some(..)`
    pub async fn save_edit(
        &self,
        id: &ItemId,
        title: &str,
        date: Option<Option<DateTime<Utc>>>,
    ) -> ServiceResult<()> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ServiceError::InvalidInput("title must not be empty".to_string()));
        }
        let update = ScheduleUpdate {
            title: Some(title.to_string()),
            scheduled_date: date,
            ..Default::default()
        };
        Ok(self.store.update(id, update).await?)
    }

    pub fn can_delete(&self, item: &ScheduleItem) -> bool {
        self.delete_policy.allows(item.is_completed)
    }

    /// Delete after the user confirmed.
    ///
    /// Direct children move up to the deleted item's parent first. Returns
    /// false (and does nothing) for unknown ids or items the policy protects.
    pub async fn delete(&self, snapshot: &[ScheduleItem], id: &ItemId) -> ServiceResult<bool> {
        let Some(item) = find_item(snapshot, id) else {
            return Ok(false);
        };
        if !self.can_delete(item) {
            tracing::debug!(item_id = %id, "delete refused by policy");
            return Ok(false);
        }

        for child in children_of(snapshot, id) {
            self.store
                .update(&child.id, ScheduleUpdate::parent(item.parent_id.clone()))
                .await?;
        }
        self.store.delete(id).await?;
        tracing::info!(item_id = %id, "deleted schedule");
        Ok(true)
    }

    /// Apply a drop. Invalid drops (self, descendant, completed item) are
    /// ignored and return false.
    pub async fn reparent(
        &self,
        snapshot: &[ScheduleItem],
        dragged: &ItemId,
        target: &ItemId,
        zone: DropZone,
    ) -> ServiceResult<bool> {
        if find_item(snapshot, dragged).is_some_and(|item| item.is_completed) {
            return Ok(false);
        }
        let Some(plan) = plan_reparent(snapshot, dragged, target, zone) else {
            return Ok(false);
        };
        self.store
            .update(&plan.item_id, ScheduleUpdate::parent(plan.new_parent.clone()))
            .await?;
        tracing::info!(item_id = %plan.item_id, zone = ?plan.zone, "re-parented schedule");
        Ok(true)
    }
}
