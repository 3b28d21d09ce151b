//! Application Context
//!
//! Shared state provided via Leptos Context API.

use leptos::prelude::*;
use rolling_logger::LogBuffer;
use schedule_core::{ItemId, ScheduleItem, ScheduleService, ViewOptions};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// Non-blocking message shown above the timeline
#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

/// Which field the quick edit dialog is changing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditField {
    Title,
    Date,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EditRequest {
    pub item: ScheduleItem,
    pub field: EditField,
}

/// App-wide handles provided via context
#[derive(Clone, Copy)]
pub struct AppContext {
    /// Holds `Rc` collaborators, so it lives in local storage
    service: StoredValue<ScheduleService, LocalStorage>,
    pub view: StoredValue<ViewOptions>,
    pub logs: StoredValue<LogBuffer>,
    pub notice: RwSignal<Option<Notice>>,
    /// Add modal state: None = closed, Some(None) = new root, Some(Some(id)) = subtask of id
    pub adding: RwSignal<Option<Option<ItemId>>>,
    pub editing: RwSignal<Option<EditRequest>>,
}

impl AppContext {
    pub fn new(service: ScheduleService, view: ViewOptions, logs: LogBuffer) -> Self {
        Self {
            service: StoredValue::new_local(service),
            view: StoredValue::new(view),
            logs: StoredValue::new(logs),
            notice: RwSignal::new(None),
            adding: RwSignal::new(None),
            editing: RwSignal::new(None),
        }
    }

    pub fn service(&self) -> ScheduleService {
        self.service.get_value()
    }

    pub fn view_options(&self) -> ViewOptions {
        self.view.get_value()
    }

    pub fn notify_error(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{}", message);
        self.notice.set(Some(Notice { kind: NoticeKind::Error, message }));
    }

    pub fn notify_info(&self, message: impl Into<String>) {
        self.notice.set(Some(Notice { kind: NoticeKind::Info, message: message.into() }));
    }

    pub fn dismiss_notice(&self) {
        self.notice.set(None);
    }

    /// Open the add modal for a root item or a subtask
    pub fn open_add(&self, parent_id: Option<ItemId>) {
        self.adding.set(Some(parent_id));
    }

    pub fn close_add(&self) {
        self.adding.set(None);
    }

    pub fn open_edit(&self, item: ScheduleItem, field: EditField) {
        self.editing.set(Some(EditRequest { item, field }));
    }

    pub fn close_edit(&self) {
        self.editing.set(None);
    }
}
