//! UI Components
//!
//! Reusable Leptos components.

mod add_schedule_modal;
mod delete_schedule_button;
mod log_panel;
mod notice_bar;
mod quick_edit_dialog;
mod schedule_card;
mod schedule_tree_view;
mod timeline_header;

pub use add_schedule_modal::AddScheduleModal;
pub use delete_schedule_button::DeleteScheduleButton;
pub use log_panel::LogPanel;
pub use notice_bar::NoticeBar;
pub use quick_edit_dialog::QuickEditDialog;
pub use schedule_card::ScheduleCard;
pub use schedule_tree_view::ScheduleTreeView;
pub use timeline_header::TimelineHeader;
