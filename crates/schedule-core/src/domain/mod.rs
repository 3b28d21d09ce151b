//! Domain Layer
//!
//! Schedule entities and the parser draft they are created from.
//! No I/O lives here.

mod draft;
mod ids;
mod schedule_item;

pub use draft::ParsedDraft;
pub use ids::{ItemId, UserId};
pub use schedule_item::{NewScheduleItem, ScheduleItem, ScheduleUpdate};
