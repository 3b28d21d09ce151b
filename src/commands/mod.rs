//! Schedule Command Wrappers
//!
//! Async entry points the components call, organized by concern. Errors
//! come back as display strings for the notice bar.

mod dialog;
mod files;
mod schedule;

pub use dialog::*;
pub use files::*;
pub use schedule::*;
