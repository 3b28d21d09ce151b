//! Schedule Core
//!
//! Model, ordering and tree rules, interaction state machines, and the
//! store/parser collaborators behind the schedule client. Nothing here
//! touches the DOM, so all of it runs under native tests.

pub mod completion;
pub mod config;
pub mod domain;
pub mod error;
pub mod gesture;
pub mod parser;
pub mod repository;
pub mod service;
pub mod ticket;
pub mod time_format;
pub mod tree;

pub use completion::{CompletionEffect, CompletionMachine, CompletionPhase, COMPLETION_DELAY_MS};
pub use config::{AppConfig, ConfigError, ParserConfig, StoreConfig, ViewOptions};
pub use domain::{ItemId, NewScheduleItem, ParsedDraft, ScheduleItem, ScheduleUpdate, UserId};
pub use error::{ParserError, ServiceError, StoreError};
pub use gesture::{DeletePolicy, SwipeIntent, SwipeTracker};
pub use parser::{GeminiConfig, GeminiParser, LiteralParser, ScheduleParser};
pub use repository::{FirestoreConfig, FirestoreStore, MemoryStore, ScheduleStore, Subscription};
pub use service::ScheduleService;
pub use ticket::{Ticket, TicketCounter};
pub use time_format::{AbsoluteTime, RelativeTime};
pub use tree::{timeline_rows, DropZone, ExpansionState, RowKey, TreeRow};
