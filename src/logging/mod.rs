//! Logging infrastructure for structured console and file output.

mod file;
mod logger;
mod subscriber;
mod types;

pub use logger::Logger;
pub use subscriber::init_subscriber;
pub use types::{EntryStatus, Log, SummaryEntry};
