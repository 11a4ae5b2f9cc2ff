pub mod client;
pub mod messages;
pub mod recordings;

pub use client::{ApiTimeouts, HttpRecordingsApi};
pub use messages::CompletedPart;
pub use recordings::RecordingsApi;
