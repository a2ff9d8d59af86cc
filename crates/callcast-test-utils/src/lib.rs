//! Test helpers shared across callcast crates.

pub mod clock;
pub mod payloads;
pub mod subscriber;

pub use clock::ManualClock;
pub use payloads::{call_event, status_update, transcript_event, transcript_record};
pub use subscriber::RecordingSubscriber;
