//! Session/broadcast core for callcast.
//!
//! This crate owns the call hub (transcript log, call table, subscriber set
//! and call expiry) and the webhook normalizer that feeds it.

pub mod clock;
pub mod error;
pub mod hub;
pub mod subscriber;
pub mod webhook;

pub use clock::{Clock, SystemClock};
pub use error::DeliveryError;
pub use hub::{BroadcastReport, CallHub};
pub use subscriber::{ChannelSubscriber, Subscriber};
pub use webhook::{SUPPORTED_EVENTS, WebhookEvent, WebhookOutcome, WebhookStatus, dispatch};
