//! # Baton Stream
//!
//! The consumer-facing event surface of a task run: ordered [`TaskEvent`]
//! frames produced into a bounded channel, a publisher that enforces the
//! single-terminal-frame contract, and per-consumer visibility filtering
//! with unconditional redaction.

pub mod event;
pub mod publisher;
pub mod visibility;

pub use event::TaskEvent;
pub use publisher::{DEFAULT_CHANNEL_CAPACITY, TaskPublisher};
pub use visibility::{EventFilter, Redactor, passes};
