//! Host notification surface.
//!
//! Implement [`SessionHooks`] to observe a task run. Three independent
//! notifications flow out of the engine:
//!
//! - **message observed**: synchronous, fire-and-forget; fired the moment a
//!   message is dequeued for delivery.
//! - **message received**: asynchronous and *awaited*. The dispatcher will
//!   not deliver the next message until this returns. This is where hosts do
//!   their real per-message processing.
//! - **task completed**: fired exactly once per
//!   [`start_task`](crate::Orchestrator::start_task), whether the run
//!   succeeded, failed, or was cancelled.
//!
//! All methods have default no-op implementations, so you only override what
//! you care about. The handler is shared as `Arc<dyn SessionHooks>` across
//! the dispatcher and the orchestrator.
//!
//! Hosts that process messages on their own run loop should not implement
//! the awaited hook directly; use [`host_channel`](crate::host::host_channel)
//! and drain the request channel instead.
//!
//! # Example
//!
//! ```
//! use async_trait::async_trait;
//! use roundtable::{ChatMessage, HookError, SessionHooks};
//!
//! struct Printer;
//!
//! #[async_trait]
//! impl SessionHooks for Printer {
//!     fn on_message_observed(&self, sender: &str, content: &str) {
//!         println!("{}: {}", sender, content);
//!     }
//!
//!     async fn on_message_received(&self, _message: &ChatMessage) -> Result<(), HookError> {
//!         Ok(())
//!     }
//! }
//! ```

use crate::roundtable::message::ChatMessage;
use async_trait::async_trait;
use std::error::Error;

/// Type alias for a Send-able boxed consumer fault.
pub type HookError = Box<dyn Error + Send + Sync>;

/// Callbacks a host registers to receive the message stream of a task run.
#[async_trait]
pub trait SessionHooks: Send + Sync {
    /// A message was dequeued for delivery. Synchronous and fire-and-forget;
    /// keep it cheap. `content` is empty for non-content message kinds.
    fn on_message_observed(&self, _sender: &str, _content: &str) {}

    /// Process one delivered message. The dispatcher blocks until this
    /// returns; an `Err` is a consumer fault handled according to the
    /// configured [`ConsumerFaultPolicy`](crate::ConsumerFaultPolicy).
    async fn on_message_received(&self, _message: &ChatMessage) -> Result<(), HookError> {
        Ok(())
    }

    /// The task run finished draining. Fired exactly once per run.
    fn on_task_completed(&self) {}
}

/// A handler that ignores every notification.
pub struct NoopHooks;

#[async_trait]
impl SessionHooks for NoopHooks {}
