//! Sequential message dispatch.
//!
//! The delivery queue between the exchange driver and the dispatcher is a
//! single-producer/single-consumer unbounded channel: the driver pushes each
//! message the moment it arrives, and dropping the sender marks production as
//! complete. [`Dispatcher::drain`] consumes the queue strictly in arrival
//! order and never dequeues message *k+1* before the host has finished
//! processing message *k*. Production can be bursty; delivery is one at a
//! time.
//!
//! Per dequeued message the dispatcher fires the synchronous
//! [`on_message_observed`](crate::SessionHooks::on_message_observed) hook and
//! then awaits [`on_message_received`](crate::SessionHooks::on_message_received).
//! A hook error is a consumer fault: logged and skipped under
//! [`ConsumerFaultPolicy::Continue`], or escalated to a cancellation of the
//! whole run under [`ConsumerFaultPolicy::CancelTask`]. Cancellation drops
//! any still-buffered messages undelivered. Exactly one task-completed
//! notification fires per drain, however it ends.

use crate::roundtable::config::ConsumerFaultPolicy;
use crate::roundtable::event::SessionHooks;
use crate::roundtable::message::ChatMessage;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Drains the delivery queue for one task run.
pub struct Dispatcher {
    hooks: Arc<dyn SessionHooks>,
    fault_policy: ConsumerFaultPolicy,
}

impl Dispatcher {
    pub fn new(hooks: Arc<dyn SessionHooks>, fault_policy: ConsumerFaultPolicy) -> Self {
        Dispatcher {
            hooks,
            fault_policy,
        }
    }

    /// Consume the queue until it is empty and production is complete, or
    /// until cancellation. Returns how many messages were delivered.
    pub async fn drain(
        &self,
        mut queue: mpsc::UnboundedReceiver<ChatMessage>,
        cancel: CancellationToken,
    ) -> usize {
        let mut delivered = 0;

        loop {
            // cancellation wins over a ready message
            let message = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                next = queue.recv() => match next {
                    Some(message) => message,
                    // sender dropped and buffer empty: receiving complete
                    None => break,
                },
            };

            let sender = message.from().to_string();
            let content = message.text_content().unwrap_or("").to_string();
            self.hooks.on_message_observed(&sender, &content);

            let processed = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                result = self.hooks.on_message_received(&message) => result,
            };

            match processed {
                Ok(()) => delivered += 1,
                Err(e) => {
                    log::error!("Message processing error for {}: {}", sender, e);
                    if self.fault_policy == ConsumerFaultPolicy::CancelTask {
                        cancel.cancel();
                        break;
                    }
                }
            }
        }

        // drop whatever is still buffered, undelivered
        queue.close();
        while queue.try_recv().is_ok() {}

        if cancel.is_cancelled() {
            log::info!("Message queue processing cancelled");
        }
        self.hooks.on_task_completed();
        delivered
    }
}
