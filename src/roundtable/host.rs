//! Marshalling messages onto a host run loop.
//!
//! Engines usually run on a tokio worker while the host processes messages
//! somewhere else entirely (a game loop, a UI thread). [`host_channel`] builds
//! that bridge as explicit request/response plumbing: the engine side is a
//! [`HostGate`] implementing [`SessionHooks`], the host side a
//! [`HostReceiver`] with three independent channels: observed lines,
//! awaited delivery requests, and the completion signal.
//!
//! The dispatcher stays blocked on each [`DispatchRequest`] until the host
//! calls [`DispatchRequest::complete`], which is what enforces one-message-
//! at-a-time delivery across execution contexts. Dropping a request without
//! completing it (or dropping the whole receiver) surfaces to the dispatcher
//! as a consumer fault rather than a hang.
//!
//! # Example
//!
//! ```
//! use roundtable::host::host_channel;
//!
//! # async fn example() {
//! let (gate, mut host) = host_channel();
//! // hand `gate` to Orchestrator::new(...), then drain on your own loop:
//! while let Some(request) = host.requests.recv().await {
//!     println!("processing {}", request.message().from());
//!     request.complete(Ok(()));
//! }
//! # }
//! ```

use crate::roundtable::event::{HookError, SessionHooks};
use crate::roundtable::message::ChatMessage;
use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

/// One awaited delivery: a message plus the completion signal the host fires
/// when it has finished processing it.
pub struct DispatchRequest {
    message: ChatMessage,
    done: oneshot::Sender<Result<(), HookError>>,
}

impl DispatchRequest {
    pub fn message(&self) -> &ChatMessage {
        &self.message
    }

    /// Consume the request, unblocking the dispatcher with `result`.
    pub fn complete(self, result: Result<(), HookError>) {
        let _ = self.done.send(result);
    }
}

/// Engine-side endpoint; implements [`SessionHooks`] by forwarding each
/// notification over its channel.
pub struct HostGate {
    observed_tx: mpsc::UnboundedSender<(String, String)>,
    requests_tx: mpsc::UnboundedSender<DispatchRequest>,
    completed_tx: mpsc::UnboundedSender<()>,
}

/// Host-side endpoint: three independent receivers, one per notification.
pub struct HostReceiver {
    /// `(sender, content)` pairs, fire-and-forget.
    pub observed: mpsc::UnboundedReceiver<(String, String)>,
    /// Awaited deliveries; ack each one via [`DispatchRequest::complete`].
    pub requests: mpsc::UnboundedReceiver<DispatchRequest>,
    /// One `()` per finished task run.
    pub completed: mpsc::UnboundedReceiver<()>,
}

/// Create a connected [`HostGate`]/[`HostReceiver`] pair.
pub fn host_channel() -> (HostGate, HostReceiver) {
    let (observed_tx, observed) = mpsc::unbounded_channel();
    let (requests_tx, requests) = mpsc::unbounded_channel();
    let (completed_tx, completed) = mpsc::unbounded_channel();
    (
        HostGate {
            observed_tx,
            requests_tx,
            completed_tx,
        },
        HostReceiver {
            observed,
            requests,
            completed,
        },
    )
}

#[async_trait]
impl SessionHooks for HostGate {
    fn on_message_observed(&self, sender: &str, content: &str) {
        let _ = self
            .observed_tx
            .send((sender.to_string(), content.to_string()));
    }

    async fn on_message_received(&self, message: &ChatMessage) -> Result<(), HookError> {
        let (done, ack) = oneshot::channel();
        let request = DispatchRequest {
            message: message.clone(),
            done,
        };
        self.requests_tx
            .send(request)
            .map_err(|_| -> HookError { "host receiver dropped".into() })?;
        match ack.await {
            Ok(result) => result,
            Err(_) => Err("host dropped delivery request without completing it".into()),
        }
    }

    fn on_task_completed(&self) {
        let _ = self.completed_tx.send(());
    }
}
