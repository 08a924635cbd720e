//! # Roundtable
//!
//! Roundtable is a turn-based multi-agent conversation engine. A fixed roster
//! of autonomous agents exchanges messages over a predicate-routed transition
//! graph, and the resulting stream is handed to a single downstream consumer
//! under strict ordering and at-most-one-task-in-flight guarantees.
//!
//! The crate provides carefully layered abstractions for:
//!
//! * **Agent capability boundary**: the [`Agent`] trait. Given prior history
//!   and a round budget, a participant asynchronously produces a finite
//!   stream of messages. Backends (remote models, scripted actors, test
//!   doubles) live outside the crate and plug in via [`AgentFactory`].
//! * **Predicate routing**: [`RoutingGraph`] builds the complete N² transition
//!   graph over a roster; an edge `(from, to)` is traversable exactly when the
//!   most recent message contains the literal `[N:<to>]` addressing marker.
//! * **Task lifecycle**: [`Orchestrator`] enforces single-flight task runs,
//!   links the exchange driver and the dispatcher under one cancellation
//!   scope, and always tears down cleanly.
//! * **Bounded resilience**: the [`ExchangeDriver`](exchange::ExchangeDriver)
//!   retries timeouts and backend faults with fixed backoff up to a
//!   configurable budget, under a sliding per-message timeout that resets on
//!   every produced message.
//! * **Strictly ordered delivery**: the [`Dispatcher`](dispatch::Dispatcher)
//!   drains the delivery queue one message at a time, never dequeuing the
//!   next until the host has finished processing the previous one.
//! * **Persistence boundary**: [`SerializedHistory`] exports and imports the
//!   message log for external storage without coupling to any database.
//!
//! ## Getting Started
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use roundtable::{AgentSpec, EngineConfig, Orchestrator};
//! use roundtable::host::host_channel;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example(factory: Arc<dyn roundtable::AgentFactory>) {
//! roundtable::init_logger();
//!
//! let config = EngineConfig::from_env().with_credential("anthropic", "sk-...");
//! let (gate, mut host) = host_channel();
//! let mut orchestrator = Orchestrator::new(config, Arc::new(gate));
//!
//! let roster = vec![
//!     AgentSpec::new("Alice", "wry and cautious", "anthropic", "claude-sonnet-4-5"),
//!     AgentSpec::new("Bob", "loud and reckless", "anthropic", "claude-sonnet-4-5"),
//! ];
//! orchestrator.initialize(&roster, factory.as_ref()).await.unwrap();
//!
//! // Drain deliveries on your own loop while the task runs.
//! tokio::spawn(async move {
//!     while let Some(request) = host.requests.recv().await {
//!         println!("{}", request.message().text_content().unwrap_or(""));
//!         request.complete(Ok(()));
//!     }
//! });
//!
//! let ok = orchestrator
//!     .start_task("The scene opens. [N:Alice]", 5, CancellationToken::new())
//!     .await;
//! println!("finished: {}", ok);
//! # }
//! ```
//!
//! Continue exploring the modules re-exported from the crate root for the
//! individual pieces.

use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Initialise the global [`env_logger`] subscriber exactly once.
///
/// The helper is intentionally lightweight so that applications embedding
/// roundtable can opt-in to simple `RUST_LOG` driven diagnostics without
/// having to choose a specific logging backend upfront.
///
/// ```rust
/// roundtable::init_logger();
/// log::info!("Logger is ready");
/// ```
pub fn init_logger() {
    INIT_LOGGER.call_once(|| {
        env_logger::init();
    });
}

// Import the top-level `roundtable` module.
pub mod roundtable;

// Re-exporting key items for easier external access.
pub use crate::roundtable::agent::{
    stream_from_messages, Agent, AgentError, AgentFactory, AgentSpec, DirectorAgent,
    MessageStream,
};
pub use crate::roundtable::config::{ConsumerFaultPolicy, EngineConfig};
pub use crate::roundtable::dispatch;
pub use crate::roundtable::dispatch::Dispatcher;
pub use crate::roundtable::error::OrchestratorError;
pub use crate::roundtable::event::{HookError, NoopHooks, SessionHooks};
pub use crate::roundtable::exchange;
pub use crate::roundtable::exchange::{ExchangeDriver, ExchangeOutcome};
pub use crate::roundtable::history::HistoryStore;
pub use crate::roundtable::host;
pub use crate::roundtable::host::{host_channel, DispatchRequest, HostGate, HostReceiver};
pub use crate::roundtable::message::{
    ChatMessage, MediaMessage, Role, SerializedHistory, SerializedMessage, TextMessage,
    CONTROL_TAG,
};
pub use crate::roundtable::orchestrator::Orchestrator;
pub use crate::roundtable::routing::{RoutingEdge, RoutingGraph};
pub use crate::roundtable::text;
