//! Task lifecycle façade.
//!
//! The [`Orchestrator`] owns the roster, the routing graph, and the history
//! store, and exposes the task API the host drives:
//!
//! - [`initialize`](Orchestrator::initialize): resolve credentials, build
//!   every agent through an [`AgentFactory`](crate::AgentFactory), prepend
//!   the director proxy, and build the routing graph.
//! - [`start_task`](Orchestrator::start_task): inject a task message and run
//!   one exchange, streaming results to the registered
//!   [`SessionHooks`](crate::SessionHooks). At most one task run is active at
//!   any instant; a second call while busy is rejected with no side effects.
//! - [`cancel_current_task`](Orchestrator::cancel_current_task): idempotent
//!   cancellation of the active run.
//! - history accessors and the export/import persistence boundary.
//!
//! One task run wires the exchange driver and the dispatcher together through
//! an unbounded delivery queue and a linked cancellation scope, awaits both,
//! and always tears down: the in-flight flag resets and leftover queue
//! entries are dropped regardless of outcome.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use roundtable::{AgentSpec, EngineConfig, NoopHooks, Orchestrator};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example(factory: Arc<dyn roundtable::AgentFactory>) {
//! let config = EngineConfig::from_env().with_credential("anthropic", "sk-...");
//! let mut orchestrator = Orchestrator::new(config, Arc::new(NoopHooks));
//!
//! let roster = vec![
//!     AgentSpec::new("Alice", "wry and cautious", "anthropic", "claude-sonnet-4-5"),
//!     AgentSpec::new("Bob", "loud and reckless", "anthropic", "claude-sonnet-4-5"),
//! ];
//! orchestrator.initialize(&roster, factory.as_ref()).await.unwrap();
//!
//! let ok = orchestrator
//!     .start_task("Scene opens at the docks. [N:Alice]", 5, CancellationToken::new())
//!     .await;
//! println!("task finished: {}", ok);
//! # }
//! ```

use crate::roundtable::agent::{Agent, AgentFactory, AgentSpec, DirectorAgent};
use crate::roundtable::config::EngineConfig;
use crate::roundtable::dispatch::Dispatcher;
use crate::roundtable::error::OrchestratorError;
use crate::roundtable::event::SessionHooks;
use crate::roundtable::exchange::ExchangeDriver;
use crate::roundtable::history::HistoryStore;
use crate::roundtable::message::{ChatMessage, Role, SerializedHistory};
use crate::roundtable::routing::RoutingGraph;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// The public façade over the orchestration engine.
pub struct Orchestrator {
    config: EngineConfig,
    hooks: Arc<dyn SessionHooks>,
    history: Arc<HistoryStore>,
    roster: Vec<Arc<dyn Agent>>,
    graph: Option<RoutingGraph>,
    is_processing: AtomicBool,
    current_cancel: Mutex<Option<CancellationToken>>,
}

impl Orchestrator {
    pub fn new(config: EngineConfig, hooks: Arc<dyn SessionHooks>) -> Self {
        Orchestrator {
            config,
            hooks,
            history: Arc::new(HistoryStore::new()),
            roster: Vec::new(),
            graph: None,
            is_processing: AtomicBool::new(false),
            current_cancel: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.graph.is_some()
    }

    /// Whether a task run is currently active.
    pub fn is_processing(&self) -> bool {
        self.is_processing.load(Ordering::SeqCst)
    }

    /// Participant names in roster order, director first. Empty before
    /// initialization.
    pub fn roster_names(&self) -> Vec<String> {
        self.roster.iter().map(|a| a.name().to_string()).collect()
    }

    /// Build the roster and the routing graph.
    ///
    /// Verifies that a credential is configured for every backend named in
    /// `specs`, then builds each agent through `factory`. Any failure leaves
    /// the orchestrator uninitialized and surfaces as
    /// [`OrchestratorError::Configuration`]. The graph is rebuilt from
    /// scratch on every successful call, so re-initializing with a new
    /// roster replaces the old one wholesale.
    pub async fn initialize(
        &mut self,
        specs: &[AgentSpec],
        factory: &dyn AgentFactory,
    ) -> Result<(), OrchestratorError> {
        if specs.is_empty() {
            return Err(OrchestratorError::Configuration("empty roster".into()));
        }

        let mut names: Vec<String> = Vec::with_capacity(specs.len() + 1);
        names.push(DirectorAgent::NAME.to_string());
        names.extend(specs.iter().map(|s| s.name.clone()));

        let mut roster: Vec<Arc<dyn Agent>> = Vec::with_capacity(specs.len() + 1);
        roster.push(Arc::new(DirectorAgent::new(specs[0].name.clone())));

        for spec in specs {
            let credential = self.config.credential(&spec.provider).ok_or_else(|| {
                OrchestratorError::Configuration(format!(
                    "missing credential for backend '{}'",
                    spec.provider
                ))
            })?;

            let agent = factory
                .build(spec, &names, credential)
                .await
                .map_err(|e| {
                    log::error!("Failed to create agent {}: {}", spec.name, e);
                    OrchestratorError::Configuration(format!(
                        "failed to build agent '{}': {}",
                        spec.name, e
                    ))
                })?;
            log::info!("Created {} agent: {}", spec.provider, spec.name);
            roster.push(agent);
        }

        self.graph = Some(RoutingGraph::build(&names));
        self.roster = roster;
        log::info!("Initialized with {} agents", self.roster.len());
        Ok(())
    }

    /// Start one task run. Returns `true` only if at least one message was
    /// produced and the dispatcher drained it without the run being
    /// cancelled.
    ///
    /// Rejects immediately (`false`, no side effects) when uninitialized
    /// or while another run is active. Otherwise purges control-tagged
    /// history, appends the task-injection message from the director, and
    /// runs the exchange driver and the dispatcher concurrently under one
    /// cancellation scope linked to `cancel`.
    pub async fn start_task(
        &self,
        content: &str,
        max_rounds: usize,
        cancel: CancellationToken,
    ) -> bool {
        let graph = match &self.graph {
            Some(graph) => graph.clone(),
            None => {
                log::error!("Not initialized");
                return false;
            }
        };

        if self
            .is_processing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            log::warn!("Task already running");
            return false;
        }

        let run_id = Uuid::new_v4();
        let scope = cancel.child_token();
        *self.current_cancel.lock().unwrap() = Some(scope.clone());

        let purged = self.history.purge_control_tagged();
        if purged > 0 {
            log::debug!("Purged {} control messages before task {}", purged, run_id);
        }
        self.history.append(ChatMessage::text(
            Role::Assistant,
            DirectorAgent::NAME,
            content,
        ));
        log::info!(
            "Task {}: sent '{}' from {}",
            run_id,
            content,
            DirectorAgent::NAME
        );

        let snapshot = self.history.snapshot();
        let (sink, queue) = mpsc::unbounded_channel();

        let driver = ExchangeDriver::new(
            &self.roster,
            graph,
            Arc::clone(&self.history),
            self.config.message_timeout(),
            self.config.max_retries,
            self.config.retry_delay(),
        );
        let driver_scope = scope.clone();
        let receiving = tokio::spawn(async move {
            driver
                .run(snapshot, max_rounds, sink, driver_scope)
                .await
        });

        let dispatcher = Dispatcher::new(Arc::clone(&self.hooks), self.config.consumer_fault_policy);
        let dispatch_scope = scope.clone();
        let dispatching =
            tokio::spawn(async move { dispatcher.drain(queue, dispatch_scope).await });

        let (outcome, delivered) = tokio::join!(receiving, dispatching);

        let success = match (&outcome, &delivered) {
            (Ok(outcome), Ok(delivered)) => {
                log::info!(
                    "Task {}: {} produced, {} delivered, success={}",
                    run_id,
                    outcome.messages_produced,
                    delivered,
                    outcome.success
                );
                if let Some(failure) = &outcome.failure {
                    log::warn!("Task {}: {}", run_id, failure);
                }
                outcome.success && !scope.is_cancelled()
            }
            _ => {
                log::error!("Task {}: a worker panicked or was aborted", run_id);
                false
            }
        };

        // teardown runs regardless of outcome
        *self.current_cancel.lock().unwrap() = None;
        self.is_processing.store(false, Ordering::SeqCst);

        success
    }

    /// Request cancellation of the active task run. Idempotent; a no-op when
    /// nothing is running.
    pub fn cancel_current_task(&self) {
        if let Some(token) = self.current_cancel.lock().unwrap().as_ref() {
            token.cancel();
        }
    }

    // ── History accessors ────────────────────────────────────────────────

    pub fn append_message(&self, message: ChatMessage) {
        self.history.append(message);
    }

    pub fn remove_message(&self, index: usize) {
        self.history.remove(index);
    }

    /// Atomic snapshot of the full message log.
    pub fn history(&self) -> Vec<ChatMessage> {
        self.history.snapshot()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn clear_history(&self) {
        self.history.clear();
    }

    // ── Persistence boundary ─────────────────────────────────────────────

    /// Snapshot the message log as its durable projection. Independent of
    /// any in-flight task.
    pub fn export_history(&self) -> SerializedHistory {
        SerializedHistory::from_messages(&self.history.snapshot())
    }

    /// Fully replace the message log from a durable projection.
    pub fn import_history(&self, serialized: SerializedHistory) {
        let messages = serialized.into_messages();
        let count = messages.len();
        self.history.replace(messages);
        log::info!("Finished message history restoration with: {} messages", count);
    }
}
