//! The exchange driver: one bounded multi-round exchange with retries.
//!
//! [`ExchangeDriver::run`] drives the roster against the routing graph
//! starting from a history snapshot. Messages stream out as they arrive:
//! each one is appended to the history store and pushed into the delivery
//! queue before the round finishes. The whole operation sits inside a bounded
//! attempt loop with fixed backoff, a sliding per-message timeout, and a
//! shared cancellation scope:
//!
//! - the timeout window resets every time a message is produced, so a long
//!   exchange of many fast messages never trips it, while an idle backend
//!   does;
//! - a timeout or backend fault burns one attempt and the loop retries from
//!   the original snapshot (messages already emitted stay emitted);
//! - cancellation (including during the backoff sleep) terminates the run
//!   immediately and is never retried.

use crate::roundtable::agent::Agent;
use crate::roundtable::error::OrchestratorError;
use crate::roundtable::history::HistoryStore;
use crate::roundtable::message::ChatMessage;
use crate::roundtable::routing::RoutingGraph;
use futures_util::StreamExt;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;

/// Result of one [`ExchangeDriver::run`] call.
#[derive(Debug)]
pub struct ExchangeOutcome {
    /// True when at least one message was produced and the stream ended
    /// naturally within the attempt budget.
    pub success: bool,
    /// Messages emitted downstream across all attempts of this run.
    pub messages_produced: usize,
    /// The terminal error when `success` is false.
    pub failure: Option<OrchestratorError>,
}

impl ExchangeOutcome {
    fn succeeded(messages_produced: usize) -> Self {
        ExchangeOutcome {
            success: true,
            messages_produced,
            failure: None,
        }
    }

    fn failed(messages_produced: usize, failure: OrchestratorError) -> Self {
        ExchangeOutcome {
            success: false,
            messages_produced,
            failure: Some(failure),
        }
    }
}

/// Drives multi-round exchanges for one task run.
///
/// The driver is the sole producer of the delivery queue; dropping its sender
/// at the end of `run` is the "receiving complete" signal the dispatcher
/// drains against.
pub struct ExchangeDriver {
    agents: HashMap<String, Arc<dyn Agent>>,
    graph: RoutingGraph,
    history: Arc<HistoryStore>,
    message_timeout: Duration,
    max_retries: u32,
    retry_delay: Duration,
}

impl ExchangeDriver {
    pub fn new(
        roster: &[Arc<dyn Agent>],
        graph: RoutingGraph,
        history: Arc<HistoryStore>,
        message_timeout: Duration,
        max_retries: u32,
        retry_delay: Duration,
    ) -> Self {
        let agents = roster
            .iter()
            .map(|a| (a.name().to_string(), Arc::clone(a)))
            .collect();
        ExchangeDriver {
            agents,
            graph,
            history,
            message_timeout,
            max_retries,
            retry_delay,
        }
    }

    /// Run the attempt loop to completion.
    ///
    /// Consumes the sink so its drop marks production as finished no matter
    /// how the run ends.
    pub async fn run(
        &self,
        snapshot: Vec<ChatMessage>,
        max_rounds: usize,
        sink: mpsc::UnboundedSender<ChatMessage>,
        cancel: CancellationToken,
    ) -> ExchangeOutcome {
        let mut last_error: Option<OrchestratorError> = None;
        let mut total_produced = 0;

        for attempt in 0..self.max_retries {
            if attempt > 0 {
                log::info!("Retrying... Attempt {}/{}", attempt + 1, self.max_retries);
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        return ExchangeOutcome::failed(total_produced, OrchestratorError::Cancelled);
                    }
                    _ = sleep(self.retry_delay) => {}
                }
            }

            match self
                .run_attempt(&snapshot, max_rounds, &sink, &cancel)
                .await
            {
                Ok(produced) => {
                    total_produced += produced;
                    if produced > 0 {
                        return ExchangeOutcome::succeeded(total_produced);
                    }
                    log::warn!("No messages received on attempt {}", attempt + 1);
                }
                Err(OrchestratorError::Cancelled) => {
                    return ExchangeOutcome::failed(total_produced, OrchestratorError::Cancelled);
                }
                Err(e) => {
                    match &e {
                        OrchestratorError::Timeout(_) => {
                            log::warn!("Timeout on attempt {}", attempt + 1)
                        }
                        other => log::error!("Error on attempt {}: {}", attempt + 1, other),
                    }
                    last_error = Some(e);
                }
            }
        }

        let failure = last_error.unwrap_or(OrchestratorError::NoResponse);
        log::error!("All retry attempts exhausted. Last error: {}", failure);
        ExchangeOutcome::failed(total_produced, failure)
    }

    /// One attempt: a bounded multi-round walk of the routing graph starting
    /// from the snapshot's last message. Returns how many messages this
    /// attempt emitted.
    async fn run_attempt(
        &self,
        snapshot: &[ChatMessage],
        max_rounds: usize,
        sink: &mpsc::UnboundedSender<ChatMessage>,
        cancel: &CancellationToken,
    ) -> Result<usize, OrchestratorError> {
        let mut working: Vec<ChatMessage> = snapshot.to_vec();
        let mut produced = 0;

        for round in 0..max_rounds {
            let speaker = match working
                .last()
                .map(|m| m.from().to_string())
                .and_then(|from| self.graph.next_speaker(&from, &working))
            {
                Some(name) => name.to_string(),
                // no traversable edge: the exchange ends naturally
                None => break,
            };

            let agent = match self.agents.get(&speaker) {
                Some(agent) => Arc::clone(agent),
                None => break,
            };

            log::debug!("Round {}: {} speaks", round + 1, speaker);

            let rounds_left = max_rounds - round;
            let mut stream = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(OrchestratorError::Cancelled),
                opened = timeout(
                    self.message_timeout,
                    agent.produce(working.clone(), rounds_left),
                ) => match opened {
                    Err(_) => return Err(OrchestratorError::Timeout(self.message_timeout.as_secs())),
                    Ok(Err(e)) => return Err(OrchestratorError::Backend(e.to_string())),
                    Ok(Ok(stream)) => stream,
                },
            };

            loop {
                let next = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(OrchestratorError::Cancelled),
                    next = timeout(self.message_timeout, stream.next()) => next,
                };

                match next {
                    // sliding window expired with the stream still open
                    Err(_) => {
                        return Err(OrchestratorError::Timeout(self.message_timeout.as_secs()))
                    }
                    Ok(None) => break,
                    Ok(Some(Err(e))) => return Err(OrchestratorError::Backend(e.to_string())),
                    Ok(Some(Ok(message))) => {
                        log::info!(
                            "Received: '{}' from {}",
                            message.text_content().unwrap_or(""),
                            message.from()
                        );
                        self.history.append(message.clone());
                        // dispatcher may already be gone on teardown
                        let _ = sink.send(message.clone());
                        working.push(message);
                        produced += 1;
                    }
                }
            }
        }

        Ok(produced)
    }
}
