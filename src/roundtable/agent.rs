//! The agent capability boundary.
//!
//! An [`Agent`] is an autonomous conversation participant: given the prior
//! history and a round budget, it asynchronously produces a finite,
//! non-restartable stream of messages. Concrete backends (remote model
//! providers, scripted actors, test doubles) live outside this crate and are
//! plugged in through [`AgentFactory`] at
//! [`Orchestrator::initialize`](crate::Orchestrator::initialize) time.
//!
//! # Example: a scripted agent
//!
//! ```
//! use async_trait::async_trait;
//! use roundtable::{
//!     stream_from_messages, Agent, AgentError, ChatMessage, MessageStream, Role,
//! };
//!
//! struct Scripted;
//!
//! #[async_trait]
//! impl Agent for Scripted {
//!     fn name(&self) -> &str {
//!         "Scripted"
//!     }
//!
//!     async fn produce(
//!         &self,
//!         _history: Vec<ChatMessage>,
//!         _max_rounds: usize,
//!     ) -> Result<MessageStream, AgentError> {
//!         Ok(stream_from_messages(vec![ChatMessage::text(
//!             Role::Assistant,
//!             "Scripted",
//!             "Always the same line.",
//!         )]))
//!     }
//! }
//! ```

use crate::roundtable::message::{ChatMessage, Role};
use async_trait::async_trait;
use futures_util::stream;
use futures_util::Stream;
use std::error::Error;
use std::pin::Pin;
use std::sync::Arc;

/// Type alias for a Send-able boxed backend fault.
pub type AgentError = Box<dyn Error + Send + Sync>;

/// A lazy, finite, non-restartable sequence of messages produced by an agent.
/// Items arrive as they are generated; the exchange driver applies its sliding
/// timeout between items, not around the whole stream.
pub type MessageStream = Pin<Box<dyn Stream<Item = Result<ChatMessage, AgentError>> + Send>>;

/// Wrap an already-materialized batch of messages as a [`MessageStream`].
pub fn stream_from_messages(messages: Vec<ChatMessage>) -> MessageStream {
    Box::pin(stream::iter(messages.into_iter().map(Ok)))
}

/// Trait defining the capability of one conversation participant.
///
/// Implementations must be cheap to share (`Arc<dyn Agent>`); the engine never
/// mutates an agent after construction. A call to [`produce`](Agent::produce)
/// may raise a backend fault at any point, including mid-stream; faults are
/// retryable at the exchange level up to the configured attempt budget.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Roster name. Callers must guarantee uniqueness within a roster.
    fn name(&self) -> &str;

    /// Produce zero or more messages in response to `history`.
    ///
    /// `max_rounds` is the remaining round budget of the enclosing exchange,
    /// offered so backends can bound their own output.
    async fn produce(
        &self,
        history: Vec<ChatMessage>,
        max_rounds: usize,
    ) -> Result<MessageStream, AgentError>;
}

/// One roster entry, declaring who participates and which backend serves them.
#[derive(Clone, Debug)]
pub struct AgentSpec {
    /// Unique roster name, also the target of `[N:<name>]` markers.
    pub name: String,
    /// Personality / system-instruction material handed to the backend.
    pub persona: String,
    /// Backend key matched against the configured credentials
    /// (e.g. `"anthropic"`, `"openai"`).
    pub provider: String,
    /// Backend-specific model identifier.
    pub model: String,
}

impl AgentSpec {
    pub fn new(
        name: impl Into<String>,
        persona: impl Into<String>,
        provider: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        AgentSpec {
            name: name.into(),
            persona: persona.into(),
            provider: provider.into(),
            model: model.into(),
        }
    }
}

/// Builds concrete [`Agent`]s from roster entries.
///
/// The orchestrator resolves the credential for `spec.provider` before calling
/// [`build`](AgentFactory::build); a factory therefore never needs to read the
/// environment itself. `roster` carries every participant name so the factory
/// can include the cast list in the backend's system instruction.
#[async_trait]
pub trait AgentFactory: Send + Sync {
    async fn build(
        &self,
        spec: &AgentSpec,
        roster: &[String],
        credential: &str,
    ) -> Result<Arc<dyn Agent>, AgentError>;
}

/// Built-in proxy participant that injects tasks into the conversation.
///
/// Task-injection messages carry the director's name as their sender so the
/// routing graph can evaluate edges out of them. When an exchange routes back
/// to the director, it answers with a fixed acknowledgement naming the first
/// roster member; the reply carries no addressing marker, so the exchange ends
/// there.
pub struct DirectorAgent {
    name: String,
    first_member: String,
}

impl DirectorAgent {
    /// Default roster name of the director proxy.
    pub const NAME: &'static str = "Director";

    pub fn new(first_member: impl Into<String>) -> Self {
        DirectorAgent {
            name: Self::NAME.to_string(),
            first_member: first_member.into(),
        }
    }
}

#[async_trait]
impl Agent for DirectorAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn produce(
        &self,
        _history: Vec<ChatMessage>,
        _max_rounds: usize,
    ) -> Result<MessageStream, AgentError> {
        let reply = ChatMessage::text(
            Role::Assistant,
            self.name.clone(),
            format!("Routing to: {}", self.first_member),
        );
        Ok(stream_from_messages(vec![reply]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    #[tokio::test]
    async fn director_replies_with_fixed_routing_line() {
        let director = DirectorAgent::new("Alice");
        let mut stream = director.produce(Vec::new(), 3).await.unwrap();

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.from(), DirectorAgent::NAME);
        assert_eq!(first.text_content(), Some("Routing to: Alice"));
        assert!(stream.next().await.is_none());
    }
}
