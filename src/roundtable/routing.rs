//! Routing graph construction and traversal.
//!
//! The graph over a roster is always complete: every ordered pair of
//! participants, including self-pairs, gets one [`RoutingEdge`]. Whether an
//! edge can actually be taken is decided at evaluation time by inspecting the
//! most recent message: an edge `(from, to)` is traversable when that message
//! is content-bearing and contains the exact `[N:<to>]` addressing marker.
//! Topology is never pruned; predicates carry all the routing logic.
//!
//! # Examples
//!
//! ```
//! use roundtable::{ChatMessage, Role, RoutingGraph};
//!
//! let graph = RoutingGraph::build(&["Alice", "Bob"]);
//! assert_eq!(graph.edge_count(), 4);
//!
//! let history = vec![ChatMessage::text(Role::Assistant, "Alice", "your move [N:Bob]")];
//! assert_eq!(graph.next_speaker("Alice", &history), Some("Bob"));
//! assert_eq!(graph.next_speaker("Bob", &history), Some("Bob"));
//! ```

use crate::roundtable::message::ChatMessage;
use crate::roundtable::text;

/// One directed edge of the transition graph.
#[derive(Clone, Debug)]
pub struct RoutingEdge {
    pub from: String,
    pub to: String,
}

impl RoutingEdge {
    /// Evaluate the addressing predicate against the most recent message of
    /// `history`. Only the last entry is inspected; non-content kinds and an
    /// empty history are never traversable.
    pub fn is_traversable(&self, history: &[ChatMessage]) -> bool {
        match history.last().and_then(|m| m.text_content()) {
            Some(content) => text::contains_marker(content, &self.to),
            None => false,
        }
    }
}

/// The complete predicate-gated transition graph over one roster.
///
/// Built once per roster and rebuilt whenever the roster changes; never
/// mutated in place mid-task. Construction is pure and cannot fail; name
/// uniqueness is a caller guarantee the builder does not check.
#[derive(Clone, Debug)]
pub struct RoutingGraph {
    names: Vec<String>,
    edges: Vec<RoutingEdge>,
}

impl RoutingGraph {
    /// Build the complete graph: one edge per ordered pair, self-pairs
    /// included, in roster-major order.
    pub fn build<S: AsRef<str>>(roster: &[S]) -> Self {
        let names: Vec<String> = roster.iter().map(|n| n.as_ref().to_string()).collect();
        let mut edges = Vec::with_capacity(names.len() * names.len());
        for from in &names {
            for to in &names {
                edges.push(RoutingEdge {
                    from: from.clone(),
                    to: to.clone(),
                });
            }
        }
        RoutingGraph { names, edges }
    }

    /// Number of edges; always the square of the roster size.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Participant names in roster order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Look up the edge for one ordered pair, if both ends are roster members.
    pub fn edge(&self, from: &str, to: &str) -> Option<&RoutingEdge> {
        let fi = self.names.iter().position(|n| n == from)?;
        let ti = self.names.iter().position(|n| n == to)?;
        Some(&self.edges[fi * self.names.len() + ti])
    }

    /// Every roster member reachable from `from` given the current history,
    /// in roster order.
    pub fn successors(&self, from: &str, history: &[ChatMessage]) -> Vec<&str> {
        self.names
            .iter()
            .filter(|to| {
                self.edge(from, to)
                    .map(|e| e.is_traversable(history))
                    .unwrap_or(false)
            })
            .map(|s| s.as_str())
            .collect()
    }

    /// The next speaker out of `from`: the first traversable successor in
    /// roster order, or `None` when no edge matches (the exchange ends).
    pub fn next_speaker(&self, from: &str, history: &[ChatMessage]) -> Option<&str> {
        self.names.iter().map(|s| s.as_str()).find(|to| {
            self.edge(from, to)
                .map(|e| e.is_traversable(history))
                .unwrap_or(false)
        })
    }
}
