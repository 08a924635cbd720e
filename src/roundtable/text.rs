//! Addressing markers and display-text cleanup.
//!
//! Agents route messages to each other with literal `[N:<name>]` markers
//! embedded in message content. Hosts usually strip those (and any other
//! bracketed stage directions) before showing text to a player.

/// The literal addressing marker that routes a message to `name`.
///
/// # Examples
///
/// ```
/// assert_eq!(roundtable::text::addressing_marker("Bob"), "[N:Bob]");
/// ```
pub fn addressing_marker(name: &str) -> String {
    format!("[N:{}]", name)
}

/// Exact, case-sensitive substring test for the addressing marker of `name`.
/// No trimming or normalization: ambiguous or partial tags do not match.
pub fn contains_marker(content: &str, name: &str) -> bool {
    content.contains(&addressing_marker(name))
}

/// Remove every bracketed `[...]` run from `input` and tidy the whitespace,
/// preserving paragraph structure (at most one blank line between paragraphs).
///
/// Bracket depth is tracked so nested brackets are removed as a unit. An
/// unbalanced closing bracket resets the depth to zero rather than swallowing
/// the rest of the string.
///
/// # Examples
///
/// ```
/// let cleaned = roundtable::text::strip_markers("[N:Bob] Hello there.\n\n\nBye. [aside]");
/// assert_eq!(cleaned, "Hello there.\n\nBye.");
/// ```
pub fn strip_markers(input: &str) -> String {
    let mut kept = String::with_capacity(input.len());
    let mut depth: usize = 0;
    for c in input.chars() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            _ if depth == 0 => kept.push(c),
            _ => {}
        }
    }

    let mut lines: Vec<&str> = Vec::new();
    let mut last_was_blank = false;
    for line in kept.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if !last_was_blank && !lines.is_empty() {
                lines.push("");
            }
            last_was_blank = true;
        } else {
            lines.push(trimmed);
            last_was_blank = false;
        }
    }
    while lines.last() == Some(&"") {
        lines.pop();
    }
    lines.join("\n")
}
