//! Plain-text rendering of transcript turns.

use nexus_gateway::Citation;
use nexus_session::{Role, Turn};

/// Render one citation as `@username: snippet`, or just the snippet when
/// the source has no handle.
pub fn citation_line(citation: &Citation) -> String {
    let ellipsis = if citation.is_truncated() { "..." } else { "" };
    match citation.metadata.username.as_str() {
        "" => format!("{}{}", citation.snippet(), ellipsis),
        username => format!("@{}: {}{}", username, citation.snippet(), ellipsis),
    }
}

/// Render a turn for the terminal.
///
/// Answers with citations get a `Sources:` block; failures and user turns
/// never do.
pub fn turn(turn: &Turn) -> String {
    let mut out = match turn.role() {
        Role::User => format!("you> {}", turn.content()),
        Role::Assistant => turn.content().to_string(),
    };

    if let Some(sources) = turn.sources().filter(|sources| !sources.is_empty()) {
        out.push_str("\n\nSources:");
        for citation in sources {
            out.push_str("\n  ");
            out.push_str(&citation_line(citation));
        }
    }

    out
}

/// Render a whole transcript, separating turns with blank lines.
pub fn transcript(turns: &[Turn]) -> String {
    turns.iter().map(turn).collect::<Vec<_>>().join("\n\n")
}
