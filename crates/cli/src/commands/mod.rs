//! Command handlers for the Nexus CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod ask;
pub mod chat;
pub mod ingest;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use ingest::IngestCommand;

use clap::Args;
use nexus_core::AppConfig;
use nexus_session::QueryOptions;

/// Retrieval flags shared by `ask` and `chat`.
#[derive(Args, Debug, Clone, Default)]
pub struct QueryArgs {
    /// Number of passages to retrieve
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub top_k: Option<u32>,

    /// Skip follow-graph reranking
    #[arg(long)]
    pub no_graph_ranking: bool,
}

impl QueryArgs {
    /// Configured options with these flags applied on top.
    pub fn options(&self, config: &AppConfig) -> QueryOptions {
        let mut options = QueryOptions::from_config(config);
        if self.top_k.is_some() {
            options.top_k = self.top_k;
        }
        if self.no_graph_ranking {
            options.use_graph_ranking = Some(false);
        }
        options
    }
}
