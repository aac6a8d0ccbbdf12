//! Ask command handler.
//!
//! Sends one question to the backend and prints the answer with its sources.

use crate::commands::QueryArgs;
use crate::render;
use clap::Args;
use nexus_core::{config::AppConfig, AppError, AppResult};
use nexus_gateway::create_gateway;
use nexus_session::{ConversationController, RejectReason, SubmitOutcome};
use std::path::PathBuf;

/// Ask a single question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: Vec<String>,

    /// Read the question from a file
    #[arg(short, long, conflicts_with = "question")]
    pub file: Option<PathBuf>,

    #[command(flatten)]
    pub query: QueryArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let question = self.get_question()?;

        let gateway = create_gateway(config)?;
        let controller = ConversationController::new(gateway, self.query.options(config))
            .with_timeout(config.request_timeout());

        let turn = match controller.submit(&question).await {
            SubmitOutcome::Completed(turn) => turn,
            SubmitOutcome::Rejected(RejectReason::EmptyInput) => {
                return Err(AppError::Config("No question provided".to_string()))
            }
            SubmitOutcome::Rejected(RejectReason::Busy) => {
                return Err(AppError::Other("A query is already in flight".to_string()))
            }
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&turn)?);
        } else {
            println!("{}", render::turn(&turn));
        }

        match turn.failure() {
            Some(reason) => Err(AppError::Gateway(reason.detail.clone())),
            None => Ok(()),
        }
    }

    /// Get the question text from arguments or a file.
    fn get_question(&self) -> AppResult<String> {
        match &self.file {
            Some(path) => std::fs::read_to_string(path).map_err(|e| {
                AppError::Config(format!("Failed to read question file {:?}: {}", path, e))
            }),
            None => Ok(self.question.join(" ")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn command(question: &[&str]) -> AskCommand {
        AskCommand {
            question: question.iter().map(|s| s.to_string()).collect(),
            file: None,
            query: QueryArgs::default(),
            json: false,
        }
    }

    #[test]
    fn test_words_joined() {
        let cmd = command(&["Who", "works", "at", "xAI?"]);
        assert_eq!(cmd.get_question().unwrap(), "Who works at xAI?");
    }

    #[test]
    fn test_question_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "Who follows alice?").unwrap();

        let mut cmd = command(&[]);
        cmd.file = Some(file.path().to_path_buf());
        assert_eq!(cmd.get_question().unwrap(), "Who follows alice?");
    }

    #[tokio::test]
    async fn test_blank_question_is_config_error() {
        let cmd = command(&[" "]);
        let result = cmd.execute(&AppConfig::default()).await;
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
