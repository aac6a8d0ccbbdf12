//! Ingest command handler.
//!
//! Triggers a one-shot rebuild of the backend's knowledge base.

use clap::Args;
use nexus_core::{config::AppConfig, AppError, AppResult};
use nexus_gateway::create_gateway;
use nexus_session::{IngestNotification, IngestionController, TriggerOutcome};

/// Re-ingest the knowledge base
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IngestCommand {
    /// Execute the ingest command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ingest command");

        let gateway = create_gateway(config)?;
        let controller = IngestionController::new(gateway).with_timeout(config.request_timeout());

        let notification = match controller.trigger().await {
            TriggerOutcome::Finished(notification) => notification,
            // A fresh controller has nothing in flight
            TriggerOutcome::Rejected => {
                return Err(AppError::Other("Ingestion already in progress".to_string()))
            }
        };

        if self.json {
            println!("{}", notification_json(&notification)?);
        } else {
            println!("{}", notification);
        }

        match notification {
            IngestNotification::Completed { .. } => Ok(()),
            IngestNotification::Failed { reason } => Err(AppError::Gateway(reason.detail)),
        }
    }
}

fn notification_json(notification: &IngestNotification) -> AppResult<String> {
    let output = match notification {
        IngestNotification::Completed {
            message,
            profiles_ingested,
            edges_ingested,
        } => serde_json::json!({
            "success": true,
            "message": message,
            "profilesIngested": profiles_ingested,
            "edgesIngested": edges_ingested,
        }),
        IngestNotification::Failed { reason } => serde_json::json!({
            "success": false,
            "message": notification.to_string(),
            "failure": reason,
        }),
    };

    Ok(serde_json::to_string_pretty(&output)?)
}
