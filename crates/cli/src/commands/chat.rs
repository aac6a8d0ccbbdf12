//! Chat command handler.
//!
//! Interactive conversation loop. Questions and syncs run as background
//! tasks so the prompt stays usable while a request is outstanding; results
//! come back over a channel and are printed as they arrive.

use crate::commands::QueryArgs;
use crate::render;
use clap::Args;
use nexus_core::{config::AppConfig, AppResult};
use nexus_gateway::create_gateway;
use nexus_session::{
    ConversationController, IngestionController, RejectReason, SubmitOutcome, TriggerOutcome,
};
use std::collections::VecDeque;
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const HELP: &str = "\
Type a question and press enter. Commands:
  /sync     re-ingest the knowledge base in the background
  /cancel   abandon the question in flight
  /history  show the conversation so far
  /help     show this message
  /quit     leave";

/// Interactive conversation with background knowledge base sync
#[derive(Args, Debug)]
pub struct ChatCommand {
    #[command(flatten)]
    pub query: QueryArgs,
}

/// One line of user input.
#[derive(Debug, PartialEq, Eq)]
enum ChatInput<'a> {
    Ask(&'a str),
    Sync,
    Cancel,
    History,
    Help,
    Quit,
    Unknown(&'a str),
}

fn parse_input(line: &str) -> ChatInput<'_> {
    match line.trim() {
        "/quit" | "/exit" => ChatInput::Quit,
        "/sync" => ChatInput::Sync,
        "/cancel" => ChatInput::Cancel,
        "/history" => ChatInput::History,
        "/help" => ChatInput::Help,
        command if command.starts_with('/') => ChatInput::Unknown(command),
        _ => ChatInput::Ask(line),
    }
}

/// Completion of a background task.
#[derive(Debug)]
enum ChatEvent {
    Reply(SubmitOutcome),
    Synced(TriggerOutcome),
}

fn prompt_text(querying: bool, ingesting: bool) -> String {
    let mut markers = Vec::new();
    if querying {
        markers.push("waiting");
    }
    if ingesting {
        markers.push("syncing");
    }

    if markers.is_empty() {
        "nexus> ".to_string()
    } else {
        format!("nexus [{}]> ", markers.join(", "))
    }
}

/// Read lines on a dedicated thread.
///
/// A blocked read on this thread never holds up process exit, unlike a read
/// parked on the runtime's blocking pool. A line that is not valid UTF-8 is
/// forwarded as an error and reading carries on; any other error ends input.
fn spawn_input_reader<R>(reader: R) -> mpsc::UnboundedReceiver<std::io::Result<String>>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in reader.lines() {
            let fatal = matches!(&line, Err(e) if e.kind() != ErrorKind::InvalidData);
            if tx.send(line).is_err() || fatal {
                break;
            }
        }
    });
    rx
}

/// Unwrap one line from the reader, skipping lines that are not UTF-8.
fn readable_line(line: std::io::Result<String>) -> AppResult<Option<String>> {
    match line {
        Ok(line) => Ok(Some(line)),
        Err(e) if e.kind() == ErrorKind::InvalidData => {
            tracing::warn!("Skipping unreadable input line: {}", e);
            println!("Ignored a line that is not valid UTF-8.");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Live controllers plus the channel their tasks report back on.
///
/// Questions typed while an answer is pending wait in `pending` and go out
/// one at a time as replies arrive.
struct ChatSession {
    conversation: Arc<ConversationController>,
    ingestion: Arc<IngestionController>,
    events: mpsc::UnboundedSender<ChatEvent>,
    pending: VecDeque<String>,
    awaiting: bool,
    outstanding: usize,
}

impl ChatSession {
    fn new(
        conversation: Arc<ConversationController>,
        ingestion: Arc<IngestionController>,
    ) -> (Self, mpsc::UnboundedReceiver<ChatEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let session = Self {
            conversation,
            ingestion,
            events,
            pending: VecDeque::new(),
            awaiting: false,
            outstanding: 0,
        };
        (session, rx)
    }

    fn ask(&mut self, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        if self.awaiting {
            self.pending.push_back(text.to_string());
            println!(
                "Queued ({} waiting). Use /cancel to abandon the current question.",
                self.pending.len()
            );
            return;
        }

        self.submit(text.to_string());
    }

    fn submit(&mut self, text: String) {
        let conversation = Arc::clone(&self.conversation);
        let events = self.events.clone();
        self.awaiting = true;
        self.outstanding += 1;
        tokio::spawn(async move {
            let outcome = conversation.submit(&text).await;
            let _ = events.send(ChatEvent::Reply(outcome));
        });
    }

    fn sync(&mut self) {
        if self.ingestion.is_ingesting() {
            println!("A sync is already running.");
            return;
        }

        println!("Syncing knowledge base in the background...");
        let ingestion = Arc::clone(&self.ingestion);
        let events = self.events.clone();
        self.outstanding += 1;
        tokio::spawn(async move {
            let outcome = ingestion.trigger().await;
            let _ = events.send(ChatEvent::Synced(outcome));
        });
    }

    fn show_event(&mut self, event: ChatEvent) {
        self.outstanding = self.outstanding.saturating_sub(1);

        if matches!(event, ChatEvent::Reply(_)) {
            self.awaiting = false;
        }

        match event {
            ChatEvent::Reply(SubmitOutcome::Completed(turn)) => {
                println!("\n{}\n", render::turn(&turn));
            }
            ChatEvent::Reply(SubmitOutcome::Rejected(RejectReason::Busy)) => {
                println!("Still waiting for the previous answer.");
            }
            ChatEvent::Reply(SubmitOutcome::Rejected(RejectReason::EmptyInput)) => {}
            ChatEvent::Synced(TriggerOutcome::Finished(notification)) => {
                println!("\n{}\n", notification);
            }
            ChatEvent::Synced(TriggerOutcome::Rejected) => {
                println!("A sync is already running.");
            }
        }

        if !self.awaiting {
            if let Some(next) = self.pending.pop_front() {
                self.submit(next);
            }
        }
    }

    fn show_prompt(&self) {
        print!(
            "{}",
            prompt_text(self.awaiting, self.ingestion.is_ingesting())
        );
        std::io::stdout().flush().ok();
    }
}

impl ChatCommand {
    /// Execute the chat command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing chat command");

        let gateway = create_gateway(config)?;
        let shutdown = CancellationToken::new();

        let conversation = Arc::new(
            ConversationController::new(Arc::clone(&gateway), self.query.options(config))
                .with_timeout(config.request_timeout())
                .with_cancellation(shutdown.child_token()),
        );
        let ingestion = Arc::new(
            IngestionController::new(gateway)
                .with_timeout(config.request_timeout())
                .with_cancellation(shutdown.child_token()),
        );

        let (mut session, mut events_rx) = ChatSession::new(conversation, ingestion);

        println!("Ask anything about your network. /help lists commands.");
        session.show_prompt();

        let mut input = spawn_input_reader(BufReader::new(std::io::stdin()));
        let mut input_closed = false;

        loop {
            tokio::select! {
                line = input.recv() => {
                    let Some(line) = line else {
                        input_closed = true;
                        break;
                    };
                    let Some(line) = readable_line(line)? else {
                        session.show_prompt();
                        continue;
                    };

                    match parse_input(&line) {
                        ChatInput::Quit => break,
                        ChatInput::Ask(text) => session.ask(text),
                        ChatInput::Sync => session.sync(),
                        ChatInput::Cancel => {
                            if !session.conversation.cancel() {
                                println!("No question in flight.");
                            }
                        }
                        ChatInput::History => {
                            println!("{}", render::transcript(&session.conversation.transcript()));
                        }
                        ChatInput::Help => println!("{}", HELP),
                        ChatInput::Unknown(command) => {
                            println!("Unknown command: {} (try /help)", command);
                        }
                    }
                }
                Some(event) = events_rx.recv() => session.show_event(event),
                _ = tokio::signal::ctrl_c() => {
                    if !session.conversation.cancel() {
                        break;
                    }
                }
            }

            session.show_prompt();
        }

        // Piped input: let outstanding work finish before exiting
        if input_closed {
            while session.outstanding > 0 {
                match events_rx.recv().await {
                    Some(event) => session.show_event(event),
                    None => break,
                }
            }
        }

        shutdown.cancel();
        println!();
        Ok(())
    }
}
