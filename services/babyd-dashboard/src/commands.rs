//! Outbound write commands
//!
//! The dispatcher enqueues onto an unbounded channel so a confirm never
//! waits on the network. A single worker drains it in order and PUTs each
//! write to the adapter. A transport failure or non-2xx reply abandons the
//! in-flight edit; otherwise the next snapshot settles it.

use std::sync::Arc;

use register_view::{CommandSink, WriteCommand};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::io::HttpClient;
use crate::state::StateHandle;

/// Sending half of the command channel
#[derive(Debug, Clone)]
pub struct CommandQueue {
    tx: mpsc::UnboundedSender<WriteCommand>,
}

impl CommandSink for CommandQueue {
    fn enqueue(&self, command: WriteCommand) {
        if let Err(e) = self.tx.send(command) {
            tracing::warn!("Command worker has stopped, dropping write to '{}'", e.0.path);
        }
    }
}

/// Create a command queue and the receiver the worker drains
pub fn command_queue() -> (CommandQueue, mpsc::UnboundedReceiver<WriteCommand>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (CommandQueue { tx }, rx)
}

/// Turns write commands into adapter PUT requests
pub struct CommandWriter {
    registers_url: String,
    http: Arc<dyn HttpClient>,
}

impl CommandWriter {
    pub fn new(registers_url: String, http: Arc<dyn HttpClient>) -> Self {
        Self {
            registers_url: registers_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    /// Split `bank/name/value` into the parent URL and the JSON body
    ///
    /// The adapter takes a PUT on the parent node with the leaf as the key.
    pub fn request(&self, command: &WriteCommand) -> crate::Result<(String, serde_json::Value)> {
        let (parent, leaf) = command.path.rsplit_once('/').ok_or_else(|| {
            crate::DashboardError::Dashboard(format!("Invalid command path '{}'", command.path))
        })?;
        let url = format!("{}/{}", self.registers_url, parent);
        let mut body = serde_json::Map::new();
        body.insert(leaf.to_string(), serde_json::json!(command.value));
        let body = serde_json::Value::Object(body);
        Ok((url, body))
    }

    pub async fn send(&self, command: &WriteCommand) -> crate::Result<()> {
        let (url, body) = self.request(command)?;
        let response = self.http.put_json(&url, &body).await?;
        if !response.is_success() {
            return Err(crate::DashboardError::Http(format!(
                "PUT {} returned {}: {}",
                url, response.status, response.body
            )));
        }
        Ok(())
    }
}

/// Drain the command channel until it closes or `cancel` fires
pub async fn run_command_worker(
    writer: CommandWriter,
    mut rx: mpsc::UnboundedReceiver<WriteCommand>,
    state: StateHandle,
    cancel: CancellationToken,
) {
    loop {
        let command = tokio::select! {
            command = rx.recv() => match command {
                Some(command) => command,
                None => break,
            },
            _ = cancel.cancelled() => {
                tracing::debug!("Command worker cancelled");
                break;
            }
        };

        if let Err(e) = writer.send(&command).await {
            tracing::error!("Write to '{}' failed: {}", command.path, e);
            if let Some(register) = command.register() {
                state.write().await.store.commit_failed(&register);
            }
        }
    }
}

/// Wait for the command worker to finish, logging a panic or abort
///
/// Returns `true` when the worker exited normally.
pub async fn join_command_worker(worker: JoinHandle<()>) -> bool {
    match worker.await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!("Command worker failed: {}", e);
            false
        }
    }
}
