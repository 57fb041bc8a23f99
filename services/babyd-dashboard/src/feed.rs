//! Snapshot feed
//!
//! Polls the adapter's parameter tree for every configured bank and hands
//! each bank snapshot to the register store.

use std::sync::Arc;
use std::time::Duration;

use register_view::{BankSnapshot, RawRegister};
use tokio_util::sync::CancellationToken;

use crate::io::HttpClient;
use crate::state::{current_epoch_ms, StateHandle};

/// Number of consecutive failed polls before a warning is logged
const ERROR_WARN_THRESHOLD: u32 = 5;

/// Fetches bank snapshots from the control adapter
pub struct SnapshotFeed {
    registers_url: String,
    http: Arc<dyn HttpClient>,
}

impl SnapshotFeed {
    pub fn new(registers_url: String, http: Arc<dyn HttpClient>) -> Self {
        Self {
            registers_url: registers_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn bank_url(&self, bank: &str) -> String {
        format!("{}/{}", self.registers_url, bank)
    }

    /// Fetch one bank snapshot
    pub async fn fetch(&self, bank: &str) -> crate::Result<BankSnapshot> {
        let url = self.bank_url(bank);
        let response = self.http.get(&url).await?;
        if !response.is_success() {
            return Err(crate::DashboardError::Http(format!(
                "GET {} returned {}",
                url, response.status
            )));
        }
        parse_bank_snapshot(bank, &response.body)
    }
}

/// Parse an adapter response into a bank snapshot
///
/// The adapter answers a GET on a node with the node wrapped under its own
/// name, so `{"udp": {...}}` and a bare `{...}` are both accepted. Entries
/// that are not register objects are skipped.
pub fn parse_bank_snapshot(bank: &str, body: &str) -> crate::Result<BankSnapshot> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    let mut tree = match value {
        serde_json::Value::Object(map) => map,
        other => {
            return Err(crate::DashboardError::Dashboard(format!(
                "Bank '{}' is not an object: {}",
                bank, other
            )))
        }
    };

    if tree.len() == 1 {
        let wrapped = tree
            .keys()
            .next()
            .filter(|key| key.eq_ignore_ascii_case(bank))
            .cloned();
        if let Some(key) = wrapped {
            if let Some(serde_json::Value::Object(inner)) = tree.remove(&key) {
                tree = inner;
            }
        }
    }

    let mut snapshot = BankSnapshot::new();
    for (name, entry) in tree {
        if !entry.is_object() {
            tracing::trace!("Skipping non-register entry '{}/{}'", bank, name);
            continue;
        }
        match serde_json::from_value::<RawRegister>(entry) {
            Ok(register) => {
                snapshot.insert(name, register);
            }
            Err(e) => tracing::debug!("Skipping malformed register '{}/{}': {}", bank, name, e),
        }
    }
    Ok(snapshot)
}

/// Poll every bank until `cancel` fires
pub async fn poll_loop(
    feed: SnapshotFeed,
    banks: Vec<String>,
    state: StateHandle,
    interval: Duration,
    cancel: CancellationToken,
) {
    loop {
        let mut ok = true;
        for bank in &banks {
            match feed.fetch(bank).await {
                Ok(snapshot) => {
                    let changes = state.write().await.store.apply_snapshot(bank, &snapshot);
                    if !changes.is_empty() {
                        tracing::debug!("Bank '{}': {} register(s) changed", bank, changes.len());
                    }
                }
                Err(e) => {
                    ok = false;
                    tracing::debug!("Polling bank '{}' failed: {}", bank, e);
                }
            }
        }

        {
            let mut state_lock = state.write().await;
            state_lock.record_poll(ok, current_epoch_ms());
            if state_lock.consecutive_errors == ERROR_WARN_THRESHOLD {
                tracing::warn!(
                    "Snapshot feed has failed {} consecutive polls",
                    state_lock.consecutive_errors
                );
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = cancel.cancelled() => {
                tracing::debug!("Snapshot polling cancelled");
                break;
            }
        }
    }
}
