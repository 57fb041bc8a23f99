//! Shared state for the register store and its write-back path

use std::sync::Arc;
use std::time::Instant;

use register_view::{RegisterStore, WriteBackDispatcher};
use tokio::sync::RwLock;

use crate::commands::CommandQueue;

/// Shared state accessible by the snapshot feed, command worker and dashboard
#[derive(Debug)]
pub struct SharedState {
    pub store: RegisterStore,
    pub dispatcher: WriteBackDispatcher<CommandQueue>,
    /// Banks in configured display order
    pub banks: Vec<String>,
    pub register_columns: usize,
    pub words_per_row: usize,
    pub last_poll_epoch_ms: u64,
    pub consecutive_errors: u32,
    pub started_at: Instant,
}

impl SharedState {
    pub fn new(
        store: RegisterStore,
        queue: CommandQueue,
        banks: Vec<String>,
        register_columns: usize,
        words_per_row: usize,
    ) -> Self {
        Self {
            store,
            dispatcher: WriteBackDispatcher::new(queue),
            banks: banks.iter().map(|bank| bank.to_ascii_lowercase()).collect(),
            register_columns,
            words_per_row,
            last_poll_epoch_ms: 0,
            consecutive_errors: 0,
            started_at: Instant::now(),
        }
    }

    /// Record the outcome of one feed poll
    pub fn record_poll(&mut self, ok: bool, now_ms: u64) {
        self.last_poll_epoch_ms = now_ms;
        if ok {
            self.consecutive_errors = 0;
        } else {
            self.consecutive_errors += 1;
        }
    }
}

/// Thread-safe shared state handle
pub type StateHandle = Arc<RwLock<SharedState>>;

pub fn new_state_handle(state: SharedState) -> StateHandle {
    Arc::new(RwLock::new(state))
}

pub fn current_epoch_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
