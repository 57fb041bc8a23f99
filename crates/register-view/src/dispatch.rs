//! Write-back dispatcher
//!
//! Turns a confirmed edit into one outbound command. Commands are
//! fire-and-forget: no response is awaited, and success or failure only
//! shows up in the next snapshot.

use serde::Serialize;

use crate::store::RegisterPath;

/// A whole-register write addressed by slash-delimited path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteCommand {
    pub path: String,
    pub value: Vec<u32>,
}

impl WriteCommand {
    /// The register this command targets, if the path is a register value path
    pub fn register(&self) -> Option<RegisterPath> {
        RegisterPath::from_value_path(&self.path)
    }
}

/// Outbound command channel
///
/// Implementations own the transport. `enqueue` must not wait on it.
#[cfg_attr(test, mockall::automock)]
pub trait CommandSink {
    fn enqueue(&self, command: WriteCommand);
}

/// Issues exactly one command per confirmed edit, in confirmation order
#[derive(Debug, Clone)]
pub struct WriteBackDispatcher<S> {
    sink: S,
}

impl<S: CommandSink> WriteBackDispatcher<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Enqueue a write of `value` to `path`
    ///
    /// Never coalesces: two calls always produce two commands.
    pub fn commit(&self, path: &str, value: &[u32]) {
        tracing::info!("Writing {} word(s) to '{}'", value.len(), path);
        self.sink.enqueue(WriteCommand {
            path: path.to_string(),
            value: value.to_vec(),
        });
    }

    /// Enqueue a write of a register's full value
    pub fn commit_register(&self, register: &RegisterPath, value: &[u32]) {
        self.commit(&register.value_path(), value);
    }
}
