//! BDD test world for the register view-model

use std::sync::{Arc, Mutex};

use cucumber::World;
use register_view::{
    CommandSink, RegisterChange, RegisterError, RegisterPath, RegisterStore, WriteBackDispatcher,
    WriteCommand,
};

/// Command sink that keeps every command it receives
#[derive(Debug, Clone, Default)]
pub struct CommandLog {
    commands: Arc<Mutex<Vec<WriteCommand>>>,
}

impl CommandLog {
    pub fn commands(&self) -> Vec<WriteCommand> {
        self.commands.lock().unwrap().clone()
    }
}

impl CommandSink for CommandLog {
    fn enqueue(&self, command: WriteCommand) {
        self.commands.lock().unwrap().push(command);
    }
}

#[derive(Debug, Default, World)]
pub struct RegisterWorld {
    pub store: RegisterStore,
    pub log: CommandLog,
    pub last_error: Option<RegisterError>,
    pub last_changes: Vec<RegisterChange>,
}

impl RegisterWorld {
    pub fn dispatcher(&self) -> WriteBackDispatcher<CommandLog> {
        WriteBackDispatcher::new(self.log.clone())
    }
}

/// Parse "bank/name" into a register path
pub fn parse_path(s: &str) -> RegisterPath {
    let (bank, name) = s
        .split_once('/')
        .unwrap_or_else(|| panic!("Register path must be bank/name: {}", s));
    RegisterPath::new(bank, name)
}

/// Parse a 0x-prefixed hex literal from a step
pub fn parse_word(s: &str) -> u32 {
    let digits = s.trim_start_matches("0x");
    u32::from_str_radix(digits, 16).unwrap_or_else(|e| panic!("Bad hex literal {}: {}", s, e))
}
