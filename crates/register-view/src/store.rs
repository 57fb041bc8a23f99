//! Edit-reconciliation store
//!
//! Keeps the latest snapshot of every register next to any local edit that
//! has not been confirmed yet, and decides what each register displays.
//!
//! Each register is in one of three states:
//!
//! - `Clean`: no edit buffer, the display tracks the latest snapshot.
//! - `Editing`: the buffer holds unsent user changes. Snapshots are still
//!   recorded but never replace the buffer.
//! - `Committing`: the buffer was written back. The display keeps showing it
//!   until the next snapshot for that register arrives, which returns the
//!   register to `Clean` whatever value the device reports.
//!
//! There is no acknowledgment channel and at most one write in flight per
//! register. Whether a write took effect is only visible in the snapshot
//! that follows it.

use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::catalog::{BankSnapshot, RawRegister, RegisterCatalog};
use crate::codec::{check_fits, decode_fields_words, decode_hex, write_field, FieldMap};
use crate::definitions::RegisterDefinitions;
use crate::dispatch::{CommandSink, WriteBackDispatcher};
use crate::error::{RegisterError, Result};
use crate::grid::DisplayGrid;

/// Stable key of a register: its bank and its name within the bank
///
/// Bank names are normalised to lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegisterPath {
    bank: String,
    name: String,
}

impl RegisterPath {
    pub fn new(bank: &str, name: &str) -> Self {
        Self {
            bank: bank.to_ascii_lowercase(),
            name: name.to_string(),
        }
    }

    pub fn bank(&self) -> &str {
        &self.bank
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Command path addressing the register's value, e.g. `udp/IP_LOCAL/value`
    pub fn value_path(&self) -> String {
        format!("{}/{}/value", self.bank, self.name)
    }

    /// Inverse of [`RegisterPath::value_path`]
    ///
    /// The bank ends at the first `/`, so register names may contain `/`.
    pub fn from_value_path(path: &str) -> Option<Self> {
        let (bank, rest) = path.split_once('/')?;
        let name = rest.strip_suffix("/value")?;
        if bank.is_empty() || name.is_empty() {
            return None;
        }
        Some(Self::new(bank, name))
    }
}

impl fmt::Display for RegisterPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bank, self.name)
    }
}

/// Edit state of a register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditState {
    Clean,
    Editing,
    Committing,
}

impl fmt::Display for EditState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditState::Clean => write!(f, "Clean"),
            EditState::Editing => write!(f, "Editing"),
            EditState::Committing => write!(f, "Committing"),
        }
    }
}

/// Local, unconfirmed words of one register
///
/// `dirty` means the buffer holds changes that have not been written back.
/// A buffer that is no longer dirty has been committed and is waiting for
/// the next snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditBuffer {
    values: Vec<u32>,
    dirty: bool,
}

impl EditBuffer {
    pub fn values(&self) -> &[u32] {
        &self.values
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn state(&self) -> EditState {
        if self.dirty {
            EditState::Editing
        } else {
            EditState::Committing
        }
    }
}

/// What a register currently displays
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterView {
    pub path: RegisterPath,
    pub name: String,
    pub address: Option<u32>,
    pub values: Vec<u32>,
    pub fields: Option<FieldMap>,
    pub read_only: bool,
    pub state: EditState,
}

/// A register whose displayed words or edit state changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterChange {
    pub path: RegisterPath,
    pub previous: Option<Vec<u32>>,
    pub current: Vec<u32>,
    pub state: EditState,
}

#[derive(Debug, Default)]
struct Bank {
    latest: BankSnapshot,
    catalog: RegisterCatalog,
}

/// Per-register reconciliation of live snapshots and local edits
#[derive(Debug, Default)]
pub struct RegisterStore {
    banks: IndexMap<String, Bank>,
    buffers: HashMap<RegisterPath, EditBuffer>,
    definitions: RegisterDefinitions,
}

impl RegisterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that decodes and edits fields using `definitions`
    pub fn with_definitions(definitions: RegisterDefinitions) -> Self {
        Self {
            definitions,
            ..Self::default()
        }
    }

    pub fn definitions(&self) -> &RegisterDefinitions {
        &self.definitions
    }

    /// Apply one bank of a snapshot and report what changed on screen
    ///
    /// Only the registers present in `snapshot` are touched; absent
    /// registers keep their last known state. The bank's catalog is rebuilt
    /// from the merged result.
    pub fn apply_snapshot(&mut self, bank: &str, snapshot: &BankSnapshot) -> Vec<RegisterChange> {
        let bank_key = bank.to_ascii_lowercase();
        let Self { banks, buffers, .. } = self;
        let entry = banks.entry(bank_key.clone()).or_default();
        let mut changes = Vec::new();

        for (name, incoming) in snapshot {
            let path = RegisterPath::new(&bank_key, name);
            let previous_state = state_of(buffers.get(&path));
            let previous = display_values(buffers.get(&path), entry.latest.get(name)).map(<[u32]>::to_vec);

            match previous_state {
                EditState::Clean => {}
                EditState::Editing => {
                    tracing::debug!("Keeping local edit of '{}' over incoming snapshot", path);
                }
                EditState::Committing => {
                    buffers.remove(&path);
                    tracing::debug!("Write to '{}' resolved by snapshot {:?}", path, incoming.values);
                }
            }
            entry.latest.insert(name.clone(), incoming.clone());

            let state = state_of(buffers.get(&path));
            let current = display_values(buffers.get(&path), Some(incoming))
                .unwrap_or_default()
                .to_vec();

            if previous.as_ref() != Some(&current) || previous_state != state {
                changes.push(RegisterChange {
                    path,
                    previous,
                    current,
                    state,
                });
            }
        }

        entry.catalog = RegisterCatalog::build(&entry.latest);
        tracing::debug!(
            "Applied snapshot for bank '{}': {} register(s), {} change(s)",
            bank_key,
            snapshot.len(),
            changes.len()
        );

        changes
    }

    pub fn state(&self, path: &RegisterPath) -> EditState {
        state_of(self.buffers.get(path))
    }

    pub fn buffer(&self, path: &RegisterPath) -> Option<&EditBuffer> {
        self.buffers.get(path)
    }

    /// Names of all banks seen so far, in arrival order
    pub fn banks(&self) -> impl Iterator<Item = &str> {
        self.banks.keys().map(String::as_str)
    }

    pub fn catalog(&self, bank: &str) -> Option<&RegisterCatalog> {
        self.banks
            .get(&bank.to_ascii_lowercase())
            .map(|entry| &entry.catalog)
    }

    /// Current display of one register
    pub fn view(&self, path: &RegisterPath) -> Option<RegisterView> {
        self.raw(path).map(|raw| self.build_view(path.clone(), raw))
    }

    /// Current display of a bank, in address order
    pub fn bank_view(&self, bank: &str) -> Vec<RegisterView> {
        let bank_key = bank.to_ascii_lowercase();
        let Some(entry) = self.banks.get(&bank_key) else {
            return Vec::new();
        };

        entry
            .catalog
            .iter()
            .filter_map(|descriptor| {
                let path = RegisterPath::new(&bank_key, &descriptor.name);
                entry
                    .latest
                    .get(&descriptor.name)
                    .map(|raw| self.build_view(path, raw))
            })
            .collect()
    }

    /// Current display of a bank arranged in rows of `columns` registers
    pub fn bank_grid(&self, bank: &str, columns: usize) -> Result<DisplayGrid<RegisterView>> {
        DisplayGrid::layout(self.bank_view(bank), columns)
    }

    /// Set one word of a register from user-entered hex text
    ///
    /// Text that is not valid hex sets the word to 0 (see
    /// [`decode_hex`](crate::codec::decode_hex)).
    pub fn edit_word(&mut self, path: &RegisterPath, index: usize, text: &str) -> Result<()> {
        self.set_word(path, index, decode_hex(text))
    }

    /// Set one word of a register, moving it to `Editing`
    pub fn set_word(&mut self, path: &RegisterPath, index: usize, value: u32) -> Result<()> {
        let mut values = self.editable_values(path)?;
        let len = values.len();
        let word = values
            .get_mut(index)
            .ok_or_else(|| RegisterError::WordOutOfRange {
                register: path.to_string(),
                index,
                len,
            })?;
        *word = value;

        self.stage(path, values);
        Ok(())
    }

    /// Set one named field of a register, moving it to `Editing`
    ///
    /// Requires a field layout from the register definitions. The eventual
    /// write-back still carries the whole register.
    pub fn edit_field(&mut self, path: &RegisterPath, field: &str, value: u32) -> Result<()> {
        let mut values = self.editable_values(path)?;
        let range = self
            .definitions
            .field_spec(path.bank(), path.name())
            .and_then(|spec| spec.get(field))
            .ok_or_else(|| RegisterError::UnknownField(field.to_string()))?;

        check_fits(field, range, value)?;
        write_field(&mut values, range, value)?;

        self.stage(path, values);
        Ok(())
    }

    /// Write the register's edit buffer back through `dispatcher`
    ///
    /// Issues exactly one command with the full buffer and moves the
    /// register to `Committing`.
    pub fn commit<S: CommandSink>(
        &mut self,
        path: &RegisterPath,
        dispatcher: &WriteBackDispatcher<S>,
    ) -> Result<()> {
        let buffer = self
            .buffers
            .get_mut(path)
            .ok_or_else(|| RegisterError::NoPendingEdit(path.to_string()))?;
        if !buffer.dirty {
            return Err(RegisterError::CommitInFlight(path.to_string()));
        }

        dispatcher.commit_register(path, &buffer.values);
        buffer.dirty = false;
        Ok(())
    }

    /// Discard any local edit, returning the register to `Clean`
    ///
    /// Returns whether there was anything to discard.
    pub fn cancel(&mut self, path: &RegisterPath) -> bool {
        let discarded = self.buffers.remove(path).is_some();
        if discarded {
            tracing::debug!("Discarded local edit of '{}'", path);
        }
        discarded
    }

    /// Give up on an in-flight write, resynchronising from the latest snapshot
    ///
    /// Only affects a register in `Committing`. Nothing is retried.
    pub fn commit_failed(&mut self, path: &RegisterPath) -> bool {
        if self.state(path) != EditState::Committing {
            return false;
        }
        self.buffers.remove(path);
        tracing::warn!("Write to '{}' failed, showing device value", path);
        true
    }

    fn raw(&self, path: &RegisterPath) -> Option<&RawRegister> {
        self.banks
            .get(path.bank())
            .and_then(|entry| entry.latest.get(path.name()))
    }

    fn is_read_only(&self, path: &RegisterPath, raw: &RawRegister) -> bool {
        raw.read_only
            || self
                .definitions
                .get(path.bank(), path.name())
                .is_some_and(|definition| definition.read_only)
    }

    fn editable_values(&self, path: &RegisterPath) -> Result<Vec<u32>> {
        let raw = self
            .raw(path)
            .ok_or_else(|| RegisterError::UnknownRegister(path.to_string()))?;
        if self.is_read_only(path, raw) {
            return Err(RegisterError::ReadOnly(path.to_string()));
        }

        Ok(display_values(self.buffers.get(path), Some(raw))
            .unwrap_or_default()
            .to_vec())
    }

    fn stage(&mut self, path: &RegisterPath, values: Vec<u32>) {
        if self.state(path) == EditState::Clean {
            tracing::debug!("Started editing '{}'", path);
        }
        self.buffers.insert(
            path.clone(),
            EditBuffer {
                values,
                dirty: true,
            },
        );
    }

    fn build_view(&self, path: RegisterPath, raw: &RawRegister) -> RegisterView {
        let buffer = self.buffers.get(&path);
        let values = display_values(buffer, Some(raw))
            .unwrap_or_default()
            .to_vec();
        let fields = match self.definitions.field_spec(path.bank(), path.name()) {
            Some(spec) => Some(decode_fields_words(&values, spec)),
            None => raw.fields.clone(),
        };

        RegisterView {
            name: path.name().to_string(),
            address: raw.address,
            read_only: self.is_read_only(&path, raw),
            state: state_of(buffer),
            values,
            fields,
            path,
        }
    }
}

fn state_of(buffer: Option<&EditBuffer>) -> EditState {
    buffer.map_or(EditState::Clean, EditBuffer::state)
}

fn display_values<'a>(
    buffer: Option<&'a EditBuffer>,
    raw: Option<&'a RawRegister>,
) -> Option<&'a [u32]> {
    match buffer {
        Some(buffer) => Some(&buffer.values),
        None => raw.map(|raw| raw.values.as_slice()),
    }
}
