//! Register definitions
//!
//! Static layout of each register (address, size, access, bit-fields),
//! loaded from the register definition JSON generated from the device's
//! register map. Snapshots only carry field values; the bit positions used
//! to decode and edit fields come from here.
//!
//! ```json
//! { "UDP": { "CTRL": { "addr": 0, "size": 4, "readonly": false,
//!                      "fields": { "ENABLE": 0, "MODE": [1, 3] } } } }
//! ```

use std::collections::HashMap;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::codec::{BitRange, FieldSpec};
use crate::error::{RegisterError, Result};

const DEFAULT_SIZE_BYTES: u32 = 4;

/// A field is either a single bit or an inclusive `[lo, hi]` range
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FieldLocation {
    Bit(u32),
    Range(u32, u32),
}

impl FieldLocation {
    fn to_range(&self) -> Result<BitRange> {
        match *self {
            FieldLocation::Bit(bit) => Ok(BitRange::bit(bit)),
            FieldLocation::Range(lo, hi) => BitRange::new(lo, hi),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DefinitionEntry {
    addr: u32,
    #[serde(default)]
    size: Option<u32>,
    #[serde(default)]
    readonly: bool,
    #[serde(default)]
    fields: Option<IndexMap<String, FieldLocation>>,
}

/// Static description of one register
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterDefinition {
    pub address: u32,
    pub size_bytes: u32,
    pub read_only: bool,
    pub fields: Option<FieldSpec>,
}

impl RegisterDefinition {
    pub fn word_count(&self) -> usize {
        self.size_bytes.div_ceil(4) as usize
    }
}

/// Register definitions grouped by bank
///
/// Bank names are stored lowercase and looked up case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterDefinitions {
    banks: HashMap<String, IndexMap<String, RegisterDefinition>>,
}

impl RegisterDefinitions {
    /// Parse definitions from JSON, validating every field layout
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: IndexMap<String, IndexMap<String, DefinitionEntry>> = serde_json::from_str(json)
            .map_err(|e| RegisterError::Definitions(format!("Invalid JSON: {}", e)))?;

        let mut banks = HashMap::new();
        for (bank, registers) in raw {
            let mut definitions = IndexMap::new();
            for (name, entry) in registers {
                let definition = build_definition(&entry).map_err(|e| {
                    RegisterError::Definitions(format!("{}/{}: {}", bank, name, e))
                })?;
                definitions.insert(name, definition);
            }
            tracing::debug!("Loaded {} register definitions for bank '{}'", definitions.len(), bank);
            banks.insert(bank.to_ascii_lowercase(), definitions);
        }

        Ok(Self { banks })
    }

    /// Load definitions from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RegisterError::Definitions(format!("Failed to read {:?}: {}", path, e))
        })?;
        Self::from_json(&content)
    }

    pub fn get(&self, bank: &str, register: &str) -> Option<&RegisterDefinition> {
        self.banks
            .get(&bank.to_ascii_lowercase())
            .and_then(|registers| registers.get(register))
    }

    pub fn field_spec(&self, bank: &str, register: &str) -> Option<&FieldSpec> {
        self.get(bank, register)
            .and_then(|definition| definition.fields.as_ref())
    }

    pub fn bank_names(&self) -> impl Iterator<Item = &str> {
        self.banks.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.banks.is_empty()
    }
}

fn build_definition(entry: &DefinitionEntry) -> Result<RegisterDefinition> {
    let size_bytes = match entry.size {
        Some(size) if size > 0 => size,
        _ => DEFAULT_SIZE_BYTES,
    };
    let width_bits = size_bytes.checked_mul(8).ok_or_else(|| {
        RegisterError::Definitions(format!("size of {} bytes is too large", size_bytes))
    })?;

    let fields = match &entry.fields {
        Some(fields) => {
            let ranges = fields
                .iter()
                .map(|(name, location)| Ok((name.clone(), location.to_range()?)))
                .collect::<Result<Vec<_>>>()?;
            Some(FieldSpec::new(width_bits, ranges)?)
        }
        None => None,
    };

    Ok(RegisterDefinition {
        address: entry.addr,
        size_bytes,
        read_only: entry.readonly,
        fields,
    })
}
