//! Register catalog
//!
//! Turns one bank of a snapshot (an unordered-by-address mapping of register
//! name to register state) into a stable, address-ordered sequence.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::codec::FieldMap;

/// Register state as delivered by the snapshot feed
///
/// The field names follow the adapter's parameter tree (`addr`, `value`,
/// `readonly`, `fields`); anything else in the tree is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRegister {
    #[serde(rename = "addr", default)]
    pub address: Option<u32>,
    #[serde(rename = "value", default = "default_values")]
    pub values: Vec<u32>,
    #[serde(default)]
    pub fields: Option<FieldMap>,
    #[serde(rename = "readonly", default)]
    pub read_only: bool,
}

fn default_values() -> Vec<u32> {
    vec![0]
}

/// One bank of a snapshot, in the order the feed delivered it
pub type BankSnapshot = IndexMap<String, RawRegister>;

/// A register entry of the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterDescriptor {
    pub name: String,
    pub address: Option<u32>,
    pub values: Vec<u32>,
    pub fields: Option<FieldMap>,
    pub read_only: bool,
}

impl RegisterDescriptor {
    pub fn from_raw(name: &str, raw: &RawRegister) -> Self {
        Self {
            name: name.to_string(),
            address: raw.address,
            values: raw.values.clone(),
            fields: raw.fields.clone(),
            read_only: raw.read_only,
        }
    }

    /// Address used for ordering; a missing address sorts as 0
    pub fn sort_address(&self) -> u32 {
        self.address.unwrap_or(0)
    }
}

/// Address-ordered registers of one bank
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegisterCatalog {
    entries: Vec<RegisterDescriptor>,
}

impl RegisterCatalog {
    /// Build a catalog from a bank snapshot without modifying it
    ///
    /// Entries are sorted by address ascending. The sort is stable, so
    /// registers sharing an address keep the snapshot's key order.
    pub fn build(snapshot: &BankSnapshot) -> Self {
        let mut entries: Vec<RegisterDescriptor> = snapshot
            .iter()
            .map(|(name, raw)| RegisterDescriptor::from_raw(name, raw))
            .collect();
        entries.sort_by_key(RegisterDescriptor::sort_address);

        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&RegisterDescriptor> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisterDescriptor> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[RegisterDescriptor] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<RegisterDescriptor> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
