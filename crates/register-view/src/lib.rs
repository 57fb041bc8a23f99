//! Register view-model
//!
//! Takes periodically refreshed snapshots of device register state,
//! reconciles them with local edits that are not yet committed, lays the
//! registers out as a grid, decodes raw words into named bit-fields and turns
//! a confirmed edit into a single write-back command.
//!
//! Everything here runs on one logical thread. Callers serialise snapshot
//! application and user input; the store itself holds no locks.

pub mod catalog;
pub mod codec;
pub mod definitions;
pub mod dispatch;
pub mod error;
pub mod grid;
pub mod store;


pub use catalog::{BankSnapshot, RawRegister, RegisterCatalog, RegisterDescriptor};
pub use codec::{
    decode_fields, decode_hex, encode_fields, encode_hex, encode_hex_padded, BitRange, FieldMap,
    FieldSpec,
};
pub use definitions::{RegisterDefinition, RegisterDefinitions};
pub use dispatch::{CommandSink, WriteBackDispatcher, WriteCommand};
pub use error::{RegisterError, Result};
pub use grid::DisplayGrid;
pub use store::{EditState, RegisterChange, RegisterPath, RegisterStore, RegisterView};
