//! Error types for the register view-model

/// Errors reported by the register view-model
///
/// Hex parse failures are never reported here: they decode to zero.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegisterError {
    #[error("Invalid column count {0}: must be at least 1")]
    InvalidColumns(usize),

    #[error("Invalid bit range {lo}..={hi}")]
    InvalidBitRange { lo: u32, hi: u32 },

    #[error("Field '{field}' is {width} bits wide, maximum is 32")]
    FieldTooWide { field: String, width: u32 },

    #[error("Field '{field}' ends at bit {hi}, register is only {width_bits} bits wide")]
    FieldOutOfRange {
        field: String,
        hi: u32,
        width_bits: u32,
    },

    #[error("Fields '{first}' and '{second}' overlap")]
    OverlappingFields { first: String, second: String },

    #[error("Field '{0}' is declared more than once")]
    DuplicateField(String),

    #[error("Unknown field '{0}'")]
    UnknownField(String),

    #[error("Value {value:#X} does not fit in field '{field}' ({width} bits)")]
    FieldValueTooWide {
        field: String,
        value: u32,
        width: u32,
    },

    #[error("Field spec is {0} bits wide and cannot be packed into a single word")]
    SpecTooWide(u32),

    #[error("Unknown register '{0}'")]
    UnknownRegister(String),

    #[error("Register '{0}' is read-only")]
    ReadOnly(String),

    #[error("Word index {index} out of range for register '{register}' ({len} words)")]
    WordOutOfRange {
        register: String,
        index: usize,
        len: usize,
    },

    #[error("Register '{0}' has no pending edit")]
    NoPendingEdit(String),

    #[error("Register '{0}' already has a write in flight")]
    CommitInFlight(String),

    #[error("Register definitions error: {0}")]
    Definitions(String),
}

/// Result type alias for register view-model operations
pub type Result<T> = std::result::Result<T, RegisterError>;
