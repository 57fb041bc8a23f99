//! Error types for the register dashboard service

use register_view::RegisterError;

/// Errors that can occur in the register dashboard service
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Register(#[from] RegisterError),

    #[error("Dashboard error: {0}")]
    Dashboard(String),
}

/// Result type alias for dashboard service operations
pub type Result<T> = std::result::Result<T, DashboardError>;
