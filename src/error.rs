//! Custom error types for litcurator.
//!
//! This module defines all error types used throughout the pipeline.
//! All functions return `Result<T, CuratorError>` instead of using `unwrap()`.

use thiserror::Error;

/// Main error type for litcurator operations.
///
/// Uses `thiserror` for ergonomic error handling and automatic `Display` implementation.
#[derive(Debug, Error)]
pub enum CuratorError {
    /// XML parsing error (EBSCO export or TEI document)
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// CSV read/write error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Network/HTTP request error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Rate limited by external API
    #[error("Rate limited, retry after {0}s")]
    RateLimited(u64),

    /// External API returned an error
    #[error("API error: {code} - {message}")]
    Api {
        /// Error code from API
        code: i32,
        /// Error message from API
        message: String,
    },

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Input validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias using `CuratorError`
pub type Result<T> = std::result::Result<T, CuratorError>;
