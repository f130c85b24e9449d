//! Error type definitions.
//!
//! This module defines the setup error enums and the error, warning, and info
//! categories counted while a sweep runs.

use std::path::PathBuf;

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),
}

/// Error types for database operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error creating the database file.
    #[error("Database file creation error: {0}")]
    FileCreationError(String),

    /// SQL execution error.
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),

    /// Error applying the schema migrations.
    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    /// Error serializing an evaluator record into a JSON column.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Error types for reading the ranked domain list.
#[derive(Error, Debug)]
pub enum InputError {
    /// The input file could not be opened.
    #[error("Cannot read domain list {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The delimited input could not be tokenized.
    #[error("Malformed domain list: {0}")]
    Malformed(#[from] csv::Error),
}

/// Error types for invalid run parameters.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("workers must be at least 1")]
    ZeroWorkers,

    #[error("retry budget must allow at least one attempt")]
    ZeroRetryBudget,

    #[error("connect and total timeouts must be non-zero")]
    ZeroTimeout,

    #[error("backoff base ({base_ms} ms) must be at least 1 ms and not exceed the backoff max ({max_ms} ms)")]
    InvalidBackoff { base_ms: u64, max_ms: u64 },

    #[error("tier boundaries must satisfy 1 <= top ({top}) <= mid ({mid})")]
    InvalidTierBoundaries { top: u64, mid: u64 },
}

/// Error types for the dataset sink.
#[derive(Error, Debug)]
pub enum SinkError {
    /// Error opening or writing the CSV file.
    #[error("Dataset I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error encoding a CSV record.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The existing dataset was written with a different column layout.
    #[error("Existing dataset {path} has a different header; refusing to append")]
    HeaderMismatch { path: PathBuf },

    /// Error writing to the SQLite mirror.
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Types of errors that can occur while processing a domain.
///
/// Fetch failures are counted once per attempt, so a domain retried three times
/// on timeouts contributes three `FetchTimeout` counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum ErrorType {
    // Network failures
    FetchTimeout,
    DnsFailure,
    TlsFailure,
    ConnectFailure,
    // Protocol failures
    HttpClientError,      // 4xx other than 429
    HttpTooManyRequests,  // 429
    HttpServerError,      // 5xx
    RedirectLoop,
    // Orchestration failures
    RetryBudgetExhausted,
    Cancelled,
    EvaluationPanic,
    // Output
    SinkWriteError,
    DuplicateRowRejected,
}

/// Types of warnings that can occur while processing a domain.
///
/// Warnings mark rows that were written but carry degraded data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum WarningType {
    MetricNotComputable, // At least one metric feature is NA
    MarkupParseErrors,   // The tolerant parser reported errors
    BodyTruncated,       // Body exceeded the size cap
}

/// Types of informational metrics that can occur while processing a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum InfoType {
    HttpRedirect,      // At least one redirect was followed
    HttpsToHttpFallback, // TLS failed and the page was retried over HTTP
    RetryScheduled,    // A transient failure scheduled another attempt
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::FetchTimeout => "Fetch timeout",
            ErrorType::DnsFailure => "DNS resolution failure",
            ErrorType::TlsFailure => "TLS failure",
            ErrorType::ConnectFailure => "Connection refused/reset",
            ErrorType::HttpClientError => "HTTP client error (4xx)",
            ErrorType::HttpTooManyRequests => "Too many requests (429)",
            ErrorType::HttpServerError => "HTTP server error (5xx)",
            ErrorType::RedirectLoop => "Redirect loop",
            ErrorType::RetryBudgetExhausted => "Retry budget exhausted",
            ErrorType::Cancelled => "Cancelled",
            ErrorType::EvaluationPanic => "Evaluator panicked",
            ErrorType::SinkWriteError => "Dataset write error",
            ErrorType::DuplicateRowRejected => "Duplicate row rejected",
        }
    }
}

impl WarningType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningType::MetricNotComputable => "Metric not computable",
            WarningType::MarkupParseErrors => "Markup parse errors",
            WarningType::BodyTruncated => "Response body truncated",
        }
    }
}

impl InfoType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InfoType::HttpRedirect => "HTTP redirect",
            InfoType::HttpsToHttpFallback => "HTTPS to HTTP fallback",
            InfoType::RetryScheduled => "Retry scheduled",
        }
    }
}
