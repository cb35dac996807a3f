//! Error types for the onboarding client.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    #[error("Wizard error: {0}")]
    Wizard(#[from] WizardError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Key-value store errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Errors raised while talking to the onboarding endpoints.
///
/// Every variant is rendered to the user as a plain string; the split only
/// exists so callers can log them differently.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// A required field is missing or malformed. No request was sent.
    #[error("{0}")]
    Validation(String),

    /// The request never produced a response.
    #[error("{0}")]
    Transport(String),

    /// A response arrived but was non-2xx or unparsable.
    #[error("{message}")]
    Application { status: u16, message: String },

    #[error("Failed to read attachment {path}: {source}")]
    Attachment {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Organization list / detail errors.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("Request to {url} failed: {reason}")]
    RequestFailed { url: String, reason: String },

    #[error("Organization {0} not found")]
    NotFound(String),

    #[error("Unexpected response from {url}: {reason}")]
    InvalidResponse { url: String, reason: String },
}

/// Wizard orchestration errors.
#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("The onboarding flow has already finished")]
    Finished,

    #[error("Invalid organization ID: {0}")]
    InvalidOrganizationId(String),
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
