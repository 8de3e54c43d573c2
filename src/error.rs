use thiserror::Error;

/// Uniform failure of every exchange call.
///
/// `http_status == 0` means the request never produced an HTTP response
/// (connect/timeout/decode failure).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Exchange API error {http_status}: [{}] {message}", code_label(.code))]
pub struct ExchangeError {
    pub http_status: u16,
    pub code: Option<i64>,
    pub message: String,
}

fn code_label(code: &Option<i64>) -> String {
    code.map(|c| c.to_string())
        .unwrap_or_else(|| "-".to_string())
}

impl ExchangeError {
    pub fn new(http_status: u16, code: Option<i64>, message: impl Into<String>) -> Self {
        Self {
            http_status,
            code,
            message: message.into(),
        }
    }

    /// Unknown symbol or missing quote
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(404, None, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(0, None, format!("Network error: {}", message.into()))
    }

    pub fn is_not_found(&self) -> bool {
        self.http_status == 404
    }

    pub fn is_transport(&self) -> bool {
        self.http_status == 0
    }
}

impl From<reqwest::Error> for ExchangeError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => ExchangeError::new(status.as_u16(), None, err.to_string()),
            None => ExchangeError::network(err.to_string()),
        }
    }
}

/// Main error type for the DCA bot
#[derive(Error, Debug)]
pub enum DcaError {
    // Rejected before any network call
    #[error("Configuration error: {0}")]
    Configuration(String),

    // Config file / environment loading
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Signature error: {0}")]
    Signature(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for DcaError
pub type Result<T> = std::result::Result<T, DcaError>;

impl DcaError {
    /// Process exit code the binary reports for this failure
    pub fn exit_code(&self) -> i32 {
        match self {
            DcaError::Configuration(_) | DcaError::Config(_) => 2,
            DcaError::Exchange(_) => 3,
            DcaError::Database(_) | DcaError::Migration(_) => 4,
            _ => 5,
        }
    }
}
