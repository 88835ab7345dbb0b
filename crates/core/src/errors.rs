use thiserror::Error;

/// Unified error type for the entire crypto-dashboard-core library.
/// Every fallible public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Storage / File ──────────────────────────────────────────────
    #[error("File I/O error: {0}")]
    FileIO(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Persistence failed: {0}")]
    Persistence(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    // ── Async Runtime ───────────────────────────────────────────────
    #[error("Runtime error: {0}")]
    Runtime(String),

    // ── Business Logic ──────────────────────────────────────────────
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Cryptocurrency not found: {0}")]
    NotFound(String),
}

/// The specific rule a create/update request violated.
///
/// Raised before any state is touched, so a rejected request never
/// leaves a trace in the catalog or on disk.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("symbol '{symbol}' must be 2-5 characters (got {len})")]
    SymbolLength { symbol: String, len: usize },

    #[error("a cryptocurrency with symbol '{0}' already exists")]
    DuplicateSymbol(String),

    #[error("a cryptocurrency with id '{0}' already exists")]
    DuplicateId(String),
}

/// A rejected or repaired row in the records file.
///
/// Collected into a load report; never returned as `Err` from a load.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("line {line}: {reason}")]
pub struct ParseError {
    pub line: u64,
    pub reason: String,
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::FileIO(e.to_string())
    }
}

impl From<csv::Error> for CoreError {
    fn from(e: csv::Error) -> Self {
        if e.is_io_error() {
            CoreError::FileIO(e.to_string())
        } else {
            CoreError::Deserialization(e.to_string())
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}
