use thiserror::Error;

/// Convenient result alias for the structurebot library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Raised when a type name has no match in static data.
    #[error("unknown type name: {name}{}", format_suggestions(.suggestions))]
    TypeNotFound {
        name: String,
        suggestions: Vec<String>,
    },

    /// Raised when a type id has no match in static data.
    #[error("unknown type id: {type_id}")]
    TypeIdNotFound { type_id: i64 },

    /// Raised when a fitted module or hull cannot be resolved while deriving
    /// fuel consumption. Indicates stale or malformed upstream data.
    #[error("structure {structure_id}: cannot resolve type {name} ({type_id})")]
    UnresolvedModule {
        structure_id: i64,
        type_id: i64,
        name: String,
    },

    /// Raised when ESI does not know the requested corporation.
    #[error("unknown corporation: {name}")]
    CorporationNotFound { name: String },

    /// Raised when an upstream timestamp cannot be parsed.
    #[error("invalid timestamp '{value}': {message}")]
    InvalidTimestamp { value: String, message: String },

    /// Raised when type catalog data fails validation.
    #[error("invalid type catalog: {message}")]
    CatalogValidation { message: String },

    /// Raised when duplicate type names are encountered during catalog load.
    #[error("duplicate type name encountered: {name}")]
    DuplicateTypeName { name: String },

    /// Raised when two catalog rows share a type id.
    #[error("duplicate type id {type_id} for '{name}' (already used by '{existing}')")]
    DuplicateTypeId {
        type_id: i64,
        name: String,
        existing: String,
    },

    /// Non-success response from ESI.
    #[error("ESI {endpoint} returned {status}: {message}")]
    Esi {
        endpoint: String,
        status: u16,
        message: String,
    },

    /// Raised when a request kept failing with retryable errors.
    #[error("ESI {endpoint} failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        endpoint: String,
        attempts: u32,
        last: Box<Error>,
    },

    /// Raised when the SSO token exchange fails.
    #[error("SSO authentication failed: {message}")]
    Auth { message: String },

    /// Raised when required configuration is missing or malformed.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// Wrapper for SQLite errors.
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapper for HTTP client errors.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Wrapper for JSON decoding errors.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether retrying the failed request may succeed.
    ///
    /// Only connection problems, timeouts and ESI server errors qualify.
    /// Everything else is a bug or bad data and fails immediately.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Esi { status, .. } => (500..600).contains(status),
            Error::Http(err) => match err.status() {
                Some(status) => status.is_server_error(),
                None => err.is_connect() || err.is_timeout(),
            },
            _ => false,
        }
    }
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else if suggestions.len() == 1 {
        format!(". Did you mean '{}'?", suggestions[0])
    } else {
        format!(
            ". Did you mean one of: {}?",
            suggestions
                .iter()
                .map(|s| format!("'{}'", s))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}
