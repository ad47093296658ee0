use std::path::PathBuf;

use thiserror::Error;

/// Failure reported by the database driver or by a session round trip.
#[derive(Debug, Error)]
pub enum DbError {
    /// Error raised by the `PostgreSQL` client.
    #[error(transparent)]
    Postgres(#[from] postgres::Error),
    /// Error described by a plain message (used by non-`PostgreSQL` sessions).
    #[error("{0}")]
    Message(String),
}

impl DbError {
    /// Build a message-only error.
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

/// Structural problem in an annotated query file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The file contained no marker with a SQL body and no bare SQL either.
    #[error("no queries found")]
    NoQueries,
    /// A marker carried a `query_type` that is neither `single` nor `multi`.
    #[error("unknown query_type '{value}' (expected 'single' or 'multi')")]
    UnknownQueryType {
        /// The directive value as written.
        value: String,
    },
    /// A `name` directive value is not a plain identifier.
    #[error("invalid query name '{value}' (expected letters, digits and underscores)")]
    InvalidQueryName {
        /// The directive value as written.
        value: String,
    },
}

/// Fatal error for one generation run; nothing is written when one is returned.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The input file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// Input file path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The input file is malformed or empty.
    #[error("{}: {source}", path.display())]
    Parse {
        /// Input file path.
        path: PathBuf,
        /// Structural parse failure.
        source: ParseError,
    },
    /// Two queries in the same file would generate the same Python name.
    #[error("duplicate query name '{name}' (also produced by '{previous}')")]
    DuplicateQueryName {
        /// Generated name that collides.
        name: String,
        /// Query that produced the name first.
        previous: String,
    },
    /// A query name would be a Python keyword or shadow a generated module name.
    #[error("query name '{name}' is a Python keyword or a name the generated module uses")]
    ReservedQueryName {
        /// The offending query name.
        name: String,
    },
    /// A database connection could not be opened.
    #[error("failed to connect to the database: {0}")]
    Connect(#[source] DbError),
    /// Column or parameter resolution failed after the retry on a fresh connection.
    #[error("failed to resolve types for query '{query}': {source}")]
    Resolution {
        /// Name of the query being resolved.
        query: String,
        /// Error from the second attempt.
        source: DbError,
    },
    /// The type override file could not be loaded.
    #[error("invalid type overrides: {0}")]
    TypeOverrides(String),
    /// The output file would overwrite the input file.
    #[error("refusing to overwrite input file {}", path.display())]
    OutputIsInput {
        /// The shared path.
        path: PathBuf,
    },
    /// The generated file could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        /// Output file path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}
