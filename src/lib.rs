//! Generate typed Python bindings for annotated SQL queries by introspecting a live `PostgreSQL` database.
#![warn(missing_docs)]

/// Error types shared across the crate.
pub mod error;
/// Python binding emission and the per-file generation driver.
pub mod generator;
/// Database introspection behind the `Session` seam.
pub mod introspect;
/// Output file writing and the external formatter pass.
pub mod output;
/// Query file grammar and SQL text inspection.
pub mod parser;
