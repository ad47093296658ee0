use std::collections::HashMap;
use std::fmt;

use crate::error::DbError;

/// Opaque database type identifier (a `PostgreSQL` OID).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One result column as described by the database, in positional order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Column label as returned by the database.
    pub name: String,
    /// Native type identifier of the column.
    pub type_id: TypeId,
}

impl Column {
    /// Build a column descriptor.
    pub fn new(name: impl Into<String>, type_id: TypeId) -> Self {
        Self {
            name: name.into(),
            type_id,
        }
    }
}

/// A table column found in the live schema metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaColumn {
    /// Table owning the column.
    pub table: String,
    /// Column name.
    pub column: String,
    /// Canonical (catalog) type name of the column, e.g. `uuid` or `timestamptz`.
    pub type_name: String,
}

/// A live database session.
///
/// All calls block until the database answers. Implementations scope every
/// statement handle to the call that created it.
pub trait Session {
    /// Load the full type identifier → canonical type name table.
    fn type_names(&mut self) -> Result<HashMap<TypeId, String>, DbError>;

    /// Execute a probe statement written with `$n` placeholders, binding `NULL`
    /// to every placeholder, and return its result descriptor without reading rows.
    fn describe_probe(&mut self, sql: &str) -> Result<Vec<Column>, DbError>;

    /// Roll back the session's current transaction, if any.
    fn rollback(&mut self) -> Result<(), DbError>;

    /// Register `sql` (written with `$n` placeholders) as the named prepared plan `plan`.
    fn prepare_plan(&mut self, plan: &str, sql: &str) -> Result<(), DbError>;

    /// Declared parameter types of the named plan, in placeholder order.
    ///
    /// Returns `None` when no plan with that name is registered.
    fn plan_parameter_types(&mut self, plan: &str) -> Result<Option<Vec<TypeId>>, DbError>;

    /// Drop the named prepared plan.
    fn deallocate_plan(&mut self, plan: &str) -> Result<(), DbError>;

    /// Columns named `column` in the visible schemas, in a stable order.
    fn schema_columns(&mut self, column: &str) -> Result<Vec<SchemaColumn>, DbError>;
}

/// Opens fresh sessions; used for the initial connection and for retries.
pub trait Connector {
    /// Session type produced by this connector.
    type Session: Session;

    /// Open a new session.
    fn connect(&self) -> Result<Self::Session, DbError>;
}
