use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::DbError;
use crate::introspect::session::{Session, TypeId};

/// Host (Python) type a database type maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostType {
    /// `int`
    Int,
    /// `float`
    Float,
    /// `str`
    Str,
    /// `bool`
    Bool,
    /// `datetime.date`
    Date,
    /// `datetime.datetime`
    Datetime,
    /// `dict` (json / jsonb documents).
    Dict,
    /// `uuid.UUID`
    Uuid,
    /// `Any`: the type could not be determined.
    #[serde(rename = "any")]
    Dynamic,
}

impl HostType {
    /// Python annotation for this type.
    pub fn python(self) -> &'static str {
        match self {
            HostType::Int => "int",
            HostType::Float => "float",
            HostType::Str => "str",
            HostType::Bool => "bool",
            HostType::Date => "datetime.date",
            HostType::Datetime => "datetime.datetime",
            HostType::Dict => "dict",
            HostType::Uuid => "uuid.UUID",
            HostType::Dynamic => "Any",
        }
    }

    /// `true` for the two temporal types, which need `import datetime`.
    pub fn is_temporal(self) -> bool {
        matches!(self, HostType::Date | HostType::Datetime)
    }
}

impl fmt::Display for HostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.python())
    }
}

/// Canonical `PostgreSQL` type name → host type table.
///
/// Immutable once built; passed explicitly to every consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMapping {
    entries: BTreeMap<String, HostType>,
}

impl TypeMapping {
    /// The built-in table for `PostgreSQL` canonical type names.
    pub fn postgres() -> Self {
        let entries = [
            ("int2", HostType::Int),
            ("int4", HostType::Int),
            ("int8", HostType::Int),
            ("float4", HostType::Float),
            ("float8", HostType::Float),
            ("numeric", HostType::Float),
            ("text", HostType::Str),
            ("varchar", HostType::Str),
            ("char", HostType::Str),
            ("bpchar", HostType::Str),
            ("bool", HostType::Bool),
            ("date", HostType::Date),
            ("timestamp", HostType::Datetime),
            ("timestamptz", HostType::Datetime),
            ("json", HostType::Dict),
            ("jsonb", HostType::Dict),
            ("uuid", HostType::Uuid),
        ]
        .into_iter()
        .map(|(name, host)| (name.to_string(), host))
        .collect();
        Self { entries }
    }

    /// Layer overrides from a JSON object (`{"citext": "str"}`) over this table.
    ///
    /// Override entries replace built-in entries with the same name.
    pub fn with_overrides_json(mut self, json: &str) -> Result<Self, String> {
        let parsed: HashMap<String, HostType> =
            serde_json::from_str(json).map_err(|e| format!("Invalid type override JSON: {e}"))?;
        for (name, host) in parsed {
            self.entries.insert(name.to_ascii_lowercase(), host);
        }
        Ok(self)
    }

    /// Map a canonical type name to its host type; unknown names map to `Dynamic`.
    pub fn resolve(&self, canonical: &str) -> HostType {
        self.entries
            .get(canonical)
            .or_else(|| self.entries.get(&canonical.to_ascii_lowercase()))
            .copied()
            .unwrap_or(HostType::Dynamic)
    }
}

impl Default for TypeMapping {
    fn default() -> Self {
        Self::postgres()
    }
}

/// Per-session view of the database's type catalog.
#[derive(Debug, Clone)]
pub struct TypeCatalog {
    names: HashMap<TypeId, String>,
    mapping: TypeMapping,
}

impl TypeCatalog {
    /// Build a catalog from an already loaded identifier → name table.
    pub fn new(names: HashMap<TypeId, String>, mapping: TypeMapping) -> Self {
        Self { names, mapping }
    }

    /// Load the identifier → name table from the session in one round trip.
    pub fn load<S: Session + ?Sized>(session: &mut S, mapping: &TypeMapping) -> Result<Self, DbError> {
        let names = session.type_names()?;
        debug!(types = names.len(), "loaded type catalog");
        Ok(Self::new(names, mapping.clone()))
    }

    /// Canonical name of a type identifier, when the catalog knows it.
    pub fn canonical_name(&self, type_id: TypeId) -> Option<&str> {
        self.names.get(&type_id).map(String::as_str)
    }

    /// Map a canonical type name to its host type.
    pub fn resolve(&self, canonical: &str) -> HostType {
        self.mapping.resolve(canonical)
    }

    /// Map a type identifier straight to its host type.
    pub fn host_type(&self, type_id: TypeId) -> HostType {
        self.canonical_name(type_id)
            .map_or(HostType::Dynamic, |name| self.resolve(name))
    }
}
