#![allow(dead_code)]

use std::cell::{Ref, RefCell};
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

use pgtyped::error::DbError;
use pgtyped::introspect::catalog::{TypeCatalog, TypeMapping};
use pgtyped::introspect::session::{Column, Connector, SchemaColumn, Session, TypeId};

pub(crate) const BOOL: TypeId = TypeId(16);
pub(crate) const INT8: TypeId = TypeId(20);
pub(crate) const INT4: TypeId = TypeId(23);
pub(crate) const TEXT: TypeId = TypeId(25);
pub(crate) const FLOAT8: TypeId = TypeId(701);
pub(crate) const VARCHAR: TypeId = TypeId(1043);
pub(crate) const DATE: TypeId = TypeId(1082);
pub(crate) const TIMESTAMPTZ: TypeId = TypeId(1184);
pub(crate) const NUMERIC: TypeId = TypeId(1700);
pub(crate) const UUID: TypeId = TypeId(2950);
pub(crate) const TSVECTOR: TypeId = TypeId(3614);
pub(crate) const JSONB: TypeId = TypeId(3802);

pub(crate) fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from("tests/fixtures").join(name)
}

pub(crate) fn read_fixture(name: &str) -> String {
    std::fs::read_to_string(fixture_path(name)).expect("fixture should be readable")
}

pub(crate) fn type_names() -> HashMap<TypeId, String> {
    [
        (BOOL, "bool"),
        (INT8, "int8"),
        (INT4, "int4"),
        (TEXT, "text"),
        (FLOAT8, "float8"),
        (VARCHAR, "varchar"),
        (DATE, "date"),
        (TIMESTAMPTZ, "timestamptz"),
        (NUMERIC, "numeric"),
        (UUID, "uuid"),
        (TSVECTOR, "tsvector"),
        (JSONB, "jsonb"),
    ]
    .into_iter()
    .map(|(id, name)| (id, name.to_string()))
    .collect()
}

pub(crate) fn catalog() -> TypeCatalog {
    TypeCatalog::new(type_names(), TypeMapping::postgres())
}

pub(crate) fn column(name: &str, type_id: TypeId) -> Column {
    Column::new(name, type_id)
}

pub(crate) fn schema_column(table: &str, column: &str, type_name: &str) -> SchemaColumn {
    SchemaColumn {
        table: table.to_string(),
        column: column.to_string(),
        type_name: type_name.to_string(),
    }
}

/// Scripted answers plus everything the code under test asked for.
#[derive(Debug, Default)]
pub(crate) struct Script {
    columns: Vec<(String, Vec<Column>)>,
    plan_types: Vec<(String, Vec<TypeId>)>,
    failing_plans: Vec<String>,
    schema: Vec<SchemaColumn>,
    probe_failures: usize,
    schema_failures: usize,
    connect_failures: usize,
    connection_limit: Option<usize>,
    registered_plans: HashMap<String, String>,

    pub connects: usize,
    pub rollbacks: usize,
    pub deallocations: usize,
    pub probes: Vec<String>,
    pub prepared: Vec<String>,
    pub schema_lookups: Vec<String>,
}

impl Script {
    pub(crate) fn has_registered_plans(&self) -> bool {
        !self.registered_plans.is_empty()
    }
}

/// In-memory database: a `Connector` whose sessions answer from a shared script.
///
/// Column descriptors and plan parameter types are matched by substring
/// against the probe or plan SQL; the first matching entry wins.
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeDatabase {
    script: Rc<RefCell<Script>>,
}

impl FakeDatabase {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_columns(self, needle: &str, columns: Vec<Column>) -> Self {
        self.script
            .borrow_mut()
            .columns
            .push((needle.to_string(), columns));
        self
    }

    pub(crate) fn with_plan_types(self, needle: &str, types: Vec<TypeId>) -> Self {
        self.script
            .borrow_mut()
            .plan_types
            .push((needle.to_string(), types));
        self
    }

    pub(crate) fn with_failing_plan(self, needle: &str) -> Self {
        self.script
            .borrow_mut()
            .failing_plans
            .push(needle.to_string());
        self
    }

    pub(crate) fn with_schema(self, columns: Vec<SchemaColumn>) -> Self {
        self.script.borrow_mut().schema.extend(columns);
        self
    }

    pub(crate) fn with_probe_failures(self, count: usize) -> Self {
        self.script.borrow_mut().probe_failures = count;
        self
    }

    pub(crate) fn with_schema_failures(self, count: usize) -> Self {
        self.script.borrow_mut().schema_failures = count;
        self
    }

    pub(crate) fn with_connect_failures(self, count: usize) -> Self {
        self.script.borrow_mut().connect_failures = count;
        self
    }

    /// Refuse every connection after the first `limit`.
    pub(crate) fn with_connection_limit(self, limit: usize) -> Self {
        self.script.borrow_mut().connection_limit = Some(limit);
        self
    }

    pub(crate) fn script(&self) -> Ref<'_, Script> {
        self.script.borrow()
    }

    pub(crate) fn session(&self) -> FakeSession {
        FakeSession {
            script: Rc::clone(&self.script),
        }
    }
}

impl Connector for FakeDatabase {
    type Session = FakeSession;

    fn connect(&self) -> Result<FakeSession, DbError> {
        let mut script = self.script.borrow_mut();
        script.connects += 1;
        let over_limit = script
            .connection_limit
            .is_some_and(|limit| script.connects > limit);
        if over_limit || script.connect_failures > 0 {
            script.connect_failures = script.connect_failures.saturating_sub(1);
            return Err(DbError::message("connection refused"));
        }
        Ok(self.session())
    }
}

pub(crate) struct FakeSession {
    script: Rc<RefCell<Script>>,
}

impl Session for FakeSession {
    fn type_names(&mut self) -> Result<HashMap<TypeId, String>, DbError> {
        Ok(type_names())
    }

    fn describe_probe(&mut self, sql: &str) -> Result<Vec<Column>, DbError> {
        let mut script = self.script.borrow_mut();
        script.probes.push(sql.to_string());
        if script.probe_failures > 0 {
            script.probe_failures -= 1;
            return Err(DbError::message("current transaction is aborted"));
        }
        script
            .columns
            .iter()
            .find(|(needle, _)| sql.contains(needle.as_str()))
            .map(|(_, columns)| columns.clone())
            .ok_or_else(|| DbError::message(format!("no scripted columns for: {sql}")))
    }

    fn rollback(&mut self) -> Result<(), DbError> {
        self.script.borrow_mut().rollbacks += 1;
        Ok(())
    }

    fn prepare_plan(&mut self, plan: &str, sql: &str) -> Result<(), DbError> {
        let mut script = self.script.borrow_mut();
        script.prepared.push(sql.to_string());
        if script
            .failing_plans
            .iter()
            .any(|needle| sql.contains(needle.as_str()))
        {
            return Err(DbError::message("could not determine data type of parameter $1"));
        }
        script
            .registered_plans
            .insert(plan.to_string(), sql.to_string());
        Ok(())
    }

    fn plan_parameter_types(&mut self, plan: &str) -> Result<Option<Vec<TypeId>>, DbError> {
        let script = self.script.borrow();
        let Some(sql) = script.registered_plans.get(plan) else {
            return Ok(None);
        };
        Ok(Some(
            script
                .plan_types
                .iter()
                .find(|(needle, _)| sql.contains(needle.as_str()))
                .map(|(_, types)| types.clone())
                .unwrap_or_default(),
        ))
    }

    fn deallocate_plan(&mut self, plan: &str) -> Result<(), DbError> {
        let mut script = self.script.borrow_mut();
        script.deallocations += 1;
        match script.registered_plans.remove(plan) {
            Some(_) => Ok(()),
            None => Err(DbError::message(format!(
                "prepared statement \"{plan}\" does not exist"
            ))),
        }
    }

    fn schema_columns(&mut self, column: &str) -> Result<Vec<SchemaColumn>, DbError> {
        let mut script = self.script.borrow_mut();
        script.schema_lookups.push(column.to_string());
        if script.schema_failures > 0 {
            script.schema_failures -= 1;
            return Err(DbError::message("server closed the connection unexpectedly"));
        }
        Ok(script
            .schema
            .iter()
            .filter(|c| c.column == column)
            .cloned()
            .collect())
    }
}
