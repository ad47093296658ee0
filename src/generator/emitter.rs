use std::collections::BTreeSet;
use std::fmt;

use crate::generator::python::{row_value, string_literal};
use crate::introspect::catalog::{HostType, TypeCatalog};
use crate::introspect::param_types::ResolvedParameterTypes;
use crate::introspect::session::Column;
use crate::parser::names::{dedupe_names, python_identifier, python_parameter_name, record_type_name};
use crate::parser::params::parenthesize_cast_binds;
use crate::parser::query_file::{Query, QueryShape};

/// One line of the generated import block.
///
/// Variants are declared in the order of their rendered text, so the derived
/// ordering is the sorted order of the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ImportSpec {
    /// `from dataclasses import dataclass`
    Dataclass,
    /// `from sqlalchemy import text`
    SqlalchemyText,
    /// `from typing import Any, List`
    Typing,
    /// `import datetime`
    Datetime,
    /// `import uuid`
    Uuid,
}

impl ImportSpec {
    /// Imports every unit needs.
    pub const BASE: [ImportSpec; 3] = [
        ImportSpec::Dataclass,
        ImportSpec::SqlalchemyText,
        ImportSpec::Typing,
    ];

    /// The Python import statement.
    pub fn line(self) -> &'static str {
        match self {
            ImportSpec::Dataclass => "from dataclasses import dataclass",
            ImportSpec::SqlalchemyText => "from sqlalchemy import text",
            ImportSpec::Typing => "from typing import Any, List",
            ImportSpec::Datetime => "import datetime",
            ImportSpec::Uuid => "import uuid",
        }
    }
}

impl fmt::Display for ImportSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.line())
    }
}

/// A record field (or the sole scalar value), in result-column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Python attribute name.
    pub name: String,
    /// Resolved host type.
    pub host: HostType,
}

/// `@dataclass` declaration for a query's rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDecl {
    /// Class name.
    pub name: String,
    /// Fields in result-column order.
    pub fields: Vec<Field>,
}

/// A callable argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Bind name used in the SQL text (`:name`).
    pub sql_name: String,
    /// Python argument name.
    pub python_name: String,
    /// Resolved host type.
    pub host: HostType,
}

/// What the generated callable returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnShape {
    /// No result columns: returns `None`.
    Unit,
    /// `Single` shape with one column: returns the value itself.
    Scalar(HostType),
    /// `Single` shape with several columns: returns one record, raises when no row.
    One(String),
    /// `Multi` shape: returns a list of records.
    Many(String),
}

impl ReturnShape {
    /// Select the return shape for a column count and execution shape.
    pub fn select(columns: &[Field], shape: QueryShape, record_name: &str) -> Self {
        match (columns, shape) {
            ([], _) => ReturnShape::Unit,
            ([only], QueryShape::Single) => ReturnShape::Scalar(only.host),
            (_, QueryShape::Single) => ReturnShape::One(record_name.to_string()),
            (_, QueryShape::Multi) => ReturnShape::Many(record_name.to_string()),
        }
    }

    /// `true` when the shape needs a record type.
    pub fn needs_record(&self) -> bool {
        matches!(self, ReturnShape::One(_) | ReturnShape::Many(_))
    }

    fn annotation(&self) -> String {
        match self {
            ReturnShape::Unit => "None".to_string(),
            ReturnShape::Scalar(host) => host.python().to_string(),
            ReturnShape::One(record) => record.clone(),
            ReturnShape::Many(record) => format!("List[{record}]"),
        }
    }

    fn docstring(&self) -> &'static str {
        match self {
            ReturnShape::Unit => "Executes the statement.",
            ReturnShape::Scalar(_) => {
                "Executes the query and returns its single value; raises LookupError when no row is returned."
            }
            ReturnShape::One(_) => {
                "Executes the query and returns its single row; raises LookupError when no row is returned."
            }
            ReturnShape::Many(_) => "Executes the query and returns every row.",
        }
    }
}

/// The generated function for one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallableDecl {
    /// Function name.
    pub name: String,
    /// SQL text, executed through SQLAlchemy `text()` with its `:name` binds.
    pub sql: String,
    /// Arguments, in lexicographic order of their SQL names.
    pub params: Vec<Parameter>,
    /// Result columns read from each row.
    pub columns: Vec<Field>,
    /// Return shape.
    pub returns: ReturnShape,
}

/// Everything generated for one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedUnit {
    /// Record type, present exactly when the return shape needs one.
    pub record: Option<RecordDecl>,
    /// The callable.
    pub callable: CallableDecl,
    /// Imports this unit needs.
    pub imports: BTreeSet<ImportSpec>,
}

impl GeneratedUnit {
    /// Every host type the unit mentions (columns and parameters).
    pub fn host_types(&self) -> impl Iterator<Item = HostType> + '_ {
        self.callable
            .columns
            .iter()
            .map(|f| f.host)
            .chain(self.callable.params.iter().map(|p| p.host))
    }
}

fn required_imports(hosts: impl IntoIterator<Item = HostType>) -> BTreeSet<ImportSpec> {
    let mut imports: BTreeSet<ImportSpec> = ImportSpec::BASE.into_iter().collect();
    for host in hosts {
        if host == HostType::Uuid {
            imports.insert(ImportSpec::Uuid);
        }
        if host.is_temporal() {
            imports.insert(ImportSpec::Datetime);
        }
    }
    imports
}

/// Build the record type and callable for one resolved query.
///
/// `param_types` must hold every parameter of the query; its key order is the
/// argument order of the callable.
pub fn emit_unit(
    query: &Query,
    columns: &[Column],
    param_types: &ResolvedParameterTypes,
    catalog: &TypeCatalog,
) -> GeneratedUnit {
    let field_names = dedupe_names(
        columns
            .iter()
            .enumerate()
            .map(|(idx, c)| python_identifier(&c.name, &format!("column_{}", idx + 1)))
            .collect(),
    );
    let fields: Vec<Field> = columns
        .iter()
        .zip(field_names)
        .map(|(c, name)| Field {
            name,
            host: catalog.host_type(c.type_id),
        })
        .collect();

    let python_names = dedupe_names(
        param_types
            .keys()
            .map(|name| python_parameter_name(name))
            .collect(),
    );
    let params: Vec<Parameter> = param_types
        .iter()
        .zip(python_names)
        .map(|((sql_name, host), python_name)| Parameter {
            sql_name: sql_name.clone(),
            python_name,
            host: *host,
        })
        .collect();

    let record_name = record_type_name(&query.name);
    let returns = ReturnShape::select(&fields, query.shape, &record_name);
    let record = returns.needs_record().then(|| RecordDecl {
        name: record_name,
        fields: fields.clone(),
    });

    let callable = CallableDecl {
        name: query.name.clone(),
        sql: query.sql.clone(),
        params,
        columns: fields,
        returns,
    };
    let mut unit = GeneratedUnit {
        record,
        callable,
        imports: BTreeSet::new(),
    };
    unit.imports = required_imports(unit.host_types());
    unit
}

impl fmt::Display for RecordDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "@dataclass")?;
        writeln!(f, "class {}:", self.name)?;
        for field in &self.fields {
            writeln!(f, "    {}: {}", field.name, field.host)?;
        }
        Ok(())
    }
}

impl CallableDecl {
    fn write_construction(
        &self,
        f: &mut fmt::Formatter<'_>,
        record: &str,
        indent: &str,
    ) -> fmt::Result {
        writeln!(f, "{record}(")?;
        for (idx, field) in self.columns.iter().enumerate() {
            writeln!(f, "{indent}    {}={},", field.name, row_value(idx, field.host))?;
        }
        write!(f, "{indent})")
    }

    fn write_missing_row_check(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "    row = result.first()")?;
        writeln!(f, "    if row is None:")?;
        writeln!(
            f,
            "        raise LookupError({})",
            string_literal(&format!("{} returned no rows", self.name))
        )
    }
}

impl fmt::Display for CallableDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let signature: String = self
            .params
            .iter()
            .map(|p| format!(", {}: {}", p.python_name, p.host))
            .collect();
        let binds = self
            .params
            .iter()
            .map(|p| format!("{}: {}", string_literal(&p.sql_name), p.python_name))
            .collect::<Vec<_>>()
            .join(", ");

        writeln!(
            f,
            "def {}(session{signature}) -> {}:",
            self.name,
            self.returns.annotation()
        )?;
        writeln!(f, "    \"\"\"{}\"\"\"", self.returns.docstring())?;
        if self.returns == ReturnShape::Unit {
            writeln!(f, "    session.execute(")?;
        } else {
            writeln!(f, "    result = session.execute(")?;
        }
        writeln!(
            f,
            "        text({}),",
            string_literal(&parenthesize_cast_binds(&self.sql))
        )?;
        writeln!(f, "        {{{binds}}},")?;
        writeln!(f, "    )")?;

        match &self.returns {
            ReturnShape::Unit => Ok(()),
            ReturnShape::Scalar(host) => {
                self.write_missing_row_check(f)?;
                writeln!(f, "    return {}", row_value(0, *host))
            }
            ReturnShape::One(record) => {
                self.write_missing_row_check(f)?;
                write!(f, "    return ")?;
                self.write_construction(f, record, "    ")?;
                writeln!(f)
            }
            ReturnShape::Many(record) => {
                writeln!(f, "    return [")?;
                write!(f, "        ")?;
                self.write_construction(f, record, "        ")?;
                writeln!(f)?;
                writeln!(f, "        for row in result")?;
                writeln!(f, "    ]")
            }
        }
    }
}

/// All units generated from one input file, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedFile {
    /// Units in file order.
    pub units: Vec<GeneratedUnit>,
    /// Union of the units' imports, sorted.
    pub imports: BTreeSet<ImportSpec>,
}

impl GeneratedFile {
    /// Append a unit and merge its imports.
    pub fn push(&mut self, unit: GeneratedUnit) {
        self.imports.extend(unit.imports.iter().copied());
        self.units.push(unit);
    }
}

impl fmt::Display for GeneratedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for import in &self.imports {
            writeln!(f, "{import}")?;
        }
        for unit in &self.units {
            if let Some(record) = &unit.record {
                write!(f, "\n\n{record}")?;
            }
            write!(f, "\n\n{}", unit.callable)?;
        }
        Ok(())
    }
}
