use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::{DbError, GenerateError};
use crate::generator::emitter::{emit_unit, GeneratedFile};
use crate::introspect::catalog::{TypeCatalog, TypeMapping};
use crate::introspect::columns::resolve_columns;
use crate::introspect::param_types::{resolve_parameter_types, ResolvedParameterTypes};
use crate::introspect::session::{Column, Connector, Session};
use crate::parser::names::{is_reserved_callable_name, record_type_name};
use crate::parser::params::extract_parameters;
use crate::parser::query_file::{name_queries, parse_queries, Query};

/// Column and parameter types of one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedQuery {
    /// Result columns in positional order (empty for shapeless statements).
    pub columns: Vec<Column>,
    /// Host type of every bind parameter.
    pub param_types: ResolvedParameterTypes,
}

/// A session together with the type catalog loaded on it.
pub struct LiveSession<S> {
    /// The open session.
    pub session: S,
    /// Catalog loaded on `session`.
    pub catalog: TypeCatalog,
}

impl<S: Session> LiveSession<S> {
    /// Open a session and load its type catalog.
    pub fn open<C>(connector: &C, mapping: &TypeMapping) -> Result<Self, DbError>
    where
        C: Connector<Session = S>,
    {
        let mut session = connector.connect()?;
        let catalog = TypeCatalog::load(&mut session, mapping)?;
        Ok(Self { session, catalog })
    }

    /// Resolve the columns and parameter types of one query on this session.
    pub fn resolve(&mut self, query: &Query, params: &[String]) -> Result<ResolvedQuery, DbError> {
        let columns = resolve_columns(&mut self.session, &query.sql, params)?;
        let param_types =
            resolve_parameter_types(&mut self.session, &self.catalog, &query.sql, params)?;
        Ok(ResolvedQuery {
            columns,
            param_types,
        })
    }
}

/// Reject queries whose function name is reserved in the generated module, or
/// whose function name or record type name repeats an earlier one.
pub fn check_name_conflicts(queries: &[Query]) -> Result<(), GenerateError> {
    let mut seen: HashMap<String, &str> = HashMap::new();
    for query in queries {
        if is_reserved_callable_name(&query.name) {
            return Err(GenerateError::ReservedQueryName {
                name: query.name.clone(),
            });
        }
        for generated in [query.name.clone(), record_type_name(&query.name)] {
            if let Some(previous) = seen.insert(generated.clone(), &query.name) {
                return Err(GenerateError::DuplicateQueryName {
                    name: generated,
                    previous: previous.to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Parse annotated SQL text and assign final query names.
pub fn load_queries(text: &str, path: &Path) -> Result<Vec<Query>, GenerateError> {
    let parsed = parse_queries(text).map_err(|source| GenerateError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    let base_name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("query");
    let queries = name_queries(parsed, base_name);
    check_name_conflicts(&queries)?;
    Ok(queries)
}

/// Generate bindings for already parsed queries.
///
/// Queries are resolved one at a time on a single session. When resolving a
/// query fails, a fresh session is opened (reloading the type catalog) and the
/// query is retried once; a second failure aborts the whole file.
pub fn generate_for_queries<C: Connector>(
    queries: &[Query],
    connector: &C,
    mapping: &TypeMapping,
) -> Result<GeneratedFile, GenerateError> {
    let mut live = LiveSession::open(connector, mapping).map_err(GenerateError::Connect)?;
    let mut file = GeneratedFile::default();

    for query in queries {
        let params = extract_parameters(&query.sql);
        debug!(query = %query.name, shape = %query.shape, ?params, "resolving query");

        let resolved = match live.resolve(query, &params) {
            Ok(resolved) => resolved,
            Err(error) => {
                warn!(query = %query.name, %error, "resolution failed, retrying on a fresh connection");
                let resolution_error = |source| GenerateError::Resolution {
                    query: query.name.clone(),
                    source,
                };
                live = LiveSession::open(connector, mapping).map_err(resolution_error)?;
                live.resolve(query, &params).map_err(resolution_error)?
            }
        };

        file.push(emit_unit(
            query,
            &resolved.columns,
            &resolved.param_types,
            &live.catalog,
        ));
    }

    info!(queries = queries.len(), "generated bindings");
    Ok(file)
}

/// Read an annotated SQL file and generate its bindings.
pub fn generate_bindings<C: Connector>(
    path: &Path,
    connector: &C,
    mapping: &TypeMapping,
) -> Result<GeneratedFile, GenerateError> {
    let text = std::fs::read_to_string(path).map_err(|source| GenerateError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let queries = load_queries(&text, path)?;
    info!(path = %path.display(), queries = queries.len(), "parsed query file");
    generate_for_queries(&queries, connector, mapping)
}
