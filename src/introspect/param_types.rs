use std::collections::BTreeMap;

use tracing::debug;

use crate::error::DbError;
use crate::introspect::catalog::{HostType, TypeCatalog};
use crate::introspect::heuristics::{column_matches, naming_heuristic, referenced_tables};
use crate::introspect::session::{Session, TypeId};
use crate::parser::names::normalize_identifier;
use crate::parser::params::to_positional;

/// Name of the prepared plan used to inspect parameter types.
pub const PLAN_NAME: &str = "pgtyped_param_probe";

/// Host type of every bind parameter of one query, keyed by parameter name.
pub type ResolvedParameterTypes = BTreeMap<String, HostType>;

/// Result of the prepared-plan tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreparedPlanOutcome {
    /// At least one parameter resolved to a concrete type.
    Resolved(ResolvedParameterTypes),
    /// The plan could not be inspected, or every parameter came back `Dynamic`.
    Inconclusive,
}

fn inspect_plan<S: Session + ?Sized>(
    session: &mut S,
    positional_sql: &str,
) -> Result<Option<Vec<TypeId>>, DbError> {
    session.prepare_plan(PLAN_NAME, positional_sql)?;
    session.plan_parameter_types(PLAN_NAME)
}

/// Tier 1: register the query as a named plan and read the parameter types
/// the database inferred for it.
///
/// The plan is deallocated whatever happened before; a failed deallocation is
/// ignored. Types are zipped against `params` in extraction order.
pub fn prepared_plan_types<S: Session + ?Sized>(
    session: &mut S,
    catalog: &TypeCatalog,
    sql: &str,
    params: &[String],
) -> PreparedPlanOutcome {
    let positional = to_positional(sql, params);
    let inspected = inspect_plan(session, &positional);
    if let Err(error) = session.deallocate_plan(PLAN_NAME) {
        debug!(%error, "ignoring failed plan deallocation");
    }

    let type_ids = match inspected {
        Ok(Some(type_ids)) => type_ids,
        Ok(None) => {
            debug!("prepared plan not found in the session registry");
            return PreparedPlanOutcome::Inconclusive;
        }
        Err(error) => {
            debug!(%error, "prepared plan inspection failed");
            return PreparedPlanOutcome::Inconclusive;
        }
    };

    let resolved: ResolvedParameterTypes = params
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let host = type_ids
                .get(idx)
                .map_or(HostType::Dynamic, |&type_id| catalog.host_type(type_id));
            (name.clone(), host)
        })
        .collect();

    if resolved.values().all(|host| *host == HostType::Dynamic) {
        PreparedPlanOutcome::Inconclusive
    } else {
        PreparedPlanOutcome::Resolved(resolved)
    }
}

fn lookup_column_type<S: Session + ?Sized>(
    session: &mut S,
    catalog: &TypeCatalog,
    column: &str,
    tables: &[String],
) -> Result<HostType, DbError> {
    let candidates = session.schema_columns(column)?;
    let chosen = candidates
        .iter()
        .find(|c| tables.contains(&normalize_identifier(&c.table)))
        .or_else(|| candidates.first());
    Ok(chosen.map_or(HostType::Dynamic, |c| catalog.resolve(&c.type_name)))
}

/// Tier 2: infer one parameter's type from the columns it is compared against.
///
/// Each matched column is looked up in the live schema (tables referenced by
/// the query win over other tables with the same column); the first lookup
/// yielding a concrete type wins. Otherwise the naming heuristics apply, and
/// finally `Dynamic`.
pub fn heuristic_type<S: Session + ?Sized>(
    session: &mut S,
    catalog: &TypeCatalog,
    sql: &str,
    param: &str,
) -> Result<HostType, DbError> {
    let tables = referenced_tables(sql);
    for candidate in column_matches(sql, param) {
        let host = lookup_column_type(session, catalog, &candidate.column, &tables)?;
        if host != HostType::Dynamic {
            debug!(param, column = %candidate.column, %host, "resolved parameter from schema column");
            return Ok(host);
        }
    }

    let host = naming_heuristic(sql, param).unwrap_or(HostType::Dynamic);
    debug!(param, %host, "resolved parameter from naming heuristics");
    Ok(host)
}

/// Resolve the host type of every parameter in `params`.
///
/// Parameterless queries skip resolution entirely. Tier 1 answers are kept as
/// they are; tier 2 only runs for parameters tier 1 left `Dynamic` (all of
/// them when tier 1 is inconclusive). Errors come from schema lookups only.
pub fn resolve_parameter_types<S: Session + ?Sized>(
    session: &mut S,
    catalog: &TypeCatalog,
    sql: &str,
    params: &[String],
) -> Result<ResolvedParameterTypes, DbError> {
    if params.is_empty() {
        return Ok(ResolvedParameterTypes::new());
    }

    let mut resolved = match prepared_plan_types(session, catalog, sql, params) {
        PreparedPlanOutcome::Resolved(types) => types,
        PreparedPlanOutcome::Inconclusive => {
            debug!("prepared plan inconclusive, falling back to heuristics");
            params
                .iter()
                .map(|name| (name.clone(), HostType::Dynamic))
                .collect()
        }
    };

    for (name, host) in resolved.iter_mut() {
        if *host == HostType::Dynamic {
            *host = heuristic_type(session, catalog, sql, name)?;
        }
    }
    Ok(resolved)
}
