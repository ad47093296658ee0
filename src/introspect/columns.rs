use tracing::{debug, warn};

use crate::error::DbError;
use crate::introspect::session::{Column, Session};
use crate::parser::params::to_positional;
use crate::parser::statement::{classify_statement, row_bound, RowBound, StatementKind};

/// Build the probe statement for a retrieval query: native placeholders plus a
/// zero-row `LIMIT`.
///
/// The clause goes on its own line so a trailing `--` comment cannot swallow
/// it. A literal `LIMIT`/`FETCH` is kept as written. A placeholder count is
/// bound to `NULL` during the probe, which means no limit, so such queries are
/// wrapped in a zero-row outer select instead.
pub fn probe_sql(sql: &str, params: &[String]) -> String {
    let positional = to_positional(sql, params);
    match row_bound(&positional) {
        RowBound::Literal => positional,
        RowBound::Unbounded => format!("{positional}\nLIMIT 0"),
        RowBound::Open => format!("SELECT * FROM (\n{positional}\n) AS described\nLIMIT 0"),
    }
}

/// Resolve the result columns of `sql`, in positional order.
///
/// Non-retrieval statements are shapeless: no probe runs and the result is
/// empty. A failed probe is retried once after a rollback on the same session;
/// the second failure is returned.
pub fn resolve_columns<S: Session + ?Sized>(
    session: &mut S,
    sql: &str,
    params: &[String],
) -> Result<Vec<Column>, DbError> {
    if classify_statement(sql) == StatementKind::Shapeless {
        debug!("statement is shapeless, skipping column probe");
        return Ok(Vec::new());
    }

    let probe = probe_sql(sql, params);
    match session.describe_probe(&probe) {
        Ok(columns) => Ok(columns),
        Err(error) => {
            warn!(%error, "column probe failed, rolling back and retrying");
            session.rollback()?;
            session.describe_probe(&probe)
        }
    }
}
