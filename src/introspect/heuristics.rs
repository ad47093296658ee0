//! Best-effort SQL text inspection for the tier-2 parameter resolver.
//!
//! These helpers read the raw query text with regular expressions instead of a
//! parser. They only recognise a parameter compared directly against a (possibly
//! qualified) column identifier, so parameters inside function calls, compared
//! against CTE-projected columns, or passed to `ANY(...)` are not resolved here.

use std::sync::LazyLock;

use regex::Regex;

use crate::introspect::catalog::HostType;
use crate::parser::names::terminal_identifier;

const COLUMN: &str = r"(?P<col>(?:[A-Za-z_][A-Za-z0-9_]*\.)*[A-Za-z_][A-Za-z0-9_]*)";
const OPERATOR: &str = r"(?P<op><>|!=|<=|>=|=|<|>)";

static TABLE_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)\b(?:FROM|JOIN|UPDATE|INTO)\s+((?:"[^"]+"|[A-Za-z_][A-Za-z0-9_$]*)(?:\.(?:"[^"]+"|[A-Za-z_][A-Za-z0-9_$]*))?)"#,
    )
    .expect("table reference pattern is valid")
});

/// How a parameter is bound to a column in the query text, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ComparisonContext {
    /// `column <op> :param`
    ColumnThenParam,
    /// `:param <op> column`
    ParamThenColumn,
    /// `column IN (..., :param, ...)`
    InList,
    /// `column LIKE :param` / `column ILIKE :param`
    Like,
}

/// A column the parameter is compared against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMatch {
    /// Terminal column identifier, lowercased (`u.Email` → `email`).
    pub column: String,
    /// Pattern class that produced the match.
    pub context: ComparisonContext,
    /// Comparison operator for the two operator classes, `None` otherwise.
    pub operator: Option<String>,
}

impl ColumnMatch {
    fn is_equality(&self) -> bool {
        self.context == ComparisonContext::InList || self.operator.as_deref() == Some("=")
    }

    fn is_operator_comparison(&self) -> bool {
        self.operator.is_some()
    }
}

fn param_regex(template: &str, param: &str) -> Option<Regex> {
    let pattern = template
        .replace("{col}", COLUMN)
        .replace("{op}", OPERATOR)
        .replace("{param}", &regex::escape(param));
    Regex::new(&pattern).ok()
}

fn followed_by_call(sql: &str, end: usize) -> bool {
    sql[end..].trim_start().starts_with('(')
}

/// Every column `param` is compared against, ordered by pattern class and
/// then by position in the text.
pub fn column_matches(sql: &str, param: &str) -> Vec<ColumnMatch> {
    let mut matches = Vec::new();

    if let Some(re) = param_regex(r"(?:^|[^:\w.]){col}\s*{op}\s*:{param}\b", param) {
        for caps in re.captures_iter(sql) {
            matches.push(ColumnMatch {
                column: terminal_identifier(&caps["col"]),
                context: ComparisonContext::ColumnThenParam,
                operator: Some(caps["op"].to_string()),
            });
        }
    }

    if let Some(re) = param_regex(r"(?:^|[^:\w]):{param}\b\s*{op}\s*{col}", param) {
        for caps in re.captures_iter(sql) {
            let Some(col) = caps.name("col") else {
                continue;
            };
            // `:since > now()` compares against a function, not a column.
            if followed_by_call(sql, col.end()) {
                continue;
            }
            matches.push(ColumnMatch {
                column: terminal_identifier(col.as_str()),
                context: ComparisonContext::ParamThenColumn,
                operator: Some(caps["op"].to_string()),
            });
        }
    }

    if let Some(re) = param_regex(
        r"(?is)(?:^|[^:\w.]){col}\s+(?:NOT\s+)?IN\s*\((?P<list>[^()]*?:{param}\b[^()]*)\)",
        param,
    ) {
        for caps in re.captures_iter(sql) {
            if caps["list"].to_ascii_uppercase().contains("SELECT") {
                continue;
            }
            matches.push(ColumnMatch {
                column: terminal_identifier(&caps["col"]),
                context: ComparisonContext::InList,
                operator: None,
            });
        }
    }

    if let Some(re) = param_regex(
        r"(?i)(?:^|[^:\w.]){col}\s+(?:NOT\s+)?I?LIKE\s+:{param}\b",
        param,
    ) {
        for caps in re.captures_iter(sql) {
            matches.push(ColumnMatch {
                column: terminal_identifier(&caps["col"]),
                context: ComparisonContext::Like,
                operator: None,
            });
        }
    }

    matches
}

fn is_temporal_name(column: &str) -> bool {
    ["created_at", "updated_at", "timestamp", "date"]
        .iter()
        .any(|needle| column.contains(needle))
}

fn is_uuid_like_name(column: &str) -> bool {
    column == "id" || column.ends_with("_id") || column.contains("uuid")
}

fn is_like_operand(sql: &str, param: &str) -> bool {
    param_regex(r"(?i)\bI?LIKE\s+:{param}\b", param).is_some_and(|re| re.is_match(sql))
        || param_regex(r"(?i)(?:^|[^:\w]):{param}\s+(?:NOT\s+)?I?LIKE\b", param)
            .is_some_and(|re| re.is_match(sql))
}

/// Guess a parameter's type from the names of the columns it is compared
/// against, when no schema lookup succeeded.
///
/// Rules, first hit wins:
/// 1. operator comparison against a `created_at`/`updated_at`/`timestamp`/`date` column → datetime
/// 2. equality against an `id`/`*_id`/`*uuid*` column → UUID
/// 3. any comparison against an `*email*` column → string
/// 4. operand of `LIKE`/`ILIKE` anywhere → string
pub fn naming_heuristic(sql: &str, param: &str) -> Option<HostType> {
    let matches = column_matches(sql, param);

    if matches
        .iter()
        .any(|m| m.is_operator_comparison() && is_temporal_name(&m.column))
    {
        return Some(HostType::Datetime);
    }
    if matches
        .iter()
        .any(|m| m.is_equality() && is_uuid_like_name(&m.column))
    {
        return Some(HostType::Uuid);
    }
    if matches.iter().any(|m| m.column.contains("email")) {
        return Some(HostType::Str);
    }
    if is_like_operand(sql, param) {
        return Some(HostType::Str);
    }
    None
}

/// Tables named after `FROM`, `JOIN`, `UPDATE` or `INTO`, terminal and lowercased.
pub fn referenced_tables(sql: &str) -> Vec<String> {
    let mut tables: Vec<String> = Vec::new();
    for caps in TABLE_REFERENCE.captures_iter(sql) {
        let table = terminal_identifier(&caps[1]);
        if !tables.contains(&table) {
            tables.push(table);
        }
    }
    tables
}
