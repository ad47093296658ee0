use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// `:name` bind tokens. The character before the colon must not be a word
/// character or another colon, which keeps `::type` casts and `arr[lo:hi]`
/// slices out of the parameter set.
static PARAM_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<lead>^|[^:\w]):(?P<name>[A-Za-z_][A-Za-z0-9_]*)")
        .expect("parameter token pattern is valid")
});

/// A bind token directly followed by a `::` cast.
static CAST_PARAM_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<lead>^|[^:\w]):(?P<name>[A-Za-z_][A-Za-z0-9_]*)::")
        .expect("cast parameter pattern is valid")
});

/// Extract the distinct bind-parameter names of a query, sorted lexicographically.
///
/// The order is independent of where parameters first appear in the SQL:
/// generated callables declare their arguments in this order, so it is part
/// of the generated API and must stay stable.
pub fn extract_parameters(sql: &str) -> Vec<String> {
    PARAM_TOKEN
        .captures_iter(sql)
        .map(|caps| caps["name"].to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Rewrite `:name` tokens into `PostgreSQL` positional placeholders.
///
/// Each name becomes `$k`, where `k` is its 1-based index in `params`
/// (so repeated uses share one placeholder). Names absent from `params` are
/// left untouched.
pub fn to_positional(sql: &str, params: &[String]) -> String {
    PARAM_TOKEN
        .replace_all(sql, |caps: &Captures<'_>| {
            let name = &caps["name"];
            match params.iter().position(|p| p == name) {
                Some(index) => format!("{}${}", &caps["lead"], index + 1),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Rewrite `:name::type` into `(:name)::type`.
///
/// SQLAlchemy's `text()` does not treat a name followed by a colon as a bind,
/// so a cast parameter would reach the server as literal text.
pub fn parenthesize_cast_binds(sql: &str) -> String {
    CAST_PARAM_TOKEN
        .replace_all(sql, "${lead}(:${name})::")
        .into_owned()
}
