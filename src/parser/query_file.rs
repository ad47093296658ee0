use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ParseError;
use crate::parser::names::{is_identifier, python_identifier};

static BLOCK_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*(.*?)\*/").expect("block comment pattern is valid"));

static NAME_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bname\s*=\s*(\S+)").expect("name directive pattern is valid")
});

static QUERY_TYPE_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bquery_type\s*=\s*([A-Za-z_]+)").expect("query_type directive pattern is valid")
});

/// Execution shape requested for a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QueryShape {
    /// At most one row is expected; the generated callable returns it directly.
    Single,
    /// Any number of rows; the generated callable returns a list.
    #[default]
    Multi,
}

impl QueryShape {
    /// Parse a `query_type` directive value (case-insensitive).
    pub fn from_directive(value: &str) -> Result<Self, ParseError> {
        if value.eq_ignore_ascii_case("single") {
            Ok(Self::Single)
        } else if value.eq_ignore_ascii_case("multi") {
            Ok(Self::Multi)
        } else {
            Err(ParseError::UnknownQueryType {
                value: value.to_string(),
            })
        }
    }
}

impl fmt::Display for QueryShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryShape::Single => write!(f, "single"),
            QueryShape::Multi => write!(f, "multi"),
        }
    }
}

/// A query as written in the file, before default names are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuery {
    /// Name from the marker's `name =` directive, if any.
    pub name: Option<String>,
    /// SQL body, trimmed, with one trailing `;` removed.
    pub sql: String,
    /// Requested execution shape.
    pub shape: QueryShape,
}

/// A query with its final name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Name of the generated callable.
    pub name: String,
    /// SQL body, trimmed, with one trailing `;` removed.
    pub sql: String,
    /// Requested execution shape.
    pub shape: QueryShape,
}

struct Marker {
    start: usize,
    end: usize,
    name: Option<String>,
    shape: QueryShape,
}

fn find_markers(text: &str) -> Result<Vec<Marker>, ParseError> {
    let mut markers = Vec::new();
    for caps in BLOCK_COMMENT.captures_iter(text) {
        let (Some(whole), Some(body)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let body = body.as_str();
        let name = match NAME_DIRECTIVE.captures(body) {
            Some(caps) if is_identifier(&caps[1]) => Some(caps[1].to_string()),
            Some(caps) => {
                return Err(ParseError::InvalidQueryName {
                    value: caps[1].to_string(),
                })
            }
            None => None,
        };
        let query_type = QUERY_TYPE_DIRECTIVE.captures(body).map(|c| c[1].to_string());

        // Ordinary block comments are part of the SQL body.
        if name.is_none() && query_type.is_none() {
            continue;
        }

        let shape = match query_type {
            Some(value) => QueryShape::from_directive(&value)?,
            None => QueryShape::default(),
        };
        markers.push(Marker {
            start: whole.start(),
            end: whole.end(),
            name,
            shape,
        });
    }
    Ok(markers)
}

/// Trim a SQL body and drop a single trailing statement terminator.
pub fn clean_sql(body: &str) -> String {
    let trimmed = body.trim();
    trimmed
        .strip_suffix(';')
        .unwrap_or(trimmed)
        .trim_end()
        .to_string()
}

/// Split an annotated file into queries, in file order.
///
/// A marker is a `/* ... */` block carrying a `name =` and/or `query_type =`
/// directive; its body runs to the next marker or the end of the file. Markers
/// with an empty body are dropped. Text before the first marker is ignored.
/// Without any marker, the whole file is one unnamed `Multi` query.
pub fn parse_queries(text: &str) -> Result<Vec<ParsedQuery>, ParseError> {
    let markers = find_markers(text)?;

    if markers.is_empty() {
        let sql = clean_sql(text);
        if sql.is_empty() {
            return Err(ParseError::NoQueries);
        }
        return Ok(vec![ParsedQuery {
            name: None,
            sql,
            shape: QueryShape::Multi,
        }]);
    }

    let mut queries = Vec::with_capacity(markers.len());
    for (idx, marker) in markers.iter().enumerate() {
        let body_end = markers.get(idx + 1).map_or(text.len(), |next| next.start);
        let sql = clean_sql(&text[marker.end..body_end]);
        if sql.is_empty() {
            continue;
        }
        queries.push(ParsedQuery {
            name: marker.name.clone(),
            sql,
            shape: marker.shape,
        });
    }

    if queries.is_empty() {
        return Err(ParseError::NoQueries);
    }
    Ok(queries)
}

/// Apply default names derived from the input file's base name.
///
/// An unnamed query gets `base_name` when it is the only query in the file,
/// and `base_name_<n>` (1-based position) otherwise.
pub fn name_queries(parsed: Vec<ParsedQuery>, base_name: &str) -> Vec<Query> {
    let base = python_identifier(base_name, "query");
    let single = parsed.len() == 1;

    parsed
        .into_iter()
        .enumerate()
        .map(|(idx, query)| {
            let name = match query.name {
                Some(name) => name,
                None if single => base.clone(),
                None => format!("{base}_{}", idx + 1),
            };
            Query {
                name,
                sql: query.sql,
                shape: query.shape,
            }
        })
        .collect()
}
