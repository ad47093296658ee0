/// Return the identifier without surrounding double quotes.
pub fn unquote_identifier(ident: &str) -> &str {
    ident
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(ident)
}

/// Normalize an identifier for case-insensitive matching.
///
/// Trims whitespace, removes surrounding double quotes on a single identifier,
/// and lowercases the result.
pub fn normalize_identifier(ident: &str) -> String {
    unquote_identifier(ident.trim()).to_ascii_lowercase()
}

/// Normalize a possibly qualified name (`u.email`, `public.users`) to its
/// terminal identifier, lowercased and unquoted.
///
/// Dots inside quoted identifiers are not separators.
pub fn terminal_identifier(name: &str) -> String {
    let mut in_quotes = false;
    let mut start = 0usize;

    for (idx, ch) in name.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            '.' if !in_quotes => start = idx + 1,
            _ => {}
        }
    }

    normalize_identifier(&name[start..])
}

const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class", "continue",
    "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if", "import",
    "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try", "while",
    "with", "yield",
];

/// Names the generated function body relies on; parameters must not shadow them.
const GENERATED_BODY_NAMES: &[&str] = &["session", "text", "uuid", "datetime"];

/// Module-level names the generated file imports or calls. A query function
/// with one of these names would shadow it for every later callable.
const GENERATED_MODULE_NAMES: &[&str] = &[
    "Any", "List", "LookupError", "bool", "dataclass", "datetime", "dict", "float", "int",
    "isinstance", "str", "text", "uuid",
];

/// Returns `true` for a plain ASCII identifier (`[A-Za-z_][A-Za-z0-9_]*`).
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

/// Returns `true` when `name` cannot be a generated function name: it is a
/// Python keyword or shadows a name the generated module depends on.
pub fn is_reserved_callable_name(name: &str) -> bool {
    PYTHON_KEYWORDS.contains(&name) || GENERATED_MODULE_NAMES.contains(&name)
}

/// Canonicalize an arbitrary name into a Python identifier.
///
/// Rules:
/// - replace characters outside `[A-Za-z0-9_]` with `_`
/// - collapse repeated `_` and trim them at both ends
/// - if empty, return `fallback`
/// - if starting with a digit, prefix with `_`
/// - if a Python keyword, append `_`
pub fn python_identifier(name: &str, fallback: &str) -> String {
    let mut normalized = String::with_capacity(name.len());
    let mut previous_was_underscore = false;

    for ch in name.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            normalized.push(ch);
            previous_was_underscore = false;
        } else if !previous_was_underscore {
            normalized.push('_');
            previous_was_underscore = true;
        }
    }

    let trimmed = normalized.trim_matches('_');
    let mut identifier = if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    };

    if identifier.starts_with(|ch: char| ch.is_ascii_digit()) {
        identifier.insert(0, '_');
    }
    if PYTHON_KEYWORDS.contains(&identifier.as_str()) {
        identifier.push('_');
    }
    identifier
}

/// Python name for a bind parameter: never a keyword and never one of the
/// names the generated body uses.
pub fn python_parameter_name(param: &str) -> String {
    let mut identifier = python_identifier(param, "param");
    if GENERATED_BODY_NAMES.contains(&identifier.as_str()) {
        identifier.push('_');
    }
    identifier
}

/// Convert a `snake_case` query name into a `CamelCase` record type name ending in `Row`.
///
/// Examples:
/// - `"get_users"` -> `"GetUsersRow"`
/// - `"count"` -> `"CountRow"`
pub fn record_type_name(query_name: &str) -> String {
    let mut out = String::with_capacity(query_name.len() + 3);
    for word in query_name.split(|ch: char| !ch.is_ascii_alphanumeric()) {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.push(first.to_ascii_uppercase());
            out.extend(chars);
        }
    }
    if out.starts_with(|ch: char| ch.is_ascii_digit()) {
        out.insert(0, 'Q');
    }
    out.push_str("Row");
    out
}

/// Make every name in `names` unique by appending `_2`, `_3`, ... to later repeats.
pub fn dedupe_names(names: Vec<String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let mut candidate = name.clone();
        let mut suffix = 2usize;
        while seen.contains(&candidate) {
            candidate = format!("{name}_{suffix}");
            suffix += 1;
        }
        seen.push(candidate);
    }
    seen
}
