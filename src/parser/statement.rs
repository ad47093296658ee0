use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::keywords::Keyword;
use sqlparser::tokenizer::{Token, Tokenizer};

/// Coarse statement class derived from the statement's main verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// `SELECT`, `VALUES`, `TABLE`, or a `WITH` list followed by one of them:
    /// the statement produces a row set.
    Retrieval,
    /// Anything else (DML, DDL, utility commands, data-modifying `WITH`):
    /// treated as shapeless.
    Shapeless,
}

/// How a statement limits the rows it returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowBound {
    /// No top-level `LIMIT` or `FETCH`.
    Unbounded,
    /// A top-level `LIMIT`/`FETCH` with a literal count.
    Literal,
    /// A top-level `LIMIT`/`FETCH` whose count is a placeholder, `ALL` or an
    /// expression. Bound to `NULL` it places no limit at all.
    Open,
}

/// Verbs that can follow a `WITH` list at the top level.
const MAIN_VERBS: [&str; 7] = ["SELECT", "VALUES", "TABLE", "INSERT", "UPDATE", "DELETE", "MERGE"];

fn tokenize(sql: &str) -> Option<Vec<Token>> {
    Tokenizer::new(&PostgreSqlDialect {}, sql).tokenize().ok()
}

fn is_trivia(token: &Token) -> bool {
    matches!(token, Token::Whitespace(_))
}

/// Unquoted words of `sql`, upper-cased and paired with their parenthesis depth.
///
/// When the tokenizer rejects the text, words are cut at non-identifier
/// characters instead; string literals and comments are not recognized then.
fn depth_words(sql: &str) -> Vec<(usize, String)> {
    let mut depth = 0usize;
    let mut words = Vec::new();

    let Some(tokens) = tokenize(sql) else {
        let mut current = String::new();
        for ch in sql.chars() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                current.push(ch.to_ascii_uppercase());
                continue;
            }
            if !current.is_empty() {
                words.push((depth, std::mem::take(&mut current)));
            }
            match ch {
                '(' => depth += 1,
                ')' => depth = depth.saturating_sub(1),
                _ => {}
            }
        }
        if !current.is_empty() {
            words.push((depth, current));
        }
        return words;
    };

    for token in tokens {
        match token {
            Token::LParen => depth += 1,
            Token::RParen => depth = depth.saturating_sub(1),
            Token::Word(word) if word.quote_style.is_none() => {
                words.push((depth, word.value.to_ascii_uppercase()));
            }
            _ => {}
        }
    }
    words
}

/// Classify a statement by its main verb.
///
/// Leading whitespace, comments and opening parentheses are skipped. For a
/// `WITH` statement the verb is the first one at the `WITH`'s own nesting
/// level, after the common table expressions, so `WITH ... DELETE` is
/// shapeless while `WITH ... SELECT` is a retrieval.
pub fn classify_statement(sql: &str) -> StatementKind {
    let words = depth_words(sql);
    let Some((lead_depth, lead)) = words.first() else {
        return StatementKind::Shapeless;
    };

    let verb = if lead == "WITH" {
        // A main statement wrapped in parentheses can only be a SELECT.
        words
            .iter()
            .skip(1)
            .find(|(depth, word)| depth == lead_depth && MAIN_VERBS.contains(&word.as_str()))
            .map_or("SELECT", |(_, word)| word.as_str())
    } else {
        lead.as_str()
    };

    match verb {
        "SELECT" | "VALUES" | "TABLE" => StatementKind::Retrieval,
        _ => StatementKind::Shapeless,
    }
}

/// Inspect the top-level `LIMIT` or `FETCH` clause of a statement.
pub fn row_bound(sql: &str) -> RowBound {
    let Some(tokens) = tokenize(sql) else {
        let upper = sql.to_ascii_uppercase();
        return if upper.contains(" LIMIT ") || upper.contains(" FETCH ") {
            RowBound::Open
        } else {
            RowBound::Unbounded
        };
    };

    let mut depth = 0usize;
    let mut significant = tokens.iter().filter(|token| !is_trivia(token));
    while let Some(token) = significant.next() {
        match token {
            Token::LParen => depth += 1,
            Token::RParen => depth = depth.saturating_sub(1),
            Token::Word(word) if depth == 0 && word.keyword == Keyword::LIMIT => {
                return match significant.next() {
                    Some(Token::Number(..)) => RowBound::Literal,
                    _ => RowBound::Open,
                };
            }
            Token::Word(word) if depth == 0 && word.keyword == Keyword::FETCH => {
                let count = significant.find(|token| {
                    !matches!(token, Token::Word(w) if matches!(w.keyword, Keyword::FIRST | Keyword::NEXT))
                });
                return match count {
                    Some(Token::Number(..)) => RowBound::Literal,
                    // `FETCH FIRST ROW ONLY` fetches exactly one row.
                    Some(Token::Word(w)) if matches!(w.keyword, Keyword::ROW | Keyword::ROWS) => {
                        RowBound::Literal
                    }
                    _ => RowBound::Open,
                };
            }
            _ => {}
        }
    }
    RowBound::Unbounded
}

/// Highest `$k` placeholder index in `sql`, or 0 when there is none.
pub fn placeholder_count(sql: &str) -> usize {
    tokenize(sql)
        .unwrap_or_default()
        .iter()
        .filter_map(|token| match token {
            Token::Placeholder(p) => p.strip_prefix('$')?.parse::<usize>().ok(),
            _ => None,
        })
        .max()
        .unwrap_or(0)
}
