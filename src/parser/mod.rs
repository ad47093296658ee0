/// Identifier normalization and Python-safe naming helpers.
pub mod names;
/// Bind-parameter extraction and rewriting to native placeholders.
pub mod params;
/// Annotated query file grammar (marker blocks, names, execution shapes).
pub mod query_file;
/// Leading-keyword statement classification built on the `sqlparser` tokenizer.
pub mod statement;
