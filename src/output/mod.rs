/// Best-effort external formatter pass over the generated file.
pub mod formatter;
/// Output path derivation and file writing.
pub mod writer;
