/// Shape selection and Python rendering of record types and callables.
pub mod emitter;
/// Per-file generation driver: parse, resolve with one retry, emit.
pub mod pipeline;
/// Python literal and expression helpers.
pub mod python;
