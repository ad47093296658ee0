/// Type identifier → canonical name table and the canonical name → host type mapping.
pub mod catalog;
/// Result-column probing for retrieval statements.
pub mod columns;
/// Regex-based comparison-context heuristics used by the tier-2 parameter resolver.
pub mod heuristics;
/// Two-tier bind-parameter type resolution (prepared plan, then heuristics).
pub mod param_types;
/// `Session` and `Connector` implementations over the synchronous `postgres` client.
pub mod postgres;
/// The database seam: every round trip the resolvers need.
pub mod session;
