//! pgcypher - Cypher to PostgreSQL expression translation for
//! property graphs
//!
//! This crate is the expression-translation core of a graph query
//! layer over a relational property-graph schema:
//! - A typed SQL expression model with a data-type lattice
//! - Bottom-up translation of parsed Cypher expressions
//! - Property-bag lookups rewritten to JSON operators
//! - Boolean leaves distributed as identifier-scoped constraints for
//!   join planning

pub mod cypher;
pub mod pgsql;
pub mod translate;
