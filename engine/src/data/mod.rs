//! Data access for the placement engine.
//!
//! The engine consumes the store through the read-only [`store::PlacementOps`]
//! abstraction, with a PostgreSQL implementation for production and an
//! in-memory implementation for tests.

pub mod store;
