//! The ingest pipeline and the query engine.
//!
//! ```text
//!  fetcher ──bytes──▶ decoder ──rows──▶ ingest (metric + store writes)
//!                                                   │
//!                                    query ◀────────┘ (via the store)
//! ```

pub mod decoder;
pub mod fetcher;
pub mod ingest;
pub mod metric;
pub mod query;
