//! Cluster query plumbing: the `ClusterQuery` seam, the `solana` CLI client,
//! output parsing, and the query error taxonomy.

pub mod client;
pub mod error;
pub mod helpers;

pub use client::{ClusterQuery, QueryFuture, SolanaCli};
pub use error::QueryError;
pub use helpers::parse_integer_output;
