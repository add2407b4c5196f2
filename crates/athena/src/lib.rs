pub mod client;
pub mod engine;
pub mod result;
pub mod runner;

pub use client::AthenaEngine;
pub use engine::{AthenaError, ExecutionId, QueryEngine, QueryState, QueryStatus};
pub use result::{materialize, QueryMetadata, RawResultSet};
pub use runner::QueryRunner;
