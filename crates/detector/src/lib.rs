//! VPC flow-log anomaly detection: detector SQL, the per-invocation
//! pipeline, and the wiring shared by the Lambda and CLI binaries.

pub mod bootstrap;
pub mod check;
pub mod detectors;
pub mod handler;
pub mod pipeline;

pub use bootstrap::build_pipeline;
pub use check::{check_components, ComponentCheck};
pub use detectors::{build_queries, detection_queries};
pub use handler::{handle_invocation, InvocationResponse, ResponseBody};
pub use pipeline::{Pipeline, PipelineError, RunReport};
