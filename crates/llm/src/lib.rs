pub mod enricher;
pub mod fallback;
pub mod narrative;
pub mod provider;
pub mod providers;

pub use enricher::Enricher;
pub use fallback::fallback_narrative;
pub use narrative::NarrativeGenerator;
pub use provider::{LlmError, LlmProvider, Message, Role};
pub use providers::create_provider;
