//! Pipeline orchestration

pub mod orchestrator;
pub mod result;

pub use orchestrator::{CancellationToken, IndexingPipeline, PipelineConfig, PipelineOutput};
pub use result::{IndexingResult, Stage, StageError};
