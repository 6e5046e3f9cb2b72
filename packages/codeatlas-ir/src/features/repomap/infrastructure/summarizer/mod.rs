//! Hierarchical LLM summarization

pub mod cache;
pub mod cost_control;
pub mod hierarchical;
pub mod llm_summarizer;

pub use cache::{InMemorySummaryCache, SummaryCache};
pub use cost_control::{CostController, SummaryCostConfig};
pub use hierarchical::{HierarchicalSummarizer, DEFAULT_MAX_CONCURRENT};
pub use llm_summarizer::LlmSummarizer;
