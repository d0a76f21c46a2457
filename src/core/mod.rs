pub mod clusterer;
pub mod config;
pub mod orchestrator;
pub mod pipeline;

pub use clusterer::{ClusterAssignments, ClusterSummary, IdentityClusterer};
pub use config::Config;
pub use orchestrator::{BatchOrchestrator, BatchSummary};
pub use pipeline::{Pipeline, PipelineReport};
