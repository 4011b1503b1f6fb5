//! Generation-phase components: the progress-pipeline mapper and the
//! cancellable status polling loop.

pub mod pipeline;
pub mod poller;

pub use pipeline::{default_pipeline, map_stages, MappedStage, PipelineStep, StepState};
pub use poller::{GenerationEvent, GenerationPoller, PollerConfig, StatusSource};
