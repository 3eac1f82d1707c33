pub mod engine;
pub mod states;

pub use engine::{FlowTransitionError, PipelineFlow};
pub use states::{PipelineStage, StageTransition};
