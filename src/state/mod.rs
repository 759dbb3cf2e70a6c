pub mod error;
pub mod event;
pub mod machine;
pub mod model;

pub use error::{StateError, StateResult};
pub use event::{PipelineEvent, StateTransition};
pub use machine::PipelineMachine;
pub use model::PipelineState;
