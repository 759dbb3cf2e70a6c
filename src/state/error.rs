use super::event::PipelineEvent;
use super::model::PipelineState;
use thiserror::Error;

pub type StateResult<T> = std::result::Result<T, StateError>;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("invalid pipeline transition: from {from:?} using event {event:?}")]
    InvalidStateTransition {
        from: PipelineState,
        event: PipelineEvent,
    },
}
