use super::model::PipelineState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineEvent {
    /// Input was absent; nothing is sent.
    RejectInput,
    Send,
    RateLimit,
    Retry,
    GiveUp,
    Succeed,
    Block,
    ReceiveEmpty,
    Fail,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTransition {
    pub from: Option<PipelineState>,
    pub event: PipelineEvent,
    pub to: PipelineState,
}

impl StateTransition {
    pub const fn new(from: Option<PipelineState>, event: PipelineEvent, to: PipelineState) -> Self {
        Self { from, event, to }
    }
}
