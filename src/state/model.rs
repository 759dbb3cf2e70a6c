/// Phase of a single analysis invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineState {
    #[default]
    Idle,
    Requesting,
    RateLimited,
    Succeeded,
    SafetyBlocked,
    EmptyResponse,
    NetworkFailed,
    Exhausted,
    Rejected,
    Cancelled,
}

impl PipelineState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Idle | Self::Requesting | Self::RateLimited)
    }
}
