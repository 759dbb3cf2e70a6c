use super::error::{StateError, StateResult};
use super::{event::StateTransition, PipelineEvent, PipelineState};

#[derive(Debug)]
pub struct PipelineMachine {
    state: PipelineState,
    transition_history: Vec<StateTransition>,
}

impl PipelineMachine {
    pub fn new() -> Self {
        Self {
            state: PipelineState::default(),
            transition_history: Vec::new(),
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn history(&self) -> &[StateTransition] {
        &self.transition_history
    }

    pub fn can_transition(&self, event: PipelineEvent) -> bool {
        self.next_state(event).is_some()
    }

    pub fn next_state(&self, event: PipelineEvent) -> Option<PipelineState> {
        use PipelineEvent::*;
        use PipelineState::*;
        match (self.state, event) {
            (Idle, RejectInput) => Some(Rejected),
            (Idle, Send) => Some(Requesting),
            (Requesting, RateLimit) => Some(RateLimited),
            (RateLimited, Retry) => Some(Requesting),
            (RateLimited, GiveUp) => Some(Exhausted),
            (Requesting, Succeed) => Some(Succeeded),
            (Requesting, Block) => Some(SafetyBlocked),
            (Requesting, ReceiveEmpty) => Some(EmptyResponse),
            (Requesting, Fail) => Some(NetworkFailed),
            (Idle | Requesting | RateLimited, Cancel) => Some(Cancelled),
            _ => None,
        }
    }

    pub fn transition(&mut self, event: PipelineEvent) -> StateResult<PipelineState> {
        tracing::debug!(from = ?self.state, event = ?event, "request pipeline transition");
        let next = self.next_state(event).ok_or_else(|| {
            let from = self.state;
            tracing::warn!(from = ?from, event = ?event, "invalid pipeline transition requested");
            StateError::InvalidStateTransition { from, event }
        })?;

        let record = StateTransition::new(Some(self.state), event, next);
        self.state = next;
        self.transition_history.push(record);

        Ok(self.state)
    }
}

impl Default for PipelineMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PipelineMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PipelineState::{:?}", self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_transition_tracks_valid_and_invalid_events() {
        let mut machine = PipelineMachine::new();
        assert!(machine.can_transition(PipelineEvent::Send));
        assert!(machine.can_transition(PipelineEvent::RejectInput));
        assert!(!machine.can_transition(PipelineEvent::Succeed));

        machine
            .transition(PipelineEvent::Send)
            .expect("idle -> requesting should transition");

        assert!(machine.can_transition(PipelineEvent::RateLimit));
        assert!(machine.can_transition(PipelineEvent::Block));
        assert!(!machine.can_transition(PipelineEvent::Retry));
    }

    #[test]
    fn rate_limited_retry_then_success_records_ordered_history() {
        let mut machine = PipelineMachine::new();
        for event in [
            PipelineEvent::Send,
            PipelineEvent::RateLimit,
            PipelineEvent::Retry,
            PipelineEvent::Succeed,
        ] {
            machine.transition(event).expect("transition should work");
        }

        assert_eq!(machine.state(), PipelineState::Succeeded);
        assert!(machine.state().is_terminal());
        assert_eq!(
            machine.history(),
            &[
                StateTransition::new(
                    Some(PipelineState::Idle),
                    PipelineEvent::Send,
                    PipelineState::Requesting
                ),
                StateTransition::new(
                    Some(PipelineState::Requesting),
                    PipelineEvent::RateLimit,
                    PipelineState::RateLimited
                ),
                StateTransition::new(
                    Some(PipelineState::RateLimited),
                    PipelineEvent::Retry,
                    PipelineState::Requesting
                ),
                StateTransition::new(
                    Some(PipelineState::Requesting),
                    PipelineEvent::Succeed,
                    PipelineState::Succeeded
                ),
            ]
        );
    }

    #[test]
    fn terminal_states_accept_no_further_events() {
        let mut machine = PipelineMachine::new();
        machine.transition(PipelineEvent::Send).unwrap();
        machine.transition(PipelineEvent::Fail).unwrap();

        let err = machine
            .transition(PipelineEvent::Cancel)
            .expect_err("network failure is terminal");
        assert!(matches!(
            err,
            StateError::InvalidStateTransition {
                from: PipelineState::NetworkFailed,
                event: PipelineEvent::Cancel
            }
        ));
        assert_eq!(machine.history().len(), 2);
    }

    #[test]
    fn invalid_transition_returns_error_without_mutating_history() {
        let mut machine = PipelineMachine::new();

        let err = machine
            .transition(PipelineEvent::GiveUp)
            .expect_err("idle -> give up should fail");
        assert!(matches!(
            err,
            StateError::InvalidStateTransition {
                from: PipelineState::Idle,
                event: PipelineEvent::GiveUp
            }
        ));
        assert_eq!(machine.state(), PipelineState::Idle);
        assert!(machine.history().is_empty());
    }
}
