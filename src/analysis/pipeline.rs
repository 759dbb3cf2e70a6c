use std::sync::{mpsc, Arc};

use super::classify::{classify, Outcome};
use super::retry::{CancelToken, RetryPolicy, Sleeper};
use super::transport::InferenceTransport;
use super::wire::GenerateContentRequest;
use super::{AnalysisError, AnalysisResult, DIAGNOSTIC_INSTRUCTION, DIAGNOSTIC_PROMPT};
use crate::capture::ImagePayload;
use crate::state::{PipelineEvent, PipelineMachine};
use crate::storage::{AnalysisRecord, RecordStore};

/// Result of a successful invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisReport {
    pub record: AnalysisRecord,
    pub attempts: u32,
    /// `false` when the record could not be written to the store.
    pub persisted: bool,
}

/// Turns an image payload into a stored [`AnalysisRecord`] via the remote
/// inference endpoint, retrying rate-limited attempts with backoff.
pub struct AnalysisPipeline {
    transport: Box<dyn InferenceTransport>,
    sleeper: Box<dyn Sleeper>,
    records: Arc<RecordStore>,
    policy: RetryPolicy,
}

impl AnalysisPipeline {
    pub fn new(
        transport: Box<dyn InferenceTransport>,
        sleeper: Box<dyn Sleeper>,
        records: Arc<RecordStore>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            sleeper,
            records,
            policy,
        }
    }

    pub fn run(
        &self,
        payload: Option<&ImagePayload>,
        cancel: &CancelToken,
    ) -> AnalysisResult<AnalysisReport> {
        let mut machine = PipelineMachine::new();

        let Some(image) = payload.filter(|payload| !payload.is_empty()) else {
            machine.transition(PipelineEvent::RejectInput)?;
            tracing::warn!("analysis requested without an image payload");
            return Err(AnalysisError::MissingInput);
        };
        if cancel.is_cancelled() {
            return cancelled(&mut machine);
        }

        let request = GenerateContentRequest::new(DIAGNOSTIC_INSTRUCTION, DIAGNOSTIC_PROMPT, image);
        machine.transition(PipelineEvent::Send)?;

        let mut attempt = 0u32;
        loop {
            tracing::debug!(attempt, "sending analysis request");
            let response = self.transport.send(&request);
            if cancel.is_cancelled() {
                tracing::debug!(attempt, "discarding response received after cancellation");
                return cancelled(&mut machine);
            }

            let outcome = match response {
                Ok(response) => classify(&response),
                Err(err) => Outcome::NetworkError {
                    reason: err.to_string(),
                },
            };

            match outcome {
                Outcome::RateLimited => {
                    machine.transition(PipelineEvent::RateLimit)?;
                    if !self.policy.has_attempts_after(attempt) {
                        machine.transition(PipelineEvent::GiveUp)?;
                        let attempts = attempt + 1;
                        tracing::warn!(attempts, "rate limit persisted; giving up");
                        return Err(AnalysisError::RateLimitExhausted { attempts });
                    }

                    let delay = self.policy.delay_for(attempt);
                    tracing::debug!(attempt, ?delay, "rate limited; backing off");
                    if !self.sleeper.pause(delay, cancel) {
                        return cancelled(&mut machine);
                    }
                    machine.transition(PipelineEvent::Retry)?;
                    attempt += 1;
                }
                Outcome::NetworkError { reason } => {
                    machine.transition(PipelineEvent::Fail)?;
                    tracing::warn!(attempt, %reason, "analysis request failed");
                    return Err(AnalysisError::Network { reason });
                }
                Outcome::SafetyBlocked => {
                    machine.transition(PipelineEvent::Block)?;
                    tracing::warn!(attempt, "analysis withheld for safety reasons");
                    return Err(AnalysisError::SafetyBlocked);
                }
                Outcome::EmptyResponse { raw } => {
                    machine.transition(PipelineEvent::ReceiveEmpty)?;
                    tracing::warn!(attempt, response = %raw, "analysis response had no usable text");
                    return Err(AnalysisError::EmptyResponse);
                }
                Outcome::Success { text } => {
                    machine.transition(PipelineEvent::Succeed)?;
                    let record = AnalysisRecord::new(image, text);
                    let persisted = match self.records.add(record.clone()) {
                        Ok(()) => true,
                        Err(err) => {
                            tracing::warn!(?err, id = %record.id, "failed to store analysis record");
                            false
                        }
                    };
                    tracing::info!(id = %record.id, attempts = attempt + 1, "analysis complete");
                    return Ok(AnalysisReport {
                        record,
                        attempts: attempt + 1,
                        persisted,
                    });
                }
            }
        }
    }
}

fn cancelled(machine: &mut PipelineMachine) -> AnalysisResult<AnalysisReport> {
    machine.transition(PipelineEvent::Cancel)?;
    tracing::debug!("analysis cancelled");
    Err(AnalysisError::Cancelled)
}

/// Handle to an analysis running on a worker thread. Dropping it cancels the
/// run; a response still in flight is discarded and nothing is stored.
pub struct AnalysisTask {
    cancel: CancelToken,
    receiver: mpsc::Receiver<AnalysisResult<AnalysisReport>>,
}

impl AnalysisTask {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Blocks until the worker finishes.
    pub fn wait(self) -> AnalysisResult<AnalysisReport> {
        self.receiver
            .recv()
            .unwrap_or(Err(AnalysisError::Cancelled))
    }
}

impl Drop for AnalysisTask {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

pub fn spawn_analysis(pipeline: Arc<AnalysisPipeline>, payload: Option<ImagePayload>) -> AnalysisTask {
    let cancel = CancelToken::new();
    let worker_cancel = cancel.clone();
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let result = pipeline.run(payload.as_ref(), &worker_cancel);
        let _ = tx.send(result);
    });
    AnalysisTask {
        cancel,
        receiver: rx,
    }
}
