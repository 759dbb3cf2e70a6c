use thiserror::Error;

use crate::state::StateError;

mod classify;
mod pipeline;
mod retry;
mod transport;
pub mod wire;

pub use classify::{classify, Outcome, STATUS_TOO_MANY_REQUESTS};
pub use pipeline::{spawn_analysis, AnalysisPipeline, AnalysisReport, AnalysisTask};
pub use retry::{CancelToken, CancellableSleeper, RetryPolicy, Sleeper};
pub use transport::{
    InferenceTransport, ReqwestTransport, TransportError, TransportResponse, TransportResult,
};

/// Fixed system instruction describing the diagnostic task and output format.
pub const DIAGNOSTIC_INSTRUCTION: &str = "You are a bot specialized in plant analysis. \
Analyze the image of a leaf and determine whether it is healthy or has problems. \
Provide a detailed analysis, including possible diseases, pests or nutrient deficiencies. \
Include specific treatment recommendations. \
The response must be formatted in Markdown with clear sections.";

/// Fixed user prompt sent alongside the image.
pub const DIAGNOSTIC_PROMPT: &str = "Analyze this image of a plant leaf and tell me whether \
it looks healthy or has any problem. Include a brief treatment recommendation if necessary.";

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("no image payload to analyze")]
    MissingInput,
    #[error("network error: {reason}")]
    Network { reason: String },
    #[error("rate limited on all {attempts} attempts")]
    RateLimitExhausted { attempts: u32 },
    #[error("response withheld for safety reasons")]
    SafetyBlocked,
    #[error("response contained no diagnostic text")]
    EmptyResponse,
    #[error("analysis cancelled")]
    Cancelled,
    #[error(transparent)]
    State(#[from] StateError),
}

pub type AnalysisResult<T> = std::result::Result<T, AnalysisError>;

impl AnalysisError {
    /// Single message shown to the user for this failure.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::MissingInput => "Image not found for analysis.",
            Self::Network { .. } => {
                "Error analyzing the image. Check your connection and try again."
            }
            Self::RateLimitExhausted { .. } => {
                "Failed to analyze the image after several attempts. Please try again later."
            }
            Self::SafetyBlocked => {
                "The analysis could not be completed due to safety concerns. Try a different image."
            }
            Self::EmptyResponse => "Empty or invalid API response. Please try again.",
            Self::Cancelled => "The analysis was cancelled.",
            Self::State(_) => "Unexpected error while analyzing the image. Please try again.",
        }
    }
}
