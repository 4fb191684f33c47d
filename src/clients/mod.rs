pub mod llm_client;
pub mod outcome;
pub mod speech_client;

pub use llm_client::{CompletionRequest, LlmClient, TextGrader};
pub use outcome::{ProviderOutcome, PROVIDER_TIMEOUT_SECS};
pub use speech_client::{
    AzureSpeechClient, PronunciationRequest, PronunciationScores, SpeechProvider, DEFAULT_LANGUAGE,
};
