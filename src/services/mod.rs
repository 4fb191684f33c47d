pub mod aggregator;
pub mod content_scorer;
pub mod prompts;
pub mod session_summarizer;
pub mod speech_scorer;

pub use aggregator::aggregate;
pub use content_scorer::ContentScorer;
pub use session_summarizer::SessionSummarizer;
pub use speech_scorer::SpeechScorer;
