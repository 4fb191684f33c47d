pub mod assessment;
pub mod loaders;
pub mod question;
pub mod session;

pub use assessment::{AggregatedResult, ContentAssessment, SpeechAssessment, SpeechInput};
pub use loaders::{load_question_bank, load_question_bank_or_builtin};
pub use question::{PracticeQuestion, QuestionBank, QuestionContext, QuestionType};
pub use session::{ContentAverages, SessionItem, SessionScores, SessionSummaryInput, SpeechAverages};
