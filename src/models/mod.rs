pub mod answer;
pub mod exam;
pub mod question;

pub use answer::{AnswerValue, NormalizedAnswer, PopupAnswer, PopupChoice, SubmissionPayload};
pub use exam::{AttemptInfo, ExamDefinition, ExamQuestion, HandleStatus, TestType};
pub use question::{AnswerConfig, AnswerOption, PopupTime, Question, QuestionType};
