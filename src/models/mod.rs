pub mod chat;
pub mod question;
pub mod verdict;

pub use chat::ChatTurn;
pub use question::{ChoiceOption, Question, QuestionType};
pub use verdict::{EvaluationVerdict, VerdictFragment, VerdictResult};
