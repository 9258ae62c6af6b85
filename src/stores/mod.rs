pub mod chat_archive;
mod persist;
pub mod wrong_bank;

pub use chat_archive::ChatArchive;
pub use wrong_bank::{WrongQuestionBank, WrongQuestionRecord};
