pub mod grader;
pub mod parser;
pub mod prompts;

pub use grader::GradingEngine;
