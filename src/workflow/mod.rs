pub mod exam_session;
pub mod teaching_session;

pub use exam_session::{ExamSession, ExamStatus};
pub use teaching_session::TeachingSession;
