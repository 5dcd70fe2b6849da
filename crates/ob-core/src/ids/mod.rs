//! ID type wrappers for type safety.

mod id_macro;

pub mod course_id;
pub mod question_id;
pub mod user_id;

pub use course_id::CourseId;
pub use question_id::{AnswerId, QuestionId};
pub use user_id::UserId;
