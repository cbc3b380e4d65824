pub mod appointments;
pub mod chat_messages;
pub mod last_seen;
pub mod qna_questions;
pub mod qna_replies;

pub use appointments::Entity as Appointments;
pub use chat_messages::Entity as ChatMessages;
pub use last_seen::Entity as LastSeen;
pub use qna_questions::Entity as QnaQuestions;
pub use qna_replies::Entity as QnaReplies;
