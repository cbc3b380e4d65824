//! Error types for chat operations

use thiserror::Error;
use uniportal_store::StoreError;

use crate::image::ImageRejection;
use crate::polls::PollRejection;

pub type Result<T> = std::result::Result<T, ChatError>;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Message is empty")]
    EmptyMessage,
    #[error("Invalid poll: {0}")]
    InvalidPoll(#[from] PollRejection),
    #[error("Option {option} is out of range (poll has {options} options)")]
    OptionOutOfRange { option: usize, options: usize },
    #[error("Message {0} is not a poll")]
    NotAPoll(String),
    #[error("Message not found: {0}")]
    MessageNotFound(String),
    #[error("Only staff can post in {0}")]
    StaffOnly(String),
    #[error("Not allowed: {0}")]
    Forbidden(String),
    #[error("Unknown announcement duration '{0}' (expected 24h, 7d, 30d or forever)")]
    InvalidDuration(String),
    #[error("Invalid scope: {0}")]
    InvalidScope(String),
    #[error("Invalid image: {0}")]
    InvalidImage(#[from] ImageRejection),
    #[error("Question not found: {0}")]
    QuestionNotFound(String),
    #[error("Reply not found: {0}")]
    ReplyNotFound(String),
    #[error("Invalid word list: {0}")]
    WordList(#[from] regex::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
