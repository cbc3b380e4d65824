//! Error types for the appointment workflow

use thiserror::Error;
use uniportal_store::{AppointmentStatus, StoreError};

pub type Result<T> = std::result::Result<T, AppointmentError>;

#[derive(Error, Debug)]
pub enum AppointmentError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Only students can book appointments")]
    StudentsOnly,
    #[error("{0} is not a lecturer")]
    NotALecturer(String),
    #[error("Appointment not found: {0}")]
    NotFound(String),
    #[error("Appointment {0} is addressed to another lecturer")]
    NotAddressee(String),
    #[error("Appointment {0} belongs to another student")]
    NotRequester(String),
    #[error("Appointment {id} is already {status}")]
    AlreadyDecided { id: String, status: AppointmentStatus },
    #[error("Appointment {0} has no decision yet")]
    Undecided(String),
    #[error("Missing field: {0}")]
    MissingField(&'static str),
    #[error("Invalid date {0:?}, expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("Invalid time {0:?}, expected HH:MM")]
    InvalidTime(String),
    #[error("Notification failed: {0}")]
    Notify(#[from] NotifyError),
}

/// Failure delivering an outbound email
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
