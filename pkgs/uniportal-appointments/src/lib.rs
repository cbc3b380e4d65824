//! UniPortal Appointments - students booking time with lecturers
//!
//! A request starts `Pending` and is decided once by the lecturer it is
//! addressed to. Approvals trigger an email through the [`Notifier`] seam;
//! students then acknowledge decisions with [`AppointmentDesk::mark_viewed`].

pub mod desk;
pub mod error;
pub mod notifier;

pub use desk::{AppointmentDesk, Approval, BookingRequest};
pub use error::{AppointmentError, NotifyError, Result};
pub use notifier::{ApprovalEmail, HttpMailHook, LogNotifier, MailHookConfig, Notifier};
pub use uniportal_store::{Appointment, AppointmentStatus};
