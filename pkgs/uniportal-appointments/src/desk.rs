//! Booking, deciding and reviewing appointments

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use sea_orm::DatabaseConnection;
use tracing::{info, instrument, warn};
use uniportal_auth::{Session, UserProfile};
use uniportal_store::{
    Appointment, AppointmentStatus, AppointmentStore, DirectoryFilter, NewAppointment,
    UserDirectory,
};

use crate::error::{AppointmentError, Result};
use crate::notifier::{ApprovalEmail, Notifier};

/// What a student fills in to request a meeting
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingRequest {
    pub lecturer_id: String,
    pub module: String,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`
    pub time: String,
    pub reason: String,
}

impl BookingRequest {
    fn validate(&self) -> Result<()> {
        let fields = [
            ("lecturer", &self.lecturer_id),
            ("module", &self.module),
            ("date", &self.date),
            ("time", &self.time),
            ("reason", &self.reason),
        ];
        if let Some((name, _)) = fields.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(AppointmentError::MissingField(*name));
        }

        NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d")
            .map_err(|_| AppointmentError::InvalidDate(self.date.clone()))?;
        NaiveTime::parse_from_str(self.time.trim(), "%H:%M")
            .map_err(|_| AppointmentError::InvalidTime(self.time.clone()))?;
        Ok(())
    }
}

/// Result of an approval
#[derive(Debug)]
pub struct Approval {
    pub appointment: Appointment,
    /// Set when the approval committed but the email could not be sent
    pub notify_error: Option<String>,
}

/// Appointment workflow between students and lecturers
#[derive(Clone)]
pub struct AppointmentDesk {
    store: AppointmentStore,
    directory: UserDirectory,
    notifier: Arc<dyn Notifier>,
}

impl AppointmentDesk {
    pub fn new(db: DatabaseConnection, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store: AppointmentStore::new(db.clone()),
            directory: UserDirectory::new(db),
            notifier,
        }
    }

    /// Lecturers a student can book
    pub async fn lecturers(&self) -> Result<Vec<UserProfile>> {
        Ok(self.directory.members(&DirectoryFilter::staff()).await?)
    }

    #[instrument(skip_all, fields(student = %student.uid(), lecturer = %request.lecturer_id))]
    pub async fn book(&self, student: &Session, request: BookingRequest) -> Result<Appointment> {
        if student.is_staff() {
            return Err(AppointmentError::StudentsOnly);
        }
        request.validate()?;

        let lecturer = self
            .directory
            .get(request.lecturer_id.trim())
            .await?
            .filter(|profile| profile.is_staff())
            .ok_or_else(|| AppointmentError::NotALecturer(request.lecturer_id.clone()))?;

        let profile = &student.profile;
        let appointment = self
            .store
            .insert(NewAppointment {
                student_id: profile.uid.clone(),
                student_name: profile.name.clone(),
                student_email: profile.email.clone(),
                lecturer_id: lecturer.uid,
                lecturer_name: lecturer.name,
                lecturer_email: lecturer.email,
                module: request.module.trim().to_string(),
                date: request.date.trim().to_string(),
                time: request.time.trim().to_string(),
                reason: request.reason.trim().to_string(),
            })
            .await?;

        info!(
            "Appointment {} booked with {} on {} {}",
            appointment.id, appointment.lecturer_name, appointment.date, appointment.time
        );
        Ok(appointment)
    }

    /// Approve a pending request and email the student
    ///
    /// The email goes out only after the status change commits. A delivery
    /// failure leaves the appointment approved and is returned in
    /// [`Approval::notify_error`].
    #[instrument(skip(self, lecturer, reply), fields(lecturer = %lecturer.uid()))]
    pub async fn approve(
        &self,
        lecturer: &Session,
        id: &str,
        reply: Option<String>,
    ) -> Result<Approval> {
        let appointment = self
            .decide(lecturer, id, AppointmentStatus::Approved, reply)
            .await?;

        let email = ApprovalEmail::from(&appointment);
        let notify_error = match self.notifier.appointment_approved(&email).await {
            Ok(()) => None,
            Err(e) => {
                warn!("Approval email for {} failed: {}", id, e);
                Some(e.to_string())
            }
        };

        Ok(Approval {
            appointment,
            notify_error,
        })
    }

    #[instrument(skip(self, lecturer, reply), fields(lecturer = %lecturer.uid()))]
    pub async fn reject(
        &self,
        lecturer: &Session,
        id: &str,
        reply: Option<String>,
    ) -> Result<Appointment> {
        self.decide(lecturer, id, AppointmentStatus::Rejected, reply)
            .await
    }

    /// Record that the student has read the lecturer's decision
    pub async fn mark_viewed(&self, student: &Session, id: &str) -> Result<Appointment> {
        let appointment = self.find(id).await?;
        if appointment.student_id != student.uid() {
            return Err(AppointmentError::NotRequester(id.to_string()));
        }
        if !self.store.mark_viewed(id).await? {
            return Err(AppointmentError::Undecided(id.to_string()));
        }
        self.find(id).await
    }

    /// Newest first
    pub async fn for_student(&self, student: &Session) -> Result<Vec<Appointment>> {
        Ok(self.store.for_student(student.uid()).await?)
    }

    /// Newest first
    pub async fn for_lecturer(&self, lecturer: &Session) -> Result<Vec<Appointment>> {
        Ok(self.store.for_lecturer(lecturer.uid()).await?)
    }

    /// Decisions the student has not opened yet
    pub async fn unviewed_responses(&self, student: &Session) -> Result<Vec<Appointment>> {
        Ok(self.store.unviewed_for_student(student.uid()).await?)
    }

    async fn decide(
        &self,
        lecturer: &Session,
        id: &str,
        to: AppointmentStatus,
        reply: Option<String>,
    ) -> Result<Appointment> {
        let appointment = self.find(id).await?;
        if appointment.lecturer_id != lecturer.uid() {
            warn!(
                "{} tried to decide {} addressed to {}",
                lecturer.uid(),
                id,
                appointment.lecturer_id
            );
            return Err(AppointmentError::NotAddressee(id.to_string()));
        }

        let reply = reply
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());
        if !self
            .store
            .transition(id, AppointmentStatus::Pending, to, reply)
            .await?
        {
            let current = self.find(id).await?;
            return Err(AppointmentError::AlreadyDecided {
                id: id.to_string(),
                status: current.status,
            });
        }

        let appointment = self.find(id).await?;
        info!("Appointment {} {}", id, appointment.status);
        Ok(appointment)
    }

    async fn find(&self, id: &str) -> Result<Appointment> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| AppointmentError::NotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> BookingRequest {
        BookingRequest {
            lecturer_id: "perera".to_string(),
            module: "CS101".to_string(),
            date: "2025-03-14".to_string(),
            time: "10:30".to_string(),
            reason: "Project feedback".to_string(),
        }
    }

    #[test]
    fn test_validate_slot() {
        assert!(request().validate().is_ok());

        let bad_date = BookingRequest {
            date: "14/03/2025".to_string(),
            ..request()
        };
        assert!(matches!(
            bad_date.validate(),
            Err(AppointmentError::InvalidDate(_))
        ));

        let bad_time = BookingRequest {
            time: "25:00".to_string(),
            ..request()
        };
        assert!(matches!(
            bad_time.validate(),
            Err(AppointmentError::InvalidTime(_))
        ));

        let blank = BookingRequest {
            reason: "  ".to_string(),
            ..request()
        };
        assert!(matches!(
            blank.validate(),
            Err(AppointmentError::MissingField("reason"))
        ));
    }
}
