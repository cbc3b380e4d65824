//! Outbound approval emails

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uniportal_store::Appointment;

use crate::error::NotifyError;

/// Body of the approval email request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalEmail {
    pub to_email: String,
    pub lecturer_name: String,
    pub date: String,
    pub time: String,
}

impl From<&Appointment> for ApprovalEmail {
    fn from(appointment: &Appointment) -> Self {
        Self {
            to_email: appointment.student_email.clone(),
            lecturer_name: appointment.lecturer_name.clone(),
            date: appointment.date.clone(),
            time: appointment.time.clone(),
        }
    }
}

impl ApprovalEmail {
    pub fn subject(&self) -> &'static str {
        "Appointment Approved"
    }

    /// Plain-text rendering of the single email template
    pub fn body(&self) -> String {
        format!(
            "Your appointment with {} on {} at {} has been approved.",
            self.lecturer_name, self.date, self.time
        )
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn appointment_approved(&self, email: &ApprovalEmail) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone)]
pub struct MailHookConfig {
    /// Endpoint receiving `{toEmail, lecturerName, date, time}`
    pub endpoint: String,
    pub timeout: Duration,
}

impl Default for MailHookConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:5001/sendApprovalEmail".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// POSTs approval emails to an HTTP mail function
#[derive(Debug, Clone)]
pub struct HttpMailHook {
    client: Client,
    endpoint: String,
}

impl HttpMailHook {
    pub fn new(config: &MailHookConfig) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Notifier for HttpMailHook {
    async fn appointment_approved(&self, email: &ApprovalEmail) -> Result<(), NotifyError> {
        debug!("POST {} for {}", self.endpoint, email.to_email);
        self.client
            .post(&self.endpoint)
            .json(email)
            .send()
            .await?
            .error_for_status()?;
        info!("Approval email requested for {}", email.to_email);
        Ok(())
    }
}

/// Writes the email to the log instead of sending it
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn appointment_approved(&self, email: &ApprovalEmail) -> Result<(), NotifyError> {
        info!(
            to = %email.to_email,
            subject = email.subject(),
            "{}",
            email.body()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        let email = ApprovalEmail {
            to_email: "amaya@students.nsbm.ac.lk".to_string(),
            lecturer_name: "Dr. Perera".to_string(),
            date: "2025-03-14".to_string(),
            time: "10:30".to_string(),
        };

        let value = serde_json::to_value(&email).unwrap();
        assert_eq!(value["toEmail"], "amaya@students.nsbm.ac.lk");
        assert_eq!(value["lecturerName"], "Dr. Perera");
        assert_eq!(value["date"], "2025-03-14");
        assert_eq!(value["time"], "10:30");
        assert_eq!(value.as_object().unwrap().len(), 4);
    }

    #[test]
    fn test_body_mentions_slot() {
        let email = ApprovalEmail {
            to_email: "amaya@students.nsbm.ac.lk".to_string(),
            lecturer_name: "Dr. Perera".to_string(),
            date: "2025-03-14".to_string(),
            time: "10:30".to_string(),
        };
        assert!(email.body().contains("Dr. Perera on 2025-03-14 at 10:30"));
    }

    #[tokio::test]
    async fn test_unreachable_hook_fails() {
        let hook = HttpMailHook::new(&MailHookConfig {
            endpoint: "http://127.0.0.1:9/sendApprovalEmail".to_string(),
            timeout: Duration::from_secs(2),
        })
        .unwrap();
        let email = ApprovalEmail {
            to_email: "amaya@students.nsbm.ac.lk".to_string(),
            lecturer_name: "Dr. Perera".to_string(),
            date: "2025-03-14".to_string(),
            time: "10:30".to_string(),
        };

        assert!(matches!(
            hook.appointment_approved(&email).await,
            Err(NotifyError::Http(_))
        ));
    }
}
