//! Integration tests for AppointmentDesk
//!
//! Covers booking rules, one-shot decisions, the approval email hand-off
//! and the student's unviewed inbox.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use sea_orm::DatabaseConnection;
use tempfile::NamedTempFile;
use uniportal_appointments::{
    AppointmentDesk, AppointmentError, AppointmentStatus, ApprovalEmail, BookingRequest,
    HttpMailHook, MailHookConfig, Notifier, NotifyError,
};
use uniportal_auth::{AuthManager, Role, Session, SignupRequest, UserProfile};
use uniportal_store::{connect, StoreConfig};

const PASSWORD: &str = "test_secure_password_123";

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<ApprovalEmail>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn appointment_approved(&self, email: &ApprovalEmail) -> Result<(), NotifyError> {
        self.sent.lock().push(email.clone());
        Ok(())
    }
}

async fn open_db(path: &NamedTempFile) -> DatabaseConnection {
    connect(&StoreConfig {
        db_path: path.path().to_path_buf(),
        ..Default::default()
    })
    .await
    .expect("Failed to open store")
}

async fn lecturer(db: &DatabaseConnection, name: &str, email: &str) -> Session {
    let auth = AuthManager::new(db.clone());
    let outcome = auth
        .sign_up(SignupRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: PASSWORD.to_string(),
            confirm_password: PASSWORD.to_string(),
            role: Role::Staff,
            faculty: String::new(),
            degree_program: String::new(),
            batch_number: String::new(),
        })
        .await
        .expect("Failed to sign up lecturer");
    auth.verify_email(&outcome.verification_token).await.unwrap();
    auth.login(email, PASSWORD).await.unwrap()
}

fn student(uid: &str) -> Session {
    Session::new(UserProfile {
        uid: uid.to_string(),
        name: "Amaya Fernando".to_string(),
        email: format!("{}@students.nsbm.ac.lk", uid),
        role: Role::Student,
        faculty: "Computing".to_string(),
        degree_program: "Computer Science".to_string(),
        batch_number: "23.1".to_string(),
    })
}

fn booking(lecturer: &Session) -> BookingRequest {
    BookingRequest {
        lecturer_id: lecturer.uid().to_string(),
        module: "CS101".to_string(),
        date: "2025-03-14".to_string(),
        time: "10:30".to_string(),
        reason: "Project feedback".to_string(),
    }
}

#[tokio::test]
async fn test_book_and_approve_sends_email() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = open_db(&temp_file).await;
    let perera = lecturer(&db, "Dr. Perera", "perera@staff.nsbm.ac.lk").await;
    let amaya = student("amaya");
    let notifier = Arc::new(RecordingNotifier::default());
    let desk = AppointmentDesk::new(db, notifier.clone());

    let booked = desk.book(&amaya, booking(&perera)).await.unwrap();
    assert_eq!(booked.status, AppointmentStatus::Pending);
    assert_eq!(booked.lecturer_name, "Dr. Perera");
    assert_eq!(desk.for_lecturer(&perera).await.unwrap().len(), 1);
    assert!(desk.unviewed_responses(&amaya).await.unwrap().is_empty());

    let approval = desk
        .approve(&perera, &booked.id, Some("  See you then ".to_string()))
        .await
        .unwrap();
    assert_eq!(approval.appointment.status, AppointmentStatus::Approved);
    assert_eq!(approval.appointment.reply.as_deref(), Some("See you then"));
    assert!(approval.notify_error.is_none());

    let sent = notifier.sent.lock().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to_email, "amaya@students.nsbm.ac.lk");
    assert_eq!(sent[0].lecturer_name, "Dr. Perera");
    assert_eq!(sent[0].date, "2025-03-14");
    assert_eq!(sent[0].time, "10:30");
}

#[tokio::test]
async fn test_decisions_happen_once() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = open_db(&temp_file).await;
    let perera = lecturer(&db, "Dr. Perera", "perera@staff.nsbm.ac.lk").await;
    let amaya = student("amaya");
    let notifier = Arc::new(RecordingNotifier::default());
    let desk = AppointmentDesk::new(db, notifier.clone());

    let booked = desk.book(&amaya, booking(&perera)).await.unwrap();
    desk.reject(&perera, &booked.id, None).await.unwrap();

    assert!(matches!(
        desk.approve(&perera, &booked.id, None).await,
        Err(AppointmentError::AlreadyDecided {
            status: AppointmentStatus::Rejected,
            ..
        })
    ));
    assert!(matches!(
        desk.reject(&perera, &booked.id, None).await,
        Err(AppointmentError::AlreadyDecided { .. })
    ));
    assert!(notifier.sent.lock().is_empty());
}

#[tokio::test]
async fn test_only_addressed_lecturer_decides() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = open_db(&temp_file).await;
    let perera = lecturer(&db, "Dr. Perera", "perera@staff.nsbm.ac.lk").await;
    let silva = lecturer(&db, "Dr. Silva", "silva@staff.nsbm.ac.lk").await;
    let desk = AppointmentDesk::new(db, Arc::new(RecordingNotifier::default()));

    let booked = desk.book(&student("amaya"), booking(&perera)).await.unwrap();

    assert!(matches!(
        desk.approve(&silva, &booked.id, None).await,
        Err(AppointmentError::NotAddressee(_))
    ));
    assert!(matches!(
        desk.approve(&perera, "missing", None).await,
        Err(AppointmentError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_booking_rules() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = open_db(&temp_file).await;
    let perera = lecturer(&db, "Dr. Perera", "perera@staff.nsbm.ac.lk").await;
    let desk = AppointmentDesk::new(db, Arc::new(RecordingNotifier::default()));

    assert!(matches!(
        desk.book(&perera, booking(&perera)).await,
        Err(AppointmentError::StudentsOnly)
    ));

    let not_staff = BookingRequest {
        lecturer_id: "kasun".to_string(),
        ..booking(&perera)
    };
    assert!(matches!(
        desk.book(&student("amaya"), not_staff).await,
        Err(AppointmentError::NotALecturer(_))
    ));

    let bad_time = BookingRequest {
        time: "half ten".to_string(),
        ..booking(&perera)
    };
    assert!(matches!(
        desk.book(&student("amaya"), bad_time).await,
        Err(AppointmentError::InvalidTime(_))
    ));

    let lecturers = desk.lecturers().await.unwrap();
    assert_eq!(lecturers.len(), 1);
    assert_eq!(lecturers[0].uid, perera.uid());
}

#[tokio::test]
async fn test_failed_email_keeps_approval() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = open_db(&temp_file).await;
    let perera = lecturer(&db, "Dr. Perera", "perera@staff.nsbm.ac.lk").await;
    let amaya = student("amaya");
    let unreachable = HttpMailHook::new(&MailHookConfig {
        endpoint: "http://127.0.0.1:9/sendApprovalEmail".to_string(),
        timeout: Duration::from_secs(2),
    })
    .unwrap();
    let desk = AppointmentDesk::new(db, Arc::new(unreachable));

    let booked = desk.book(&amaya, booking(&perera)).await.unwrap();
    let approval = desk.approve(&perera, &booked.id, None).await.unwrap();

    assert!(approval.notify_error.is_some());
    let stored = desk.for_student(&amaya).await.unwrap();
    assert_eq!(stored[0].status, AppointmentStatus::Approved);
}

#[tokio::test]
async fn test_viewed_inbox() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = open_db(&temp_file).await;
    let perera = lecturer(&db, "Dr. Perera", "perera@staff.nsbm.ac.lk").await;
    let amaya = student("amaya");
    let kasun = student("kasun");
    let desk = AppointmentDesk::new(db, Arc::new(RecordingNotifier::default()));

    let booked = desk.book(&amaya, booking(&perera)).await.unwrap();
    assert!(matches!(
        desk.mark_viewed(&amaya, &booked.id).await,
        Err(AppointmentError::Undecided(_))
    ));

    desk.approve(&perera, &booked.id, None).await.unwrap();
    assert_eq!(desk.unviewed_responses(&amaya).await.unwrap().len(), 1);

    assert!(matches!(
        desk.mark_viewed(&kasun, &booked.id).await,
        Err(AppointmentError::NotRequester(_))
    ));

    let viewed = desk.mark_viewed(&amaya, &booked.id).await.unwrap();
    assert!(viewed.student_viewed);
    assert!(desk.unviewed_responses(&amaya).await.unwrap().is_empty());
}
