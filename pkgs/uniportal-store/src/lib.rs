//! UniPortal Store - SQLite persistence for portal documents
//!
//! This crate keeps chat messages, last-seen markers, appointment requests
//! and Q&A threads in one SQLite database via Sea-ORM, and fans out live
//! snapshots to in-process listeners.
//!
//! # Architecture
//!
//! - **MessageStore**: Messages per scope key, ordered by server time, with
//!   transactional read-modify-write for votes and reactions
//! - **LastSeenStore**: The newest message id each user has seen per scope
//! - **AppointmentStore**: Booking requests and their guarded status changes
//! - **QnaStore**: Questions, replies, thumbs up and deletion
//! - **UserDirectory**: Read-only account lookups by academic scope
//! - **SnapshotHub**: Latest-value broadcast keyed by scope
//!
//! # Database Schema
//!
//! - `accounts`, `auth_tokens`: owned by `uniportal-auth`, migrated first
//! - `chat_messages`: message document, kind payload as JSON, reactions
//! - `last_seen`: `(user_id, scope_key)` to message id
//! - `appointments`: request details, status, reply, viewed flag
//! - `qna_questions`, `qna_replies`: threads with thumbs-up email lists
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use uniportal_store::{connect, MessageStore, MessageBody, NewChatMessage, StoreConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = connect(&StoreConfig {
//!     db_path: "uniportal.db".into(),
//!     ..Default::default()
//! })
//! .await?;
//!
//! let messages = MessageStore::new(db);
//! messages
//!     .insert(NewChatMessage {
//!         id: "C_abcd1234".to_string(),
//!         scope_key: "Computing".to_string(),
//!         sender_id: "uid-1".to_string(),
//!         sender_name: "Amaya".to_string(),
//!         text: "Hello".to_string(),
//!         body: MessageBody::Text,
//!         reply_to: None,
//!         image_url: None,
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod appointment_store;
pub mod documents;
pub mod entities;
pub mod error;
pub mod last_seen_store;
pub mod message_store;
pub mod migration;
pub mod qna_store;
pub mod snapshot_hub;
pub mod user_directory;

use std::path::PathBuf;
use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use tracing::info;

pub use appointment_store::AppointmentStore;
pub use documents::{
    AnnouncementDocument, Appointment, AppointmentStatus, ChatMessage, MessageBody,
    NewAppointment, NewChatMessage, NewQuestion, NewReply, PollDocument, QnaQuestion, QnaReply,
    ReplyRef, VoteValue,
};
pub use error::{Result, StoreError};
pub use last_seen_store::LastSeenStore;
pub use message_store::MessageStore;
pub use qna_store::{QnaStore, DELETED_PLACEHOLDER};
pub use snapshot_hub::{SnapshotHub, Subscription};
pub use user_directory::{DirectoryFilter, UserDirectory};

/// Database settings
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub db_path: PathBuf,
    pub connect_timeout: Duration,
    /// Log every SQL statement through sqlx
    pub sqlx_logging: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("uniportal.db"),
            connect_timeout: Duration::from_secs(10),
            sqlx_logging: false,
        }
    }
}

/// Open (creating if needed) and migrate the database at `config.db_path`
pub async fn connect(config: &StoreConfig) -> Result<DatabaseConnection> {
    let db_path = config
        .db_path
        .to_str()
        .ok_or_else(|| StoreError::InvalidPath(config.db_path.display().to_string()))?
        .replace('\\', "/");

    // SQLite takes one writer at a time; a single pooled connection queues
    // every statement and transaction instead of failing with SQLITE_BUSY.
    let mut options = ConnectOptions::new(format!("sqlite:{}?mode=rwc", db_path));
    options
        .max_connections(1)
        .min_connections(1)
        .connect_timeout(config.connect_timeout)
        .sqlx_logging(config.sqlx_logging);

    let db = Database::connect(options).await?;
    migration::Migrator::up(&db, None).await?;

    info!("Store initialized at {}", config.db_path.display());
    Ok(db)
}
