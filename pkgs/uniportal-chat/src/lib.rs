//! UniPortal Chat - scoped group chat on top of the portal store
//!
//! A [`ChatRoom`] is one signed-in user looking at one [`ChatScope`]
//! (faculty, degree, batch or module channel). Rooms write through the
//! store and push whole-scope snapshots to every [`RoomFeed`] listening on
//! the same scope. Each snapshot is decorated per viewer with the active
//! announcements, the first unseen `@mention` and an unread count.
//!
//! Alongside the room:
//!
//! - [`polls`]: drafting, single/multi-select voting and tallies
//! - [`announcements`]: expiry durations, search and the rotating banner
//! - [`mentions`]: the last-seen cursor, mention scan and `@` completion
//! - [`profanity`]: whole-word masking applied before anything is stored
//! - [`image`]: attachment checks and the [`ImageHost`] seam
//! - [`qna`]: the per-module question board

pub mod action;
pub mod announcements;
pub mod error;
pub mod image;
pub mod mentions;
pub mod polls;
pub mod profanity;
pub mod qna;
pub mod room;
pub mod scope;

use std::path::PathBuf;
use std::time::Duration;

pub use action::{Action, ActionKind, ActionState};
pub use announcements::{spawn_rotation, AnnouncementDuration, Rotation, RotationHandle};
pub use error::{ChatError, Result};
pub use image::{ImageHost, ImageUpload, LocalImageHost};
pub use polls::{OptionTally, PollDraft, PollRejection, PollVoting};
pub use profanity::ProfanityFilter;
pub use qna::QnaBoard;
pub use room::{ChatContext, ChatRoom, RoomFeed, RoomSnapshot};
pub use scope::{ChatScope, ModuleChannel, ScopeLevel};

/// Chat settings
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Words masked in addition to the built-in list
    pub extra_profanity: Vec<String>,
    /// Where [`LocalImageHost`] keeps attachments
    pub image_dir: PathBuf,
    /// Banner rotation step
    pub rotation_period: Duration,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            extra_profanity: Vec::new(),
            image_dir: PathBuf::from("images"),
            rotation_period: Duration::from_secs(5),
        }
    }
}
