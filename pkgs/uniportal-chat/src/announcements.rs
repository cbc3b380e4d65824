//! Announcements: expiry, search and the rotating banner

use std::fmt;
use std::str::FromStr;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, instrument};
use uniportal_store::{AnnouncementDocument, ChatMessage};

use crate::error::ChatError;

/// How long an announcement stays visible
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AnnouncementDuration {
    #[default]
    Day,
    Week,
    Month,
    Forever,
}

impl AnnouncementDuration {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnouncementDuration::Day => "24h",
            AnnouncementDuration::Week => "7d",
            AnnouncementDuration::Month => "30d",
            AnnouncementDuration::Forever => "forever",
        }
    }

    /// Expiry for an announcement posted at `now`; `None` never expires
    pub fn expiry_from(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            AnnouncementDuration::Day => Some(now + Duration::hours(24)),
            AnnouncementDuration::Week => Some(now + Duration::days(7)),
            AnnouncementDuration::Month => Some(now + Duration::days(30)),
            AnnouncementDuration::Forever => None,
        }
    }
}

impl fmt::Display for AnnouncementDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnnouncementDuration {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "24h" => Ok(AnnouncementDuration::Day),
            "7d" => Ok(AnnouncementDuration::Week),
            "30d" => Ok(AnnouncementDuration::Month),
            "forever" => Ok(AnnouncementDuration::Forever),
            other => Err(ChatError::InvalidDuration(other.to_string())),
        }
    }
}

pub fn is_active(announcement: &AnnouncementDocument, now: DateTime<Utc>) -> bool {
    announcement.expires_at.map_or(true, |expiry| expiry > now)
}

/// Announcement messages that have not expired at `now`, in list order
pub fn active(messages: &[ChatMessage], now: DateTime<Utc>) -> Vec<&ChatMessage> {
    messages
        .iter()
        .filter(|message| {
            message
                .announcement()
                .is_some_and(|announcement| is_active(announcement, now))
        })
        .collect()
}

/// Announcements whose title or body contains `query`, ignoring case
pub fn search<'a, I>(items: I, query: &str) -> Vec<&'a ChatMessage>
where
    I: IntoIterator<Item = &'a ChatMessage>,
{
    let query = query.trim().to_lowercase();
    items
        .into_iter()
        .filter(|message| match message.announcement() {
            Some(announcement) => {
                query.is_empty()
                    || announcement.title.to_lowercase().contains(&query)
                    || announcement.body.to_lowercase().contains(&query)
            }
            None => false,
        })
        .collect()
}

/// Index of the announcement currently shown in the banner
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rotation {
    len: usize,
    index: usize,
}

impl Rotation {
    pub fn new(len: usize) -> Self {
        Self { len, index: 0 }
    }

    pub fn current(&self) -> Option<usize> {
        (self.len > 0).then_some(self.index)
    }

    /// Move to the next item, wrapping at the end
    pub fn advance(&mut self) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        self.index = (self.index + 1) % self.len;
        Some(self.index)
    }

    /// Track a new set size; the index restarts when it falls off the end
    pub fn resize(&mut self, len: usize) {
        self.len = len;
        if self.index >= len {
            self.index = 0;
        }
    }
}

/// A running banner rotation; dropping it stops the timer
pub struct RotationHandle {
    index: watch::Receiver<Option<usize>>,
    len: watch::Sender<usize>,
    task: JoinHandle<()>,
}

impl RotationHandle {
    /// Receiver that sees every index change
    pub fn subscribe(&self) -> watch::Receiver<Option<usize>> {
        self.index.clone()
    }

    pub fn current(&self) -> Option<usize> {
        *self.index.borrow()
    }

    /// Tell the rotation the active set changed size
    pub fn resize(&self, len: usize) {
        self.len.send_replace(len);
    }

    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for RotationHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Shortest step between banners
pub const MIN_ROTATION_PERIOD: StdDuration = StdDuration::from_millis(1);

/// Cycle through `len` items, one step every `period`
///
/// `period` is raised to [`MIN_ROTATION_PERIOD`] if shorter.
#[instrument(level = "debug")]
pub fn spawn_rotation(len: usize, period: StdDuration) -> RotationHandle {
    let period = period.max(MIN_ROTATION_PERIOD);
    let mut rotation = Rotation::new(len);
    let (index_tx, index_rx) = watch::channel(rotation.current());
    let (len_tx, mut len_rx) = watch::channel(len);

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let index = rotation.advance();
                    debug!("Banner rotated to {:?}", index);
                    if index_tx.send(index).is_err() {
                        break;
                    }
                }
                changed = len_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let len = *len_rx.borrow_and_update();
                    rotation.resize(len);
                    index_tx.send_replace(rotation.current());
                }
            }
        }
    });

    RotationHandle {
        index: index_rx,
        len: len_tx,
        task,
    }
}
