//! Document shapes kept in the store
//!
//! These are plain data. Behaviour such as vote merging or expiry checks
//! lives with the services that own it; the store only persists and
//! reloads these values.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Quoted message attached to a reply
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReplyRef {
    pub message_id: Option<String>,
    pub name: String,
    pub text: String,
    pub image_url: Option<String>,
}

/// A voter's choice: one option index, or a set of them for multi-select polls
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum VoteValue {
    One(usize),
    Many(Vec<usize>),
}

impl VoteValue {
    pub fn contains(&self, option: usize) -> bool {
        match self {
            VoteValue::One(index) => *index == option,
            VoteValue::Many(indices) => indices.contains(&option),
        }
    }

    pub fn options(&self) -> Vec<usize> {
        match self {
            VoteValue::One(index) => vec![*index],
            VoteValue::Many(indices) => indices.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PollDocument {
    pub question: String,
    pub options: Vec<String>,
    pub allow_multiple: bool,
    /// Voter uid to choice
    #[serde(default)]
    pub votes: BTreeMap<String, VoteValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnnouncementDocument {
    pub title: String,
    pub body: String,
    /// `None` never expires
    pub expires_at: Option<DateTime<Utc>>,
}

/// Kind-specific payload of a chat message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MessageBody {
    Text,
    Poll(PollDocument),
    Announcement(AnnouncementDocument),
}

impl MessageBody {
    pub fn kind(&self) -> &'static str {
        match self {
            MessageBody::Text => "text",
            MessageBody::Poll(_) => "poll",
            MessageBody::Announcement(_) => "announcement",
        }
    }
}

/// A message before the store assigns its timestamp and sequence number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChatMessage {
    pub id: String,
    pub scope_key: String,
    pub sender_id: String,
    pub sender_name: String,
    pub text: String,
    pub body: MessageBody,
    pub reply_to: Option<ReplyRef>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: String,
    pub scope_key: String,
    pub sender_id: String,
    pub sender_name: String,
    pub text: String,
    pub body: MessageBody,
    pub reply_to: Option<ReplyRef>,
    pub image_url: Option<String>,
    /// Reactor uid to flag; un-reacting removes the entry
    pub reactions: BTreeMap<String, bool>,
    pub sent_at: DateTime<Utc>,
    /// Per-scope insertion order, breaks timestamp ties
    pub seq: i64,
}

impl ChatMessage {
    pub fn poll(&self) -> Option<&PollDocument> {
        match &self.body {
            MessageBody::Poll(poll) => Some(poll),
            _ => None,
        }
    }

    pub fn announcement(&self) -> Option<&AnnouncementDocument> {
        match &self.body {
            MessageBody::Announcement(announcement) => Some(announcement),
            _ => None,
        }
    }

    pub fn reaction_count(&self) -> usize {
        self.reactions.values().filter(|reacted| **reacted).count()
    }

    pub fn reacted_by(&self, uid: &str) -> bool {
        self.reactions.get(uid).copied().unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AppointmentStatus {
    Pending,
    Approved,
    Rejected,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "Pending",
            AppointmentStatus::Approved => "Approved",
            AppointmentStatus::Rejected => "Rejected",
        }
    }

    pub fn is_decided(&self) -> bool {
        *self != AppointmentStatus::Pending
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(AppointmentStatus::Pending),
            "Approved" => Ok(AppointmentStatus::Approved),
            "Rejected" => Ok(AppointmentStatus::Rejected),
            other => Err(format!("unknown appointment status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAppointment {
    pub student_id: String,
    pub student_name: String,
    pub student_email: String,
    pub lecturer_id: String,
    pub lecturer_name: String,
    pub lecturer_email: String,
    pub module: String,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`
    pub time: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Appointment {
    pub id: String,
    pub student_id: String,
    pub student_name: String,
    pub student_email: String,
    pub lecturer_id: String,
    pub lecturer_name: String,
    pub lecturer_email: String,
    pub module: String,
    pub date: String,
    pub time: String,
    pub reason: String,
    pub status: AppointmentStatus,
    pub reply: Option<String>,
    pub student_viewed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuestion {
    pub scope_key: String,
    pub author_id: String,
    pub author_name: String,
    pub author_email: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QnaQuestion {
    pub id: String,
    pub scope_key: String,
    pub author_id: String,
    pub author_name: String,
    pub author_email: String,
    pub text: String,
    /// Emails that gave a thumbs up, each at most once
    pub thumbs_up_by: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl QnaQuestion {
    pub fn thumbs_up(&self) -> usize {
        self.thumbs_up_by.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReply {
    pub question_id: String,
    pub author_id: String,
    pub author_name: String,
    pub author_email: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QnaReply {
    pub id: String,
    pub question_id: String,
    pub author_id: String,
    pub author_name: String,
    pub author_email: String,
    pub text: String,
    pub thumbs_up_by: Vec<String>,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
}

impl QnaReply {
    pub fn thumbs_up(&self) -> usize {
        self.thumbs_up_by.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vote_value_wire_shape() {
        assert_eq!(serde_json::to_string(&VoteValue::One(2)).unwrap(), "2");
        assert_eq!(
            serde_json::from_str::<VoteValue>("[0,3]").unwrap(),
            VoteValue::Many(vec![0, 3])
        );
    }

    #[test]
    fn test_body_is_tagged_by_kind() {
        let json = serde_json::to_value(MessageBody::Poll(PollDocument {
            question: "Lunch?".to_string(),
            options: vec!["Rice".to_string(), "Kottu".to_string()],
            allow_multiple: false,
            votes: BTreeMap::new(),
        }))
        .unwrap();

        assert_eq!(json["kind"], "poll");
        assert_eq!(
            serde_json::from_str::<MessageBody>(r#"{"kind":"text"}"#).unwrap(),
            MessageBody::Text
        );
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(
            "Approved".parse::<AppointmentStatus>().unwrap(),
            AppointmentStatus::Approved
        );
        assert!("approved".parse::<AppointmentStatus>().is_err());
        assert!(!AppointmentStatus::Pending.is_decided());
    }
}
