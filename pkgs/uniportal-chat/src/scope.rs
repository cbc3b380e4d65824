//! Chat scopes: the faculty / degree / batch / module hierarchy

use std::fmt;
use std::str::FromStr;

use nanoid::nanoid;
use serde::{Deserialize, Serialize};
use uniportal_auth::UserProfile;

use crate::error::{ChatError, Result};

const MESSAGE_ID_LENGTH: usize = 8;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ModuleChannel {
    Discussion,
    Announcements,
}

impl ModuleChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleChannel::Discussion => "discussion",
            ModuleChannel::Announcements => "announcements",
        }
    }
}

/// Academic level of a user's own chat rooms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeLevel {
    Faculty,
    Degree,
    Batch,
}

impl FromStr for ScopeLevel {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "faculty" => Ok(ScopeLevel::Faculty),
            "degree" => Ok(ScopeLevel::Degree),
            "batch" => Ok(ScopeLevel::Batch),
            other => Err(ChatError::InvalidScope(format!("unknown level '{}'", other))),
        }
    }
}

/// A chat room address
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ChatScope {
    Faculty {
        faculty: String,
    },
    Degree {
        faculty: String,
        degree: String,
    },
    Batch {
        faculty: String,
        degree: String,
        batch: String,
    },
    Module {
        module: String,
        channel: ModuleChannel,
    },
}

impl ChatScope {
    pub fn module(module: impl Into<String>, channel: ModuleChannel) -> Self {
        ChatScope::Module {
            module: module.into(),
            channel,
        }
    }

    /// The user's own faculty, degree or batch room
    pub fn for_user(profile: &UserProfile, level: ScopeLevel) -> Result<Self> {
        let require = |value: &str, what: &str| {
            let value = value.trim();
            if value.is_empty() {
                Err(ChatError::InvalidScope(format!(
                    "{} has no {} on their profile",
                    profile.name, what
                )))
            } else {
                Ok(value.to_string())
            }
        };

        let faculty = require(&profile.faculty, "faculty")?;
        Ok(match level {
            ScopeLevel::Faculty => ChatScope::Faculty { faculty },
            ScopeLevel::Degree => ChatScope::Degree {
                faculty,
                degree: require(&profile.degree_program, "degree program")?,
            },
            ScopeLevel::Batch => ChatScope::Batch {
                faculty,
                degree: require(&profile.degree_program, "degree program")?,
                batch: require(&profile.batch_number, "batch number")?,
            },
        })
    }

    /// Parse `faculty`, `degree`, `batch` or `module:<id>[:announcements]`
    /// relative to `profile`
    pub fn parse(input: &str, profile: &UserProfile) -> Result<Self> {
        let input = input.trim();
        if let Some(rest) = input.strip_prefix("module:") {
            let (module, channel) = match rest.rsplit_once(':') {
                Some((module, "announcements")) => (module, ModuleChannel::Announcements),
                Some((module, "discussion")) => (module, ModuleChannel::Discussion),
                _ => (rest, ModuleChannel::Discussion),
            };
            if module.trim().is_empty() {
                return Err(ChatError::InvalidScope(input.to_string()));
            }
            return Ok(ChatScope::module(module.trim(), channel));
        }

        Self::for_user(profile, input.parse()?)
    }

    /// Hierarchical path of the room
    pub fn segments(&self) -> Vec<&str> {
        match self {
            ChatScope::Faculty { faculty } => vec!["Faculties", faculty.as_str(), "chat"],
            ChatScope::Degree { faculty, degree } => vec![
                "Faculties",
                faculty.as_str(),
                "Degrees",
                degree.as_str(),
                "chat",
            ],
            ChatScope::Batch {
                faculty,
                degree,
                batch,
            } => vec![
                "Faculties",
                faculty.as_str(),
                "Degrees",
                degree.as_str(),
                "Batches",
                batch.as_str(),
                "chat",
            ],
            ChatScope::Module { module, channel } => {
                vec!["Modules", module.as_str(), channel.as_str()]
            }
        }
    }

    /// Storage key: the path joined with `_`
    pub fn key(&self) -> String {
        self.segments().join("_")
    }

    pub fn title(&self) -> String {
        match self {
            ChatScope::Faculty { faculty } => faculty.clone(),
            ChatScope::Degree { degree, .. } => degree.clone(),
            ChatScope::Batch { degree, batch, .. } => format!("{} - Batch {}", degree, batch),
            ChatScope::Module { module, channel } => match channel {
                ModuleChannel::Discussion => format!("{} - Discussion", module),
                ModuleChannel::Announcements => format!("{} - Announcements", module),
            },
        }
    }

    pub fn is_staff_only(&self) -> bool {
        matches!(
            self,
            ChatScope::Module {
                channel: ModuleChannel::Announcements,
                ..
            }
        )
    }

    /// A fresh message id: key initials, `_`, then a short random suffix
    pub fn new_message_id(&self) -> String {
        format!("{}_{}", key_initials(&self.key()), nanoid!(MESSAGE_ID_LENGTH))
    }
}

impl fmt::Display for ChatScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title())
    }
}

/// Upper-cased first letter of every space-separated word
pub fn key_initials(key: &str) -> String {
    key.split(' ')
        .filter_map(|word| word.chars().next())
        .collect::<String>()
        .to_uppercase()
}
