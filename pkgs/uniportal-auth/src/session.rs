//! Signed-in user state
//!
//! A [`Session`] is an explicit value handed to every service that acts on
//! behalf of a user. [`SessionFile`] keeps it between CLI invocations.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::entities::accounts;
use crate::error::{AuthError, Result};

/// Portal role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Staff,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Staff => "staff",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "staff" => Ok(Role::Staff),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// Public account details (no credentials)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    pub uid: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub faculty: String,
    pub degree_program: String,
    pub batch_number: String,
}

impl UserProfile {
    pub fn is_staff(&self) -> bool {
        self.role == Role::Staff
    }

    /// Initials shown next to the display name
    pub fn initials(&self) -> String {
        self.name
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .collect::<String>()
            .to_uppercase()
    }
}

impl TryFrom<accounts::Model> for UserProfile {
    type Error = AuthError;

    fn try_from(model: accounts::Model) -> Result<Self> {
        let role = model
            .role
            .parse::<Role>()
            .map_err(AuthError::Corrupted)?;

        Ok(Self {
            uid: model.uid,
            name: model.name,
            email: model.email,
            role,
            faculty: model.faculty,
            degree_program: model.degree_program,
            batch_number: model.batch_number,
        })
    }
}

/// A signed-in user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub profile: UserProfile,
    pub signed_in_at: DateTime<Utc>,
}

impl Session {
    pub fn new(profile: UserProfile) -> Self {
        Self {
            profile,
            signed_in_at: Utc::now(),
        }
    }

    pub fn uid(&self) -> &str {
        &self.profile.uid
    }

    pub fn name(&self) -> &str {
        &self.profile.name
    }

    pub fn is_staff(&self) -> bool {
        self.profile.is_staff()
    }
}

/// JSON file holding the last signed-in session
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist `session`, creating parent directories as needed
    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.path, json)?;
        info!("Session for {} saved to {}", session.uid(), self.path.display());
        Ok(())
    }

    /// Load the saved session, `None` when nobody is signed in
    pub fn load(&self) -> Result<Option<Session>> {
        match std::fs::read_to_string(&self.path) {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No session file at {}", self.path.display());
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Sign out; returns whether a session was present
    pub fn clear(&self) -> Result<bool> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> UserProfile {
        UserProfile {
            uid: "uid-1".to_string(),
            name: "Nimal Perera".to_string(),
            email: "nimal@students.nsbm.ac.lk".to_string(),
            role: Role::Student,
            faculty: "Computing".to_string(),
            degree_program: "Software Engineering".to_string(),
            batch_number: "21.1".to_string(),
        }
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("Staff".parse::<Role>().unwrap(), Role::Staff);
        assert_eq!(" student ".parse::<Role>().unwrap(), Role::Student);
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_initials() {
        assert_eq!(profile().initials(), "NP");
    }

    #[test]
    fn test_session_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let file = SessionFile::new(dir.path().join("nested").join("session.json"));

        assert!(file.load().unwrap().is_none());

        let session = Session::new(profile());
        file.save(&session).unwrap();
        assert_eq!(file.load().unwrap(), Some(session));

        assert!(file.clear().unwrap());
        assert!(!file.clear().unwrap());
        assert!(file.load().unwrap().is_none());
    }
}
