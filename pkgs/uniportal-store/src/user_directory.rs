//! Read-only view over accounts, used to resolve mention targets and
//! appointment lecturers

use sea_orm::*;
use uniportal_auth::entities::accounts;
use uniportal_auth::{Role, UserProfile};

use crate::error::Result;

/// Which verified accounts to list; `None` fields match everything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryFilter {
    pub role: Option<Role>,
    pub faculty: Option<String>,
    pub degree_program: Option<String>,
    pub batch_number: Option<String>,
}

impl DirectoryFilter {
    pub fn staff() -> Self {
        Self {
            role: Some(Role::Staff),
            ..Default::default()
        }
    }
}

#[derive(Clone)]
pub struct UserDirectory {
    db: DatabaseConnection,
}

impl UserDirectory {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get(&self, uid: &str) -> Result<Option<UserProfile>> {
        Ok(accounts::Entity::find_by_id(uid.to_string())
            .one(&self.db)
            .await?
            .map(UserProfile::try_from)
            .transpose()?)
    }

    /// Verified accounts matching `filter`, sorted by name
    pub async fn members(&self, filter: &DirectoryFilter) -> Result<Vec<UserProfile>> {
        let mut query = accounts::Entity::find().filter(accounts::Column::EmailVerified.eq(true));

        if let Some(role) = filter.role {
            query = query.filter(accounts::Column::Role.eq(role.as_str()));
        }
        if let Some(faculty) = &filter.faculty {
            query = query.filter(accounts::Column::Faculty.eq(faculty.as_str()));
        }
        if let Some(degree) = &filter.degree_program {
            query = query.filter(accounts::Column::DegreeProgram.eq(degree.as_str()));
        }
        if let Some(batch) = &filter.batch_number {
            query = query.filter(accounts::Column::BatchNumber.eq(batch.as_str()));
        }

        let profiles = query
            .order_by_asc(accounts::Column::Name)
            .all(&self.db)
            .await?
            .into_iter()
            .map(UserProfile::try_from)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(profiles)
    }
}
