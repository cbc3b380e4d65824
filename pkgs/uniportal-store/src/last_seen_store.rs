//! Last-seen markers: the newest message id each user has looked at per scope

use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use tracing::debug;

use crate::entities::last_seen;
use crate::error::Result;

#[derive(Clone)]
pub struct LastSeenStore {
    db: DatabaseConnection,
}

impl LastSeenStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get(&self, user_id: &str, scope_key: &str) -> Result<Option<String>> {
        Ok(
            last_seen::Entity::find_by_id((user_id.to_string(), scope_key.to_string()))
                .one(&self.db)
                .await?
                .map(|model| model.message_id),
        )
    }

    /// Point the user's marker for `scope_key` at `message_id`
    pub async fn mark(&self, user_id: &str, scope_key: &str, message_id: &str) -> Result<()> {
        last_seen::Entity::insert(last_seen::ActiveModel {
            user_id: Set(user_id.to_string()),
            scope_key: Set(scope_key.to_string()),
            message_id: Set(message_id.to_string()),
            updated_at: Set(Utc::now().timestamp_millis()),
        })
        .on_conflict(
            OnConflict::columns([last_seen::Column::UserId, last_seen::Column::ScopeKey])
                .update_columns([last_seen::Column::MessageId, last_seen::Column::UpdatedAt])
                .to_owned(),
        )
        .exec_without_returning(&self.db)
        .await?;

        debug!("{} has seen {} in {}", user_id, message_id, scope_key);
        Ok(())
    }

    /// Every scope the user has a marker in, as `(scope_key, message_id)`
    pub async fn for_user(&self, user_id: &str) -> Result<Vec<(String, String)>> {
        Ok(last_seen::Entity::find()
            .filter(last_seen::Column::UserId.eq(user_id))
            .order_by_asc(last_seen::Column::ScopeKey)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|model| (model.scope_key, model.message_id))
            .collect())
    }
}
