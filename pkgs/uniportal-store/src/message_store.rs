//! Message store - chat messages grouped by scope key

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use sea_orm::*;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::documents::{ChatMessage, MessageBody, NewChatMessage, ReplyRef};
use crate::entities::chat_messages;
use crate::error::{Result, StoreError};

/// Message store
///
/// Writes go through a shared lock so that read-modify-write updates (votes,
/// reactions) from concurrent callers are applied one after another instead
/// of overwriting each other.
#[derive(Clone)]
pub struct MessageStore {
    db: DatabaseConnection,
    write_lock: Arc<Mutex<()>>,
}

impl MessageStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Append a message to its scope
    ///
    /// The store assigns `sent_at` and `seq`. Timestamps never run backwards
    /// within a scope, so ascending order by time is also insertion order.
    pub async fn insert(&self, message: NewChatMessage) -> Result<ChatMessage> {
        let _guard = self.write_lock.lock().await;
        let txn = self.db.begin().await?;

        let last = chat_messages::Entity::find()
            .filter(chat_messages::Column::ScopeKey.eq(&message.scope_key))
            .order_by_desc(chat_messages::Column::Seq)
            .one(&txn)
            .await?;

        let now = Utc::now().timestamp_millis();
        let (seq, sent_at) = match &last {
            Some(last) => (last.seq + 1, now.max(last.sent_at)),
            None => (1, now),
        };

        let reply_json = message
            .reply_to
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let model = chat_messages::ActiveModel {
            id: Set(message.id.clone()),
            scope_key: Set(message.scope_key.clone()),
            seq: Set(seq),
            sender_id: Set(message.sender_id),
            sender_name: Set(message.sender_name),
            kind: Set(message.body.kind().to_string()),
            text: Set(message.text),
            body_json: Set(serde_json::to_string(&message.body)?),
            reply_json: Set(reply_json),
            image_url: Set(message.image_url),
            reactions_json: Set("{}".to_string()),
            sent_at: Set(sent_at),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        debug!(
            "Stored {} message {} in {} (seq {})",
            model.kind, model.id, model.scope_key, seq
        );
        model_to_message(model)
    }

    pub async fn get(&self, id: &str) -> Result<Option<ChatMessage>> {
        chat_messages::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await?
            .map(model_to_message)
            .transpose()
    }

    /// All messages in a scope, oldest first
    pub async fn list_scope(&self, scope_key: &str) -> Result<Vec<ChatMessage>> {
        chat_messages::Entity::find()
            .filter(chat_messages::Column::ScopeKey.eq(scope_key))
            .order_by_asc(chat_messages::Column::SentAt)
            .order_by_asc(chat_messages::Column::Seq)
            .all(&self.db)
            .await?
            .into_iter()
            .map(model_to_message)
            .collect()
    }

    pub async fn count_scope(&self, scope_key: &str) -> Result<u64> {
        Ok(chat_messages::Entity::find()
            .filter(chat_messages::Column::ScopeKey.eq(scope_key))
            .count(&self.db)
            .await?)
    }

    /// Remove a message; returns whether it existed
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let result = chat_messages::Entity::delete_by_id(id.to_string())
            .exec(&self.db)
            .await?;

        if result.rows_affected > 0 {
            info!("Deleted message {}", id);
        }
        Ok(result.rows_affected > 0)
    }

    /// Read, modify and write back one message inside a transaction
    ///
    /// Only the body and reactions are written back; identity fields changed
    /// by `apply` are ignored. If `apply` fails nothing is written.
    pub async fn update_message<F, T, E>(
        &self,
        id: &str,
        apply: F,
    ) -> std::result::Result<(ChatMessage, T), E>
    where
        F: FnOnce(&mut ChatMessage) -> std::result::Result<T, E>,
        E: From<StoreError>,
    {
        let _guard = self.write_lock.lock().await;
        let txn = self.db.begin().await.map_err(db_err::<E>)?;

        let model = chat_messages::Entity::find_by_id(id.to_string())
            .one(&txn)
            .await
            .map_err(db_err::<E>)?
            .ok_or_else(|| E::from(StoreError::NotFound(id.to_string())))?;

        let mut message = model_to_message(model.clone()).map_err(E::from)?;
        let output = apply(&mut message)?;

        let body_json = serde_json::to_string(&message.body)
            .map_err(|e| E::from(StoreError::from(e)))?;
        let reactions_json = serde_json::to_string(&message.reactions)
            .map_err(|e| E::from(StoreError::from(e)))?;

        let mut active: chat_messages::ActiveModel = model.into();
        active.kind = Set(message.body.kind().to_string());
        active.body_json = Set(body_json);
        active.reactions_json = Set(reactions_json);
        let updated = active.update(&txn).await.map_err(db_err::<E>)?;

        txn.commit().await.map_err(db_err::<E>)?;

        let message = model_to_message(updated).map_err(E::from)?;
        Ok((message, output))
    }
}

fn db_err<E: From<StoreError>>(err: DbErr) -> E {
    E::from(StoreError::Database(err))
}

pub(crate) fn datetime_from_millis(id: &str, millis: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| StoreError::Corrupted {
            id: id.to_string(),
            reason: format!("timestamp {} out of range", millis),
        })
}

fn model_to_message(model: chat_messages::Model) -> Result<ChatMessage> {
    let body: MessageBody = serde_json::from_str(&model.body_json)?;
    let reply_to: Option<ReplyRef> = model
        .reply_json
        .as_deref()
        .map(serde_json::from_str)
        .transpose()?;
    let reactions: BTreeMap<String, bool> = serde_json::from_str(&model.reactions_json)?;
    let sent_at = datetime_from_millis(&model.id, model.sent_at)?;

    Ok(ChatMessage {
        id: model.id,
        scope_key: model.scope_key,
        sender_id: model.sender_id,
        sender_name: model.sender_name,
        text: model.text,
        body,
        reply_to,
        image_url: model.image_url,
        reactions,
        sent_at,
        seq: model.seq,
    })
}
