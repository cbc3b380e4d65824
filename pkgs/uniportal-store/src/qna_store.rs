//! Q&A store - questions per scope and their replies

use std::sync::Arc;

use chrono::Utc;
use sea_orm::*;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::documents::{NewQuestion, NewReply, QnaQuestion, QnaReply};
use crate::entities::{qna_questions, qna_replies};
use crate::error::{Result, StoreError};
use crate::message_store::datetime_from_millis;

/// Text left behind by a soft-deleted reply
pub const DELETED_PLACEHOLDER: &str = "[Deleted]";

#[derive(Clone)]
pub struct QnaStore {
    db: DatabaseConnection,
    write_lock: Arc<Mutex<()>>,
}

impl QnaStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn add_question(&self, question: NewQuestion) -> Result<QnaQuestion> {
        let model = qna_questions::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            scope_key: Set(question.scope_key),
            author_id: Set(question.author_id),
            author_name: Set(question.author_name),
            author_email: Set(question.author_email),
            text: Set(question.text),
            thumbs_up_json: Set("[]".to_string()),
            created_at: Set(Utc::now().timestamp_millis()),
        }
        .insert(&self.db)
        .await?;

        info!("Question {} posted in {}", model.id, model.scope_key);
        question_from_model(model)
    }

    pub async fn question(&self, id: &str) -> Result<Option<QnaQuestion>> {
        qna_questions::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await?
            .map(question_from_model)
            .transpose()
    }

    /// Questions in a scope, newest first
    pub async fn questions(&self, scope_key: &str) -> Result<Vec<QnaQuestion>> {
        qna_questions::Entity::find()
            .filter(qna_questions::Column::ScopeKey.eq(scope_key))
            .order_by_desc(qna_questions::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(question_from_model)
            .collect()
    }

    /// Add `email` to the question's thumbs up; false if it was already there
    pub async fn thumbs_up_question(&self, id: &str, email: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let model = qna_questions::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let mut voters: Vec<String> = serde_json::from_str(&model.thumbs_up_json)?;
        if voters.iter().any(|voter| voter == email) {
            return Ok(false);
        }
        voters.push(email.to_string());

        let mut active: qna_questions::ActiveModel = model.into();
        active.thumbs_up_json = Set(serde_json::to_string(&voters)?);
        active.update(&self.db).await?;

        debug!("Thumbs up on question {} from {}", id, email);
        Ok(true)
    }

    /// Remove a question and every reply under it
    pub async fn delete_question(&self, id: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let txn = self.db.begin().await?;

        let replies = qna_replies::Entity::delete_many()
            .filter(qna_replies::Column::QuestionId.eq(id))
            .exec(&txn)
            .await?;
        let question = qna_questions::Entity::delete_by_id(id.to_string())
            .exec(&txn)
            .await?;

        txn.commit().await?;

        if question.rows_affected > 0 {
            info!(
                "Deleted question {} with {} replies",
                id, replies.rows_affected
            );
        }
        Ok(question.rows_affected > 0)
    }

    pub async fn add_reply(&self, reply: NewReply) -> Result<QnaReply> {
        if self.question(&reply.question_id).await?.is_none() {
            return Err(StoreError::NotFound(reply.question_id));
        }

        let model = qna_replies::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            question_id: Set(reply.question_id),
            author_id: Set(reply.author_id),
            author_name: Set(reply.author_name),
            author_email: Set(reply.author_email),
            text: Set(reply.text),
            thumbs_up_json: Set("[]".to_string()),
            deleted: Set(false),
            created_at: Set(Utc::now().timestamp_millis()),
        }
        .insert(&self.db)
        .await?;

        debug!("Reply {} added to question {}", model.id, model.question_id);
        reply_from_model(model)
    }

    pub async fn reply(&self, id: &str) -> Result<Option<QnaReply>> {
        qna_replies::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await?
            .map(reply_from_model)
            .transpose()
    }

    /// Replies to a question, oldest first, including soft-deleted ones
    pub async fn replies(&self, question_id: &str) -> Result<Vec<QnaReply>> {
        qna_replies::Entity::find()
            .filter(qna_replies::Column::QuestionId.eq(question_id))
            .order_by_asc(qna_replies::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(reply_from_model)
            .collect()
    }

    pub async fn thumbs_up_reply(&self, id: &str, email: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let model = qna_replies::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let mut voters: Vec<String> = serde_json::from_str(&model.thumbs_up_json)?;
        if voters.iter().any(|voter| voter == email) {
            return Ok(false);
        }
        voters.push(email.to_string());

        let mut active: qna_replies::ActiveModel = model.into();
        active.thumbs_up_json = Set(serde_json::to_string(&voters)?);
        active.update(&self.db).await?;
        Ok(true)
    }

    /// Blank out a reply but keep its place in the thread
    pub async fn soft_delete_reply(&self, id: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let Some(model) = qna_replies::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await?
        else {
            return Ok(false);
        };

        let mut active: qna_replies::ActiveModel = model.into();
        active.text = Set(DELETED_PLACEHOLDER.to_string());
        active.author_name = Set(DELETED_PLACEHOLDER.to_string());
        active.deleted = Set(true);
        active.update(&self.db).await?;

        info!("Reply {} deleted", id);
        Ok(true)
    }
}

fn question_from_model(model: qna_questions::Model) -> Result<QnaQuestion> {
    let thumbs_up_by = serde_json::from_str(&model.thumbs_up_json)?;
    let created_at = datetime_from_millis(&model.id, model.created_at)?;

    Ok(QnaQuestion {
        id: model.id,
        scope_key: model.scope_key,
        author_id: model.author_id,
        author_name: model.author_name,
        author_email: model.author_email,
        text: model.text,
        thumbs_up_by,
        created_at,
    })
}

fn reply_from_model(model: qna_replies::Model) -> Result<QnaReply> {
    let thumbs_up_by = serde_json::from_str(&model.thumbs_up_json)?;
    let created_at = datetime_from_millis(&model.id, model.created_at)?;

    Ok(QnaReply {
        id: model.id,
        question_id: model.question_id,
        author_id: model.author_id,
        author_name: model.author_name,
        author_email: model.author_email,
        text: model.text,
        thumbs_up_by,
        deleted: model.deleted,
        created_at,
    })
}
