//! Module Q&A board

use tracing::{info, warn};
use uniportal_auth::Session;
use uniportal_store::{NewQuestion, NewReply, QnaQuestion, QnaReply, QnaStore};

use crate::error::{ChatError, Result};
use crate::room::ChatContext;

/// Questions and replies for one module, acting as the signed-in user
pub struct QnaBoard {
    store: QnaStore,
    session: Session,
    module: String,
}

impl QnaBoard {
    pub fn new(ctx: &ChatContext, session: Session, module: impl Into<String>) -> Self {
        Self {
            store: ctx.qna.clone(),
            session,
            module: module.into(),
        }
    }

    pub fn scope_key(&self) -> String {
        format!("Modules_{}_qna", self.module)
    }

    pub async fn ask(&self, text: &str) -> Result<QnaQuestion> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let profile = &self.session.profile;
        Ok(self
            .store
            .add_question(NewQuestion {
                scope_key: self.scope_key(),
                author_id: profile.uid.clone(),
                author_name: profile.name.clone(),
                author_email: profile.email.clone(),
                text: text.to_string(),
            })
            .await?)
    }

    /// Newest first
    pub async fn questions(&self) -> Result<Vec<QnaQuestion>> {
        Ok(self.store.questions(&self.scope_key()).await?)
    }

    /// Returns false when this user already gave a thumbs up
    pub async fn thumbs_up_question(&self, question_id: &str) -> Result<bool> {
        self.question(question_id).await?;
        Ok(self
            .store
            .thumbs_up_question(question_id, &self.session.profile.email)
            .await?)
    }

    /// Remove one of the user's own questions along with its replies
    pub async fn delete_question(&self, question_id: &str) -> Result<()> {
        let question = self.question(question_id).await?;
        if question.author_id != self.session.uid() {
            warn!(
                "{} tried to delete question {} by {}",
                self.session.uid(),
                question_id,
                question.author_id
            );
            return Err(ChatError::Forbidden(
                "only the author can delete a question".to_string(),
            ));
        }

        self.store.delete_question(question_id).await?;
        info!("Question {} deleted from {}", question_id, self.module);
        Ok(())
    }

    pub async fn reply(&self, question_id: &str, text: &str) -> Result<QnaReply> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        self.question(question_id).await?;

        let profile = &self.session.profile;
        Ok(self
            .store
            .add_reply(NewReply {
                question_id: question_id.to_string(),
                author_id: profile.uid.clone(),
                author_name: profile.name.clone(),
                author_email: profile.email.clone(),
                text: text.to_string(),
            })
            .await?)
    }

    /// Visible replies, oldest first
    pub async fn replies(&self, question_id: &str) -> Result<Vec<QnaReply>> {
        self.question(question_id).await?;
        Ok(self
            .store
            .replies(question_id)
            .await?
            .into_iter()
            .filter(|reply| !reply.deleted)
            .collect())
    }

    pub async fn thumbs_up_reply(&self, reply_id: &str) -> Result<bool> {
        let reply = self.visible_reply(reply_id).await?;
        Ok(self
            .store
            .thumbs_up_reply(&reply.id, &self.session.profile.email)
            .await?)
    }

    /// Blank out one of the user's own replies
    pub async fn delete_reply(&self, reply_id: &str) -> Result<()> {
        let reply = self.visible_reply(reply_id).await?;
        if reply.author_id != self.session.uid() {
            return Err(ChatError::Forbidden(
                "only the author can delete a reply".to_string(),
            ));
        }

        self.store.soft_delete_reply(reply_id).await?;
        Ok(())
    }

    async fn question(&self, question_id: &str) -> Result<QnaQuestion> {
        self.store
            .question(question_id)
            .await?
            .filter(|question| question.scope_key == self.scope_key())
            .ok_or_else(|| ChatError::QuestionNotFound(question_id.to_string()))
    }

    async fn visible_reply(&self, reply_id: &str) -> Result<QnaReply> {
        let reply = self
            .store
            .reply(reply_id)
            .await?
            .filter(|reply| !reply.deleted)
            .ok_or_else(|| ChatError::ReplyNotFound(reply_id.to_string()))?;
        self.question(&reply.question_id).await?;
        Ok(reply)
    }
}
