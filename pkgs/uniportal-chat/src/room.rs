//! A chat room bound to one signed-in user and one scope

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use futures::Stream;
use parking_lot::Mutex;
use sea_orm::DatabaseConnection;
use tracing::{debug, info, instrument, warn};
use uniportal_auth::{Session, UserProfile};
use uniportal_store::{
    AnnouncementDocument, ChatMessage, DirectoryFilter, LastSeenStore, MessageBody, MessageStore,
    NewChatMessage, QnaStore, ReplyRef, SnapshotHub, Subscription, UserDirectory,
};

use crate::action::{Action, ActionKind, ActionState, ActionTracker};
use crate::announcements::{self, AnnouncementDuration};
use crate::error::{ChatError, Result};
use crate::image::{ImageHost, ImageUpload, LocalImageHost};
use crate::mentions;
use crate::polls::{PollDraft, PollVoting};
use crate::profanity::ProfanityFilter;
use crate::scope::ChatScope;
use crate::ChatConfig;

/// Stores and shared services every room and board works against
#[derive(Clone)]
pub struct ChatContext {
    pub messages: MessageStore,
    pub last_seen: LastSeenStore,
    pub directory: UserDirectory,
    pub qna: QnaStore,
    pub hub: SnapshotHub<Vec<ChatMessage>>,
    pub filter: Arc<ProfanityFilter>,
    pub images: Arc<dyn ImageHost>,
}

impl ChatContext {
    pub fn new(db: DatabaseConnection, config: &ChatConfig) -> Result<Self> {
        let images = Arc::new(LocalImageHost::new(config.image_dir.clone()));
        Self::with_image_host(db, config, images)
    }

    pub fn with_image_host(
        db: DatabaseConnection,
        config: &ChatConfig,
        images: Arc<dyn ImageHost>,
    ) -> Result<Self> {
        Ok(Self {
            messages: MessageStore::new(db.clone()),
            last_seen: LastSeenStore::new(db.clone()),
            directory: UserDirectory::new(db.clone()),
            qna: QnaStore::new(db),
            hub: SnapshotHub::new(),
            filter: Arc::new(ProfanityFilter::new(config.extra_profanity.as_slice())?),
            images,
        })
    }

    pub fn room(&self, session: Session, scope: ChatScope) -> ChatRoom {
        ChatRoom::new(self.clone(), session, scope)
    }
}

/// What a viewer sees of a room at one moment
#[derive(Debug, Clone)]
pub struct RoomSnapshot {
    pub scope_key: String,
    pub title: String,
    /// Oldest first
    pub messages: Arc<Vec<ChatMessage>>,
    /// Unexpired announcements, oldest first
    pub announcements: Vec<ChatMessage>,
    pub unseen_mention: Option<ChatMessage>,
    pub unread: usize,
    pub last_seen: Option<String>,
}

impl RoomSnapshot {
    fn build(
        scope: &ChatScope,
        messages: Arc<Vec<ChatMessage>>,
        viewer: &UserProfile,
        last_seen: Option<String>,
    ) -> Self {
        let announcements = announcements::active(&messages, Utc::now())
            .into_iter()
            .cloned()
            .collect();
        let unseen_mention =
            mentions::find_unseen_mention(&messages, viewer, last_seen.as_deref()).cloned();
        let unread = mentions::unread_count(&messages, &viewer.uid, last_seen.as_deref());

        Self {
            scope_key: scope.key(),
            title: scope.title(),
            messages,
            announcements,
            unseen_mention,
            unread,
            last_seen,
        }
    }

    pub fn message(&self, id: &str) -> Option<&ChatMessage> {
        self.messages.iter().find(|message| message.id == id)
    }
}

/// Live view of a room; dropping it unsubscribes
pub struct RoomFeed {
    scope: ChatScope,
    viewer: UserProfile,
    last_seen: LastSeenStore,
    subscription: Subscription<Vec<ChatMessage>>,
}

impl RoomFeed {
    /// Wait for the next snapshot; `None` once the room is gone
    pub async fn next(&mut self) -> Option<Result<RoomSnapshot>> {
        let messages = self.subscription.next().await?;
        Some(
            self.last_seen
                .get(&self.viewer.uid, &self.scope.key())
                .await
                .map(|last_seen| RoomSnapshot::build(&self.scope, messages, &self.viewer, last_seen))
                .map_err(ChatError::from),
        )
    }

    /// The feed as a stream of snapshots
    pub fn into_stream(self) -> impl Stream<Item = Result<RoomSnapshot>> {
        futures::stream::unfold(self, |mut feed| async move {
            feed.next().await.map(|snapshot| (snapshot, feed))
        })
    }
}

pub struct ChatRoom {
    ctx: ChatContext,
    session: Session,
    scope: ChatScope,
    actions: Mutex<ActionTracker>,
}

impl ChatRoom {
    pub fn new(ctx: ChatContext, session: Session, scope: ChatScope) -> Self {
        Self {
            ctx,
            session,
            scope,
            actions: Mutex::new(ActionTracker::new()),
        }
    }

    pub fn scope(&self) -> &ChatScope {
        &self.scope
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Start listening; the first snapshot is published right away
    pub async fn subscribe(&self) -> Result<RoomFeed> {
        let subscription = self.ctx.hub.subscribe(&self.scope.key());
        self.refresh().await?;

        Ok(RoomFeed {
            scope: self.scope.clone(),
            viewer: self.session.profile.clone(),
            last_seen: self.ctx.last_seen.clone(),
            subscription,
        })
    }

    /// Current state without subscribing
    pub async fn snapshot(&self) -> Result<RoomSnapshot> {
        let key = self.scope.key();
        let messages = Arc::new(self.ctx.messages.list_scope(&key).await?);
        let last_seen = self.ctx.last_seen.get(self.session.uid(), &key).await?;
        Ok(RoomSnapshot::build(
            &self.scope,
            messages,
            &self.session.profile,
            last_seen,
        ))
    }

    /// Reload the scope and push it to every listener; returns the listener count
    pub async fn refresh(&self) -> Result<usize> {
        let key = self.scope.key();
        let messages = self.ctx.messages.list_scope(&key).await?;
        let listeners = self.ctx.hub.publish(&key, messages);
        debug!("Published {} to {} listeners", key, listeners);
        Ok(listeners)
    }

    /// People who can be @-mentioned in this room
    pub async fn members(&self) -> Result<Vec<UserProfile>> {
        let filter = match &self.scope {
            ChatScope::Faculty { faculty } => DirectoryFilter {
                faculty: Some(faculty.clone()),
                ..Default::default()
            },
            ChatScope::Degree { faculty, degree } => DirectoryFilter {
                faculty: Some(faculty.clone()),
                degree_program: Some(degree.clone()),
                ..Default::default()
            },
            ChatScope::Batch {
                faculty,
                degree,
                batch,
            } => DirectoryFilter {
                faculty: Some(faculty.clone()),
                degree_program: Some(degree.clone()),
                batch_number: Some(batch.clone()),
                ..Default::default()
            },
            ChatScope::Module { .. } => DirectoryFilter::default(),
        };
        Ok(self.ctx.directory.members(&filter).await?)
    }

    #[instrument(skip_all, fields(scope = %self.scope.key(), uid = %self.session.uid()))]
    pub async fn send_text(
        &self,
        draft: &str,
        reply_to: Option<&ChatMessage>,
        image: Option<ImageUpload>,
    ) -> Result<ChatMessage> {
        let reply_to = reply_to.map(|message| ReplyRef {
            message_id: Some(message.id.clone()),
            name: message.sender_name.clone(),
            text: message.text.clone(),
            image_url: message.image_url.clone(),
        });

        self.track(ActionKind::SendText, Some(draft.to_string()), async {
            self.ensure_can_post()?;

            let text = draft.trim();
            if text.is_empty() && image.is_none() {
                return Err(ChatError::EmptyMessage);
            }

            let image_url = match &image {
                Some(image) => Some(self.ctx.images.upload(image).await?),
                None => None,
            };

            self.store(self.ctx.filter.clean(text), MessageBody::Text, reply_to, image_url)
                .await
        })
        .await
    }

    #[instrument(skip_all, fields(scope = %self.scope.key(), uid = %self.session.uid()))]
    pub async fn send_poll(&self, draft: PollDraft) -> Result<ChatMessage> {
        let summary = draft.question.clone();
        self.track(ActionKind::SendPoll, Some(summary), async {
            self.ensure_can_post()?;
            let poll = draft.into_document()?;
            let text = self.ctx.filter.clean(&poll.question);
            self.store(text, MessageBody::Poll(poll), None, None).await
        })
        .await
    }

    #[instrument(skip_all, fields(scope = %self.scope.key(), uid = %self.session.uid()))]
    pub async fn send_announcement(
        &self,
        title: &str,
        body: &str,
        duration: AnnouncementDuration,
    ) -> Result<ChatMessage> {
        self.track(ActionKind::SendAnnouncement, Some(body.to_string()), async {
            self.ensure_can_post()?;

            let (title, body) = (title.trim(), body.trim());
            if title.is_empty() || body.is_empty() {
                return Err(ChatError::EmptyMessage);
            }

            let announcement = AnnouncementDocument {
                title: self.ctx.filter.clean(title),
                body: self.ctx.filter.clean(body),
                expires_at: duration.expiry_from(Utc::now()),
            };
            let text = announcement.title.clone();
            self.store(text, MessageBody::Announcement(announcement), None, None)
                .await
        })
        .await
    }

    /// Remove one of the signed-in user's own messages
    pub async fn delete(&self, message_id: &str) -> Result<()> {
        self.track(ActionKind::Delete, None, async {
            let message = self
                .ctx
                .messages
                .get(message_id)
                .await?
                .filter(|message| message.scope_key == self.scope.key())
                .ok_or_else(|| ChatError::MessageNotFound(message_id.to_string()))?;

            if message.sender_id != self.session.uid() {
                warn!(
                    "{} tried to delete {} sent by {}",
                    self.session.uid(),
                    message_id,
                    message.sender_id
                );
                return Err(ChatError::Forbidden(
                    "only the sender can delete a message".to_string(),
                ));
            }

            self.ctx.messages.delete(message_id).await?;
            info!("Message {} deleted from {}", message_id, self.scope.key());
            self.refresh().await?;
            Ok(())
        })
        .await
    }

    /// Flip the signed-in user's reaction; returns whether it is now set
    pub async fn toggle_reaction(&self, message_id: &str) -> Result<bool> {
        let uid = self.session.uid().to_string();
        self.track(ActionKind::React, None, async {
            let (_, reacted) = self
                .ctx
                .messages
                .update_message(message_id, |message| {
                    self.ensure_in_scope(message)?;
                    if message.reacted_by(&uid) {
                        message.reactions.remove(&uid);
                        Ok::<_, ChatError>(false)
                    } else {
                        message.reactions.insert(uid.clone(), true);
                        Ok(true)
                    }
                })
                .await?;

            self.refresh().await?;
            Ok(reacted)
        })
        .await
    }

    /// Cast the signed-in user's vote; returns their resulting choices
    pub async fn vote(&self, message_id: &str, option: usize) -> Result<Vec<usize>> {
        let uid = self.session.uid().to_string();
        self.track(ActionKind::Vote, None, async {
            let (_, choices) = self
                .ctx
                .messages
                .update_message(message_id, |message| {
                    self.ensure_in_scope(message)?;
                    match &mut message.body {
                        MessageBody::Poll(poll) => poll.cast(&uid, option),
                        _ => Err(ChatError::NotAPoll(message.id.clone())),
                    }
                })
                .await?;

            debug!("{} voted {:?} on {}", uid, choices, message_id);
            self.refresh().await?;
            Ok(choices)
        })
        .await
    }

    /// Acknowledge everything currently in the room
    pub async fn mark_seen(&self) -> Result<Option<String>> {
        self.track(ActionKind::MarkSeen, None, async {
            let key = self.scope.key();
            let messages = self.ctx.messages.list_scope(&key).await?;
            let Some(last) = messages.last() else {
                return Ok(None);
            };

            self.ctx
                .last_seen
                .mark(self.session.uid(), &key, &last.id)
                .await?;
            let last_id = last.id.clone();
            self.ctx.hub.publish(&key, messages);
            Ok(Some(last_id))
        })
        .await
    }

    /// Actions that have not committed, including failed ones
    pub fn actions(&self) -> Vec<Action> {
        let tracker = self.actions.lock();
        tracker
            .pending()
            .into_iter()
            .chain(tracker.failed())
            .cloned()
            .collect()
    }

    pub fn action_state(&self, id: u64) -> ActionState {
        self.actions.lock().state(id)
    }

    /// Draft of a failed send, for retrying
    pub fn take_failed_draft(&self, id: u64) -> Option<String> {
        self.actions.lock().take_draft(id)
    }

    fn ensure_can_post(&self) -> Result<()> {
        if self.scope.is_staff_only() && !self.session.is_staff() {
            return Err(ChatError::StaffOnly(self.scope.title()));
        }
        Ok(())
    }

    fn ensure_in_scope(&self, message: &ChatMessage) -> Result<()> {
        if message.scope_key != self.scope.key() {
            return Err(ChatError::MessageNotFound(message.id.clone()));
        }
        Ok(())
    }

    async fn store(
        &self,
        text: String,
        body: MessageBody,
        reply_to: Option<ReplyRef>,
        image_url: Option<String>,
    ) -> Result<ChatMessage> {
        let key = self.scope.key();
        let message = self
            .ctx
            .messages
            .insert(NewChatMessage {
                id: self.scope.new_message_id(),
                scope_key: key.clone(),
                sender_id: self.session.uid().to_string(),
                sender_name: self.session.name().to_string(),
                text,
                body,
                reply_to,
                image_url,
            })
            .await?;

        info!("{} message {} sent to {}", message.body.kind(), message.id, key);

        // Committed: the sender's own marker and the refresh only log on failure
        if let Err(e) = self
            .ctx
            .last_seen
            .mark(self.session.uid(), &key, &message.id)
            .await
        {
            warn!("Failed to mark {} as seen in {}: {}", message.id, key, e);
        }
        if let Err(e) = self.refresh().await {
            warn!("Failed to refresh {} after sending {}: {}", key, message.id, e);
        }
        Ok(message)
    }

    async fn track<T, F>(&self, kind: ActionKind, draft: Option<String>, action: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let id = self.actions.lock().begin(kind, draft);
        match action.await {
            Ok(value) => {
                self.actions.lock().commit(id);
                Ok(value)
            }
            Err(e) => {
                warn!("{:?} failed: {}", kind, e);
                self.actions.lock().fail(id, e.to_string());
                Err(e)
            }
        }
    }
}
