// Tests for ChatRoom: sending, feeds, votes and permissions

use tempfile::{NamedTempFile, TempDir};
use uniportal_auth::{Role, Session, UserProfile};
use uniportal_chat::{
    ActionKind, ActionState, AnnouncementDuration, ChatConfig, ChatContext, ChatError, ChatRoom,
    ChatScope, ImageUpload, ModuleChannel, PollDraft, PollVoting, ScopeLevel,
};
use uniportal_store::{connect, StoreConfig, VoteValue};

struct Fixture {
    ctx: ChatContext,
    _db_file: NamedTempFile,
    _image_dir: TempDir,
}

async fn fixture() -> Fixture {
    let db_file = NamedTempFile::new().unwrap();
    let image_dir = TempDir::new().unwrap();
    let db = connect(&StoreConfig {
        db_path: db_file.path().to_path_buf(),
        ..Default::default()
    })
    .await
    .expect("Failed to open store");

    let config = ChatConfig {
        image_dir: image_dir.path().to_path_buf(),
        ..Default::default()
    };
    let ctx = ChatContext::new(db, &config).expect("Failed to build chat context");

    Fixture {
        ctx,
        _db_file: db_file,
        _image_dir: image_dir,
    }
}

fn session(uid: &str, name: &str, role: Role) -> Session {
    Session::new(UserProfile {
        uid: uid.to_string(),
        name: name.to_string(),
        email: format!("{}@students.nsbm.ac.lk", uid),
        role,
        faculty: "Computing".to_string(),
        degree_program: "Computer Science".to_string(),
        batch_number: "23.1".to_string(),
    })
}

fn batch_room(ctx: &ChatContext, uid: &str, name: &str) -> ChatRoom {
    let session = session(uid, name, Role::Student);
    let scope = ChatScope::for_user(&session.profile, ScopeLevel::Batch).unwrap();
    ctx.room(session, scope)
}

#[tokio::test]
async fn test_send_masks_and_marks_sender_seen() {
    let f = fixture().await;
    let amaya = batch_room(&f.ctx, "amaya", "Amaya");
    let kasun = batch_room(&f.ctx, "kasun", "Kasun");

    let sent = amaya
        .send_text("  this lab is SHIT  ", None, None)
        .await
        .unwrap();
    assert_eq!(sent.text, "this lab is ****");
    assert!(sent.id.starts_with("FS_"));

    let own = amaya.snapshot().await.unwrap();
    assert_eq!(own.last_seen.as_deref(), Some(sent.id.as_str()));
    assert_eq!(own.unread, 0);

    let other = kasun.snapshot().await.unwrap();
    assert_eq!(other.messages.len(), 1);
    assert_eq!(other.unread, 1);
}

#[tokio::test]
async fn test_blank_send_fails_and_keeps_draft() {
    let f = fixture().await;
    let amaya = batch_room(&f.ctx, "amaya", "Amaya");

    let result = amaya.send_text("   ", None, None).await;
    assert!(matches!(result, Err(ChatError::EmptyMessage)));

    let actions = amaya.actions();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].kind, ActionKind::SendText);
    assert!(matches!(actions[0].state, ActionState::Failed { .. }));
    assert_eq!(amaya.action_state(actions[0].id), actions[0].state);
    assert_eq!(amaya.take_failed_draft(actions[0].id), Some("   ".to_string()));
    assert!(amaya.snapshot().await.unwrap().messages.is_empty());
}

#[tokio::test]
async fn test_reply_and_image_attachment() {
    let f = fixture().await;
    let amaya = batch_room(&f.ctx, "amaya", "Amaya");
    let kasun = batch_room(&f.ctx, "kasun", "Kasun");

    let original = amaya
        .send_text("", None, Some(ImageUpload::new("notes.png", vec![1, 2, 3])))
        .await
        .unwrap();
    assert!(original.image_url.as_deref().unwrap().starts_with("file://"));

    let reply = kasun
        .send_text("thanks!", Some(&original), None)
        .await
        .unwrap();
    let quoted = reply.reply_to.unwrap();
    assert_eq!(quoted.name, "Amaya");
    assert_eq!(quoted.image_url, original.image_url);

    let rejected = kasun
        .send_text("", None, Some(ImageUpload::new("notes.pdf", vec![1])))
        .await;
    assert!(matches!(rejected, Err(ChatError::InvalidImage(_))));
}

#[tokio::test]
async fn test_staff_only_announcements() {
    let f = fixture().await;
    let scope = ChatScope::module("CS101", ModuleChannel::Announcements);
    let student = f
        .ctx
        .room(session("amaya", "Amaya", Role::Student), scope.clone());
    let lecturer = f
        .ctx
        .room(session("perera", "Dr. Perera", Role::Staff), scope);

    let denied = student
        .send_announcement("Exam", "Moved to Friday", AnnouncementDuration::Day)
        .await;
    assert!(matches!(denied, Err(ChatError::StaffOnly(_))));
    let denied_text = student.send_text("hello", None, None).await;
    assert!(matches!(denied_text, Err(ChatError::StaffOnly(_))));

    let posted = lecturer
        .send_announcement("Exam", "Moved to Friday", AnnouncementDuration::Week)
        .await
        .unwrap();
    assert!(posted.announcement().unwrap().expires_at.is_some());

    let snapshot = student.snapshot().await.unwrap();
    assert_eq!(snapshot.announcements.len(), 1);
    assert_eq!(snapshot.announcements[0].id, posted.id);
}

#[tokio::test]
async fn test_only_sender_can_delete() {
    let f = fixture().await;
    let amaya = batch_room(&f.ctx, "amaya", "Amaya");
    let kasun = batch_room(&f.ctx, "kasun", "Kasun");

    let sent = amaya.send_text("oops", None, None).await.unwrap();

    let refused = kasun.delete(&sent.id).await;
    assert!(matches!(refused, Err(ChatError::Forbidden(_))));

    amaya.delete(&sent.id).await.unwrap();
    assert!(amaya.snapshot().await.unwrap().messages.is_empty());
    assert!(matches!(
        amaya.delete(&sent.id).await,
        Err(ChatError::MessageNotFound(_))
    ));
}

#[tokio::test]
async fn test_concurrent_votes_both_survive() {
    let f = fixture().await;
    let amaya = batch_room(&f.ctx, "amaya", "Amaya");
    let kasun = batch_room(&f.ctx, "kasun", "Kasun");

    let poll = amaya
        .send_poll(PollDraft {
            question: "Study group day?".to_string(),
            options: vec!["Saturday".to_string(), "Sunday".to_string()],
            allow_multiple: false,
        })
        .await
        .unwrap();

    let (a, k) = tokio::join!(amaya.vote(&poll.id, 0), kasun.vote(&poll.id, 1));
    assert_eq!(a.unwrap(), vec![0]);
    assert_eq!(k.unwrap(), vec![1]);

    let snapshot = amaya.snapshot().await.unwrap();
    let stored = snapshot.message(&poll.id).unwrap().poll().unwrap();
    assert_eq!(stored.votes.get("amaya"), Some(&VoteValue::One(0)));
    assert_eq!(stored.votes.get("kasun"), Some(&VoteValue::One(1)));
    assert_eq!(stored.tally()[0].percent, 50.0);

    let not_poll = amaya.send_text("plain", None, None).await.unwrap();
    assert!(matches!(
        amaya.vote(&not_poll.id, 0).await,
        Err(ChatError::NotAPoll(_))
    ));
    assert!(matches!(
        amaya.vote(&poll.id, 5).await,
        Err(ChatError::OptionOutOfRange { .. })
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_busy_room_keeps_every_write() {
    let f = fixture().await;
    let amaya = batch_room(&f.ctx, "amaya", "Amaya");
    let poll = amaya
        .send_poll(PollDraft {
            question: "Lab slot?".to_string(),
            options: vec!["Morning".to_string(), "Evening".to_string()],
            allow_multiple: false,
        })
        .await
        .unwrap();

    let rooms: Vec<_> = (0..12)
        .map(|i| batch_room(&f.ctx, &format!("student-{}", i), &format!("Student {}", i)))
        .collect();
    let results = futures::future::join_all(rooms.iter().enumerate().map(|(i, room)| {
        let poll_id = poll.id.clone();
        async move {
            let text = format!("message {}", i);
            let (vote, sent, seen) = tokio::join!(
                room.vote(&poll_id, i % 2),
                room.send_text(&text, None, None),
                room.mark_seen(),
            );
            vote.map(|_| ())
                .and(sent.map(|_| ()))
                .and(seen.map(|_| ()))
        }
    }))
    .await;
    for result in results {
        result.unwrap();
    }

    let snapshot = amaya.snapshot().await.unwrap();
    assert_eq!(snapshot.messages.len(), 13);
    let stored = snapshot.message(&poll.id).unwrap().poll().unwrap();
    assert_eq!(stored.votes.len(), 12);
    for room in &rooms {
        assert!(room.actions().is_empty());
    }
}

#[tokio::test]
async fn test_invalid_poll_rejected() {
    let f = fixture().await;
    let amaya = batch_room(&f.ctx, "amaya", "Amaya");

    let result = amaya
        .send_poll(PollDraft {
            question: "Only one?".to_string(),
            options: vec!["Yes".to_string()],
            allow_multiple: true,
        })
        .await;

    assert!(matches!(result, Err(ChatError::InvalidPoll(_))));
}

#[tokio::test]
async fn test_toggle_reaction() {
    let f = fixture().await;
    let amaya = batch_room(&f.ctx, "amaya", "Amaya");
    let kasun = batch_room(&f.ctx, "kasun", "Kasun");
    let sent = amaya.send_text("good luck everyone", None, None).await.unwrap();

    assert!(kasun.toggle_reaction(&sent.id).await.unwrap());
    assert!(amaya.toggle_reaction(&sent.id).await.unwrap());
    assert!(!kasun.toggle_reaction(&sent.id).await.unwrap());

    let snapshot = amaya.snapshot().await.unwrap();
    let message = snapshot.message(&sent.id).unwrap();
    assert_eq!(message.reaction_count(), 1);
    assert!(message.reacted_by("amaya"));
}

#[tokio::test]
async fn test_feed_reports_mentions_until_seen() {
    let f = fixture().await;
    let amaya = batch_room(&f.ctx, "amaya", "Amaya");
    let kasun = batch_room(&f.ctx, "kasun", "Kasun");

    amaya.send_text("morning all", None, None).await.unwrap();

    let mut feed = amaya.subscribe().await.unwrap();
    let first = feed.next().await.unwrap().unwrap();
    assert_eq!(first.messages.len(), 1);
    assert!(first.unseen_mention.is_none());

    let ping = kasun.send_text("@Amaya are you coming?", None, None).await.unwrap();
    let second = feed.next().await.unwrap().unwrap();
    assert_eq!(second.messages.len(), 2);
    assert_eq!(second.unread, 1);
    assert_eq!(second.unseen_mention.map(|m| m.id), Some(ping.id.clone()));

    assert_eq!(amaya.mark_seen().await.unwrap(), Some(ping.id));
    let third = feed.next().await.unwrap().unwrap();
    assert!(third.unseen_mention.is_none());
    assert_eq!(third.unread, 0);
}

#[tokio::test]
async fn test_scopes_are_isolated() {
    let f = fixture().await;
    let amaya = batch_room(&f.ctx, "amaya", "Amaya");
    let module = f.ctx.room(
        session("kasun", "Kasun", Role::Student),
        ChatScope::module("CS101", ModuleChannel::Discussion),
    );

    let sent = amaya.send_text("batch only", None, None).await.unwrap();
    module.send_text("module only", None, None).await.unwrap();

    assert_eq!(amaya.snapshot().await.unwrap().messages.len(), 1);
    assert!(matches!(
        module.toggle_reaction(&sent.id).await,
        Err(ChatError::MessageNotFound(_))
    ));
}

#[tokio::test]
async fn test_feed_as_stream() {
    use futures::StreamExt;

    let f = fixture().await;
    let amaya = batch_room(&f.ctx, "amaya", "Amaya");
    let kasun = batch_room(&f.ctx, "kasun", "Kasun");

    let mut snapshots = Box::pin(amaya.subscribe().await.unwrap().into_stream());
    let first = snapshots.next().await.unwrap().unwrap();
    assert!(first.messages.is_empty());

    kasun.send_text("hello", None, None).await.unwrap();
    let second = snapshots.next().await.unwrap().unwrap();
    assert_eq!(second.messages.len(), 1);
    assert_eq!(second.title, "Computer Science - Batch 23.1");
}
