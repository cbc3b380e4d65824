// Tests for MessageStore and LastSeenStore

use tempfile::NamedTempFile;
use uniportal_store::{
    connect, LastSeenStore, MessageBody, MessageStore, NewChatMessage, PollDocument, ReplyRef,
    StoreConfig, StoreError, VoteValue,
};

async fn create_store(temp_file: &NamedTempFile) -> sea_orm::DatabaseConnection {
    connect(&StoreConfig {
        db_path: temp_file.path().to_path_buf(),
        ..Default::default()
    })
    .await
    .expect("Failed to open store")
}

fn text_message(id: &str, scope: &str, text: &str) -> NewChatMessage {
    NewChatMessage {
        id: id.to_string(),
        scope_key: scope.to_string(),
        sender_id: "uid-amaya".to_string(),
        sender_name: "Amaya".to_string(),
        text: text.to_string(),
        body: MessageBody::Text,
        reply_to: None,
        image_url: None,
    }
}

#[tokio::test]
async fn test_messages_listed_in_insertion_order() {
    let temp_file = NamedTempFile::new().unwrap();
    let store = MessageStore::new(create_store(&temp_file).await);

    for (i, text) in ["first", "second", "third"].iter().enumerate() {
        store
            .insert(text_message(&format!("C_{}", i), "Computing", text))
            .await
            .unwrap();
    }
    store
        .insert(text_message("B_0", "Business", "elsewhere"))
        .await
        .unwrap();

    let listed = store.list_scope("Computing").await.unwrap();
    let texts: Vec<_> = listed.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec!["first", "second", "third"]);
    assert_eq!(listed.iter().map(|m| m.seq).collect::<Vec<_>>(), vec![1, 2, 3]);
    assert!(listed.windows(2).all(|w| w[0].sent_at <= w[1].sent_at));
    assert_eq!(store.count_scope("Business").await.unwrap(), 1);
}

#[tokio::test]
async fn test_reply_and_image_survive_reload() {
    let temp_file = NamedTempFile::new().unwrap();
    let store = MessageStore::new(create_store(&temp_file).await);

    let mut message = text_message("C_1", "Computing", "see above");
    message.reply_to = Some(ReplyRef {
        message_id: Some("C_0".to_string()),
        name: "Kasun".to_string(),
        text: "original".to_string(),
        image_url: None,
    });
    message.image_url = Some("file:///tmp/abc.png".to_string());
    store.insert(message.clone()).await.unwrap();

    let loaded = store.get("C_1").await.unwrap().unwrap();
    assert_eq!(loaded.reply_to, message.reply_to);
    assert_eq!(loaded.image_url, message.image_url);
    assert!(loaded.reactions.is_empty());
}

#[tokio::test]
async fn test_concurrent_updates_accumulate() {
    let temp_file = NamedTempFile::new().unwrap();
    let store = MessageStore::new(create_store(&temp_file).await);

    let mut poll = text_message("C_poll", "Computing", "");
    poll.body = MessageBody::Poll(PollDocument {
        question: "Exam date?".to_string(),
        options: vec!["Monday".to_string(), "Friday".to_string()],
        allow_multiple: false,
        votes: Default::default(),
    });
    store.insert(poll).await.unwrap();

    let mut handles = Vec::new();
    for voter in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .update_message("C_poll", |message| {
                    if let MessageBody::Poll(poll) = &mut message.body {
                        poll.votes
                            .insert(format!("voter-{}", voter), VoteValue::One(voter % 2));
                    }
                    Ok::<_, StoreError>(())
                })
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stored = store.get("C_poll").await.unwrap().unwrap();
    assert_eq!(stored.poll().unwrap().votes.len(), 8);
}

#[tokio::test]
async fn test_failed_update_writes_nothing() {
    let temp_file = NamedTempFile::new().unwrap();
    let store = MessageStore::new(create_store(&temp_file).await);
    store
        .insert(text_message("C_1", "Computing", "hello"))
        .await
        .unwrap();

    let result = store
        .update_message("C_1", |message| {
            message.reactions.insert("uid-kasun".to_string(), true);
            Err::<(), _>(StoreError::NotFound("rejected".to_string()))
        })
        .await;
    assert!(result.is_err());

    let stored = store.get("C_1").await.unwrap().unwrap();
    assert!(stored.reactions.is_empty());

    let missing = store
        .update_message("nope", |_| Ok::<_, StoreError>(()))
        .await;
    assert!(matches!(missing, Err(StoreError::NotFound(_))));
}

#[tokio::test]
async fn test_delete_message() {
    let temp_file = NamedTempFile::new().unwrap();
    let store = MessageStore::new(create_store(&temp_file).await);
    store
        .insert(text_message("C_1", "Computing", "oops"))
        .await
        .unwrap();

    assert!(store.delete("C_1").await.unwrap());
    assert!(!store.delete("C_1").await.unwrap());
    assert!(store.list_scope("Computing").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_last_seen_markers() {
    let temp_file = NamedTempFile::new().unwrap();
    let markers = LastSeenStore::new(create_store(&temp_file).await);

    assert_eq!(markers.get("uid-amaya", "Computing").await.unwrap(), None);

    markers.mark("uid-amaya", "Computing", "C_1").await.unwrap();
    markers.mark("uid-amaya", "Computing", "C_2").await.unwrap();
    markers.mark("uid-amaya", "Business", "B_9").await.unwrap();

    assert_eq!(
        markers.get("uid-amaya", "Computing").await.unwrap(),
        Some("C_2".to_string())
    );
    assert_eq!(markers.get("uid-kasun", "Computing").await.unwrap(), None);
    assert_eq!(
        markers.for_user("uid-amaya").await.unwrap(),
        vec![
            ("Business".to_string(), "B_9".to_string()),
            ("Computing".to_string(), "C_2".to_string()),
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_inserts_and_markers_interleave_across_threads() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = create_store(&temp_file).await;
    let store = MessageStore::new(db.clone());
    let markers = LastSeenStore::new(db);

    let mut handles = Vec::new();
    for round in 0..10 {
        for sender in 0..4 {
            let store = store.clone();
            let markers = markers.clone();
            handles.push(tokio::spawn(async move {
                let id = format!("C_{}_{}", round, sender);
                store
                    .insert(text_message(&id, "Computing", "busy room"))
                    .await?;
                // Every sender races the others to create the same marker row
                markers.mark("uid-shared", "Computing", &id).await?;
                markers
                    .mark(&format!("uid-{}", sender), "Computing", &id)
                    .await
            }));
        }
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let listed = store.list_scope("Computing").await.unwrap();
    assert_eq!(listed.len(), 40);
    let mut seqs: Vec<_> = listed.iter().map(|m| m.seq).collect();
    seqs.sort_unstable();
    assert_eq!(seqs, (1..=40).collect::<Vec<_>>());
    assert!(markers
        .get("uid-shared", "Computing")
        .await
        .unwrap()
        .is_some());
}
