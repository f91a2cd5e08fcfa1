//! Postgres backend integration tests.
//!
//! These need a live database. Set `FOLIO_TEST_DATABASE_URL` and run with
//! `cargo test -p folio-store -- --ignored`. Each test uses its own
//! sessions so tests can share a database.

use chrono::Utc;
use folio_core::chat::{Message, MessageRole, SessionKind, User};
use folio_core::ids::new_message_id;
use folio_store::{CreateSessionOptions, PgStore, SessionStore, SessionUpdate, StoreError};

async fn connect() -> PgStore {
    let url = std::env::var("FOLIO_TEST_DATABASE_URL")
        .expect("FOLIO_TEST_DATABASE_URL must be set for postgres tests");
    PgStore::connect(&url, 5, 5_000)
        .await
        .expect("failed to connect to test database")
}

fn user_message(session_id: &str, content: &str) -> Message {
    Message {
        id: new_message_id(),
        session_id: session_id.to_string(),
        role: MessageRole::User,
        content: content.to_string(),
        created_at: Utc::now(),
        model: None,
        input_tokens: None,
        output_tokens: None,
        cost_usd: None,
        sources: None,
        response_time_ms: None,
    }
}

#[tokio::test]
#[ignore = "needs FOLIO_TEST_DATABASE_URL"]
async fn session_lifecycle_round_trip() {
    let store = connect().await;

    let session = store
        .create_session(CreateSessionOptions {
            user_id: None,
            title: String::new(),
            kind: SessionKind::General,
        })
        .await
        .unwrap();
    assert!(session.is_anonymous);

    let fetched = store.get_session(&session.id, None).await.unwrap();
    assert_eq!(fetched.id, session.id);

    let updated = store
        .update_session(
            &session.id,
            None,
            SessionUpdate {
                title: Some("Renamed".into()),
                ..SessionUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.title, "Renamed");

    store.delete_session(&session.id, None).await.unwrap();
    let err = store.get_session(&session.id, None).await.unwrap_err();
    assert!(matches!(err, StoreError::SessionNotFound(_)));
}

#[tokio::test]
#[ignore = "needs FOLIO_TEST_DATABASE_URL"]
async fn messages_bump_session_counters() {
    let store = connect().await;
    let session = store
        .create_session(CreateSessionOptions::default())
        .await
        .unwrap();

    store
        .append_message(&user_message(&session.id, "one"))
        .await
        .unwrap();
    store
        .append_message(&user_message(&session.id, "two"))
        .await
        .unwrap();

    let refreshed = store.get_session(&session.id, None).await.unwrap();
    assert_eq!(refreshed.message_count, 2);

    let recent = store.recent_messages(&session.id, 1).await.unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].content, "two");

    store.delete_session(&session.id, None).await.unwrap();
}

#[tokio::test]
#[ignore = "needs FOLIO_TEST_DATABASE_URL"]
async fn claim_and_user_stats() {
    let store = connect().await;
    let uid = format!("it-{}", uuid::Uuid::now_v7());
    let now = Utc::now();
    store
        .upsert_user(&User {
            id: uid.clone(),
            email: format!("{uid}@example.com"),
            display_name: None,
            timezone: "UTC".into(),
            created_at: now,
            updated_at: now,
            total_sessions: 0,
            total_messages: 0,
        })
        .await
        .unwrap();

    let session = store
        .create_session(CreateSessionOptions::default())
        .await
        .unwrap();
    let claimed = store.claim_session(&session.id, &uid).await.unwrap();
    assert_eq!(claimed.user_id.as_deref(), Some(uid.as_str()));

    store.bump_user_stats(&uid, 1, 3).await.unwrap();
    let user = store.get_user(&uid).await.unwrap().unwrap();
    assert_eq!(user.total_sessions, 1);
    assert_eq!(user.total_messages, 3);

    store.delete_session(&session.id, Some(&uid)).await.unwrap();
}
