mod support;

use axum::http::{Method, StatusCode};
use chorus::realtime::events::{NEW_MESSAGE, NEW_NOTIFICATION, NEW_POST};
use chorus::realtime::{ConnectionHandle, RealtimeEvent};
use serde_json::json;
use support::{TestApp, parse_id};
use tokio::sync::mpsc::Receiver;
use uuid::Uuid;

fn connect(app: &TestApp, user: Uuid) -> Receiver<RealtimeEvent> {
    let (handle, receiver) = ConnectionHandle::channel(16);
    app.registry.register(user, handle);
    receiver
}

fn drain(receiver: &mut Receiver<RealtimeEvent>) -> Vec<RealtimeEvent> {
    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn like_notifies_every_author_connection_once() {
    let (app, _cache) = TestApp::new();
    let author = app.register("author").await;
    let fan = app.register("fan").await;
    let post = app.create_post(author, "liked").await;

    let mut laptop = connect(&app, author);
    let mut phone = connect(&app, author);
    let mut bystander = connect(&app, fan);

    let (status, _) = app
        .send(Method::PUT, &format!("/api/posts/{post}/like"), Some(fan), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    for receiver in [&mut laptop, &mut phone] {
        let events = drain(receiver);
        assert_eq!(events.len(), 1, "expected one event, got {events:?}");
        assert_eq!(events[0].event, NEW_NOTIFICATION);
        assert_eq!(events[0].data["kind"], "like");
        assert_eq!(events[0].data["actor_id"], fan.to_string());
        assert_eq!(events[0].data["post_id"], post.to_string());
    }
    assert!(drain(&mut bystander).is_empty());
}

#[tokio::test]
async fn liking_own_post_emits_nothing() {
    let (app, _cache) = TestApp::new();
    let author = app.register("author").await;
    let post = app.create_post(author, "mine").await;
    let mut receiver = connect(&app, author);

    let (status, body) = app
        .send(Method::PUT, &format!("/api/posts/{post}/like"), Some(author), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["liked"], true);

    assert!(drain(&mut receiver).is_empty());

    let (_, notifications) = app
        .send(Method::GET, "/api/notifications", Some(author), None)
        .await;
    assert_eq!(notifications.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn offline_recipient_still_gets_persisted_notification() {
    let (app, _cache) = TestApp::new();
    let alice = app.register("alice").await;
    let bob = app.register("bob").await;

    let (status, _) = app
        .send(Method::PUT, &format!("/api/users/{bob}/follow"), Some(alice), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, notifications) = app
        .send(Method::GET, "/api/notifications", Some(bob), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let notifications = notifications.as_array().cloned().unwrap_or_default();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["kind"], "follow");
    assert_eq!(notifications[0]["read"], false);

    let id = parse_id(&notifications[0]);
    let (status, marked) = app
        .send(
            Method::PUT,
            &format!("/api/notifications/{id}/read"),
            Some(bob),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(marked["read"], true);
}

#[tokio::test]
async fn message_reaches_recipient_only() {
    let (app, _cache) = TestApp::new();
    let alice = app.register("alice").await;
    let bob = app.register("bob").await;
    let mut alice_rx = connect(&app, alice);
    let mut bob_rx = connect(&app, bob);

    let (status, sent) = app
        .send(
            Method::POST,
            "/api/messages",
            Some(alice),
            Some(json!({ "recipient_id": bob, "body": "hi bob" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "send failed: {sent}");

    let events = drain(&mut bob_rx);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event, NEW_MESSAGE);
    assert_eq!(events[0].data["body"], "hi bob");
    assert!(drain(&mut alice_rx).is_empty());

    let (_, conversation) = app
        .send(Method::GET, &format!("/api/messages/{alice}"), Some(bob), None)
        .await;
    assert_eq!(conversation.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn new_post_is_broadcast_and_closed_connections_pruned() {
    let (app, _cache) = TestApp::new();
    let author = app.register("author").await;
    let reader = app.register("reader").await;
    let mut reader_rx = connect(&app, reader);
    let gone = connect(&app, reader);
    drop(gone);

    app.create_post(author, "broadcast").await;

    let events = drain(&mut reader_rx);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event, NEW_POST);
    assert_eq!(events[0].data["title"], "broadcast");
    assert_eq!(app.registry.connection_count(), 1);
}

#[tokio::test]
async fn emits_without_connections_are_noops() {
    let (app, _cache) = TestApp::new();
    let author = app.register("author").await;
    let fan = app.register("fan").await;
    let post = app.create_post(author, "quiet").await;

    let (status, _) = app
        .send(Method::PUT, &format!("/api/posts/{post}/like"), Some(fan), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!app.registry.is_online(author));
    assert_eq!(app.registry.connection_count(), 0);
}
