//! Link lifecycle tests against a real local TCP peer.

use std::time::Duration;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::Framed;

use voxlink_core::LinkError;
use voxlink_peer::codec::FrameCodec;
use voxlink_peer::LinkController;

const POLL: Duration = Duration::from_millis(10);
const DEADLINE: Duration = Duration::from_secs(5);

/// A fake peer: the accept side of one TCP connection, framed.
async fn accept_peer(listener: &TcpListener) -> Framed<TcpStream, FrameCodec> {
    let (stream, _) = tokio::time::timeout(DEADLINE, listener.accept())
        .await
        .expect("peer accept timed out")
        .unwrap();
    Framed::new(stream, FrameCodec)
}

async fn connect_to(listener: &TcpListener, link: &LinkController) -> Framed<TcpStream, FrameCodec> {
    let addr = listener.local_addr().unwrap();
    link.connect("127.0.0.1", addr.port()).await.expect("connect failed");
    accept_peer(listener).await
}

/// Poll the snapshot until `pred` holds or the deadline passes.
async fn wait_for(link: &LinkController, pred: impl Fn(&voxlink_peer::LinkSnapshot) -> bool) {
    tokio::time::timeout(DEADLINE, async {
        loop {
            if pred(&link.snapshot()) {
                return;
            }
            tokio::time::sleep(POLL).await;
        }
    })
    .await
    .expect("condition not reached before deadline");
}

#[tokio::test]
async fn connect_then_disconnect() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let link = LinkController::new();

    let _peer = connect_to(&listener, &link).await;
    let snap = link.snapshot();
    assert!(snap.connected);
    assert_eq!(snap.status, format!("Connected to 127.0.0.1:{port}"));
    assert_eq!(snap.host, "127.0.0.1");
    assert_eq!(snap.port, port);

    link.disconnect().await.unwrap();
    let snap = link.snapshot();
    assert!(!snap.connected);
    assert_eq!(snap.status, "Disconnected");
    // The target persists for the UI to repopulate from.
    assert_eq!(snap.host, "127.0.0.1");
    assert_eq!(snap.port, port);
}

#[tokio::test]
async fn connect_while_connected_leaves_link_untouched() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let link = LinkController::new();
    let _peer = connect_to(&listener, &link).await;

    let err = link.connect("203.0.113.9", 1).await.unwrap_err();
    assert!(matches!(err, LinkError::AlreadyConnected));

    let snap = link.snapshot();
    assert!(snap.connected);
    assert_eq!(snap.host, "127.0.0.1");
    assert_eq!(snap.port, port);
    assert_eq!(snap.status, format!("Connected to 127.0.0.1:{port}"));
}

#[tokio::test]
async fn connect_to_unreachable_peer_fails_cleanly() {
    // Bind then drop to get a port with nothing listening.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let link = LinkController::new().with_connect_timeout(Duration::from_secs(2));
    let err = link.connect("127.0.0.1", port).await.unwrap_err();
    match err {
        LinkError::ConnectFailed(reason) => assert!(!reason.is_empty()),
        other => panic!("expected ConnectFailed, got {other:?}"),
    }

    let snap = link.snapshot();
    assert!(!snap.connected);
    // The failed target is still recorded.
    assert_eq!(snap.host, "127.0.0.1");
    assert_eq!(snap.port, port);
}

#[tokio::test]
async fn disconnect_when_idle_is_a_structured_failure() {
    let link = LinkController::new();
    let err = link.disconnect().await.unwrap_err();
    assert!(matches!(err, LinkError::NotConnected));
}

#[tokio::test]
async fn send_preconditions() {
    let link = LinkController::new();
    // Not connected wins over empty text, as the surface always reported.
    assert!(matches!(link.send("").await.unwrap_err(), LinkError::NotConnected));
    assert!(matches!(link.send("hi").await.unwrap_err(), LinkError::NotConnected));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let _peer = connect_to(&listener, &link).await;
    assert!(matches!(link.send("").await.unwrap_err(), LinkError::EmptyText));
}

#[tokio::test]
async fn send_delivers_one_framed_json_message() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let link = LinkController::new();
    let mut peer = connect_to(&listener, &link).await;

    link.send("turn the lights on").await.unwrap();

    let frame = tokio::time::timeout(DEADLINE, peer.next())
        .await
        .expect("peer read timed out")
        .unwrap()
        .unwrap();
    let value: serde_json::Value = serde_json::from_slice(&frame).unwrap();
    assert_eq!(value, serde_json::json!({"type": "text", "text": "turn the lights on"}));
}

#[tokio::test]
async fn speak_messages_are_capped_newest_first() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let link = LinkController::new();
    let mut peer = connect_to(&listener, &link).await;

    for i in 0..12 {
        let payload = serde_json::to_vec(&serde_json::json!({"type": "speak", "text": format!("msg {i}")})).unwrap();
        peer.send(Bytes::from(payload)).await.unwrap();
    }

    wait_for(&link, |s| s.received_messages.len() == 10 && s.received_messages[0] == "msg 11").await;
    let snap = link.snapshot();
    assert_eq!(snap.received_messages[9], "msg 2");
    assert!(snap.connected);
}

#[tokio::test]
async fn peer_close_tears_the_link_down() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let link = LinkController::new();
    let peer = connect_to(&listener, &link).await;

    drop(peer);
    wait_for(&link, |s| !s.connected).await;
    assert_eq!(link.snapshot().status, "Disconnected");

    // The link is gone for good; only a fresh connect revives it.
    assert!(matches!(link.send("hello").await.unwrap_err(), LinkError::NotConnected));
    assert!(matches!(link.disconnect().await.unwrap_err(), LinkError::NotConnected));
}

#[tokio::test]
async fn messages_survive_disconnect_and_reconnect() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let link = LinkController::new();
    let mut peer = connect_to(&listener, &link).await;

    let payload = serde_json::to_vec(&serde_json::json!({"type": "speak", "text": "kept"})).unwrap();
    peer.send(Bytes::from(payload)).await.unwrap();
    wait_for(&link, |s| !s.received_messages.is_empty()).await;

    link.disconnect().await.unwrap();
    assert_eq!(link.snapshot().received_messages, vec!["kept"]);

    // A fresh connect keeps the backlog too.
    let _peer = connect_to(&listener, &link).await;
    assert_eq!(link.snapshot().received_messages, vec!["kept"]);
}

#[tokio::test]
async fn reconnect_after_disconnect_works() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let link = LinkController::new();

    for _ in 0..3 {
        let _peer = connect_to(&listener, &link).await;
        assert!(link.snapshot().connected);
        link.disconnect().await.unwrap();
        assert!(!link.snapshot().connected);
    }
}
