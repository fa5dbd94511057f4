use std::time::Duration;

use aerosync_transport::{ConnectionConfig, ConnectionManager, ConnectionState, WsConnector};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;

async fn wait_for_state(manager: &ConnectionManager, state: ConnectionState) {
    let mut rx = manager.subscribe();
    timeout(Duration::from_secs(5), rx.wait_for(|s| s.state == state))
        .await
        .expect("state change should arrive in time")
        .expect("status channel should stay open");
}

#[tokio::test]
async fn websocket_link_carries_text_out_and_binary_in() {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    let addr = listener.local_addr().expect("listener should have address");

    let server = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.expect("should accept");
        let mut ws = tokio_tungstenite::accept_async(tcp)
            .await
            .expect("websocket handshake should succeed");

        let request = match ws.next().await {
            Some(Ok(Message::Text(text))) => text.as_str().to_owned(),
            other => panic!("expected text message, got {other:?}"),
        };
        ws.send(Message::Binary(request.into_bytes().into()))
            .await
            .expect("reply should send");
        ws.close(None).await.expect("close should send");
    });

    let connector = WsConnector::new(format!("ws://{addr}/ws/preview"));
    let (manager, mut frames) = ConnectionManager::spawn(
        connector,
        ConnectionConfig {
            max_retries: 0,
            ..ConnectionConfig::default()
        },
    );

    wait_for_state(&manager, ConnectionState::Connected).await;
    assert!(manager.send(r#"{"wing_span":1300}"#.to_string()));

    let frame = timeout(Duration::from_secs(5), frames.recv())
        .await
        .expect("frame should arrive in time")
        .expect("frame channel should stay open");
    assert_eq!(frame.as_ref(), br#"{"wing_span":1300}"#);

    // The server closes after one reply; with no retries left the link gives up.
    wait_for_state(&manager, ConnectionState::Disconnected).await;
    assert!(!manager.send("{}".to_string()));

    server.await.expect("server task should finish");
    manager.shutdown().await;
}

#[tokio::test]
async fn refused_connection_is_reported() {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    let addr = listener.local_addr().expect("listener should have address");
    drop(listener);

    let (manager, _frames) = ConnectionManager::spawn(
        WsConnector::new(format!("ws://{addr}/ws/preview")),
        ConnectionConfig {
            max_retries: 0,
            ..ConnectionConfig::default()
        },
    );

    wait_for_state(&manager, ConnectionState::Disconnected).await;
    let status = manager.status();
    assert_eq!(status.reconnect_attempts, 0);
    assert!(status
        .last_error
        .as_deref()
        .is_some_and(|err| err.contains("failed to connect")));
}
