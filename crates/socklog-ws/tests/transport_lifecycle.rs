use std::time::Duration;

use futures::{SinkExt, StreamExt};
use socklog_ws::{CancellationToken, Connector, TransportEvent, TransportFrame, TransportSink, WsConnector};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::Message;

async fn next_event(rx: &mut mpsc::UnboundedReceiver<TransportFrame>) -> TransportEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for transport event")
        .expect("transport channel closed")
        .event
}

#[tokio::test]
async fn test_text_frames_are_forwarded_until_server_close() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        ws.send(Message::Text(String::from(r#"{"type":"order.placed"}"#).into()))
            .await
            .unwrap();
        ws.send(Message::Text(String::from("plain text").into()))
            .await
            .unwrap();
        ws.close(None).await.unwrap();
        // Drain until the client acknowledges the close
        while let Some(Ok(_)) = ws.next().await {}
    });

    let (tx, mut rx) = mpsc::unbounded_channel();
    WsConnector::new()
        .open(
            &format!("ws://{addr}"),
            TransportSink::new(1, tx),
            CancellationToken::new(),
        )
        .unwrap();

    assert_eq!(next_event(&mut rx).await, TransportEvent::Open);
    assert_eq!(
        next_event(&mut rx).await,
        TransportEvent::Message(r#"{"type":"order.placed"}"#.to_string())
    );
    assert_eq!(
        next_event(&mut rx).await,
        TransportEvent::Message("plain text".to_string())
    );
    assert_eq!(next_event(&mut rx).await, TransportEvent::Close);

    server.await.unwrap();
}

#[tokio::test]
async fn test_cancel_closes_open_transport() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        while let Some(Ok(_)) = ws.next().await {}
    });

    let (tx, mut rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    WsConnector::new()
        .open(&format!("ws://{addr}"), TransportSink::new(2, tx), cancel.clone())
        .unwrap();

    assert_eq!(next_event(&mut rx).await, TransportEvent::Open);
    cancel.cancel();
    assert_eq!(next_event(&mut rx).await, TransportEvent::Close);

    server.await.unwrap();
}

#[tokio::test]
async fn test_refused_connection_reports_error_then_close() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (tx, mut rx) = mpsc::unbounded_channel();
    WsConnector::new()
        .open(
            &format!("ws://{addr}"),
            TransportSink::new(3, tx),
            CancellationToken::new(),
        )
        .unwrap();

    assert!(matches!(next_event(&mut rx).await, TransportEvent::Error(_)));
    assert_eq!(next_event(&mut rx).await, TransportEvent::Close);
}

#[tokio::test]
async fn test_binary_and_ping_frames_are_ignored() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        ws.send(Message::Text(String::from("first").into()))
            .await
            .unwrap();
        ws.send(Message::Binary(vec![0x1b, 0x63, 0x00].into()))
            .await
            .unwrap();
        ws.send(Message::Ping(Vec::new().into())).await.unwrap();
        ws.send(Message::Text(String::from("second").into()))
            .await
            .unwrap();
        ws.close(None).await.unwrap();
        while let Some(Ok(_)) = ws.next().await {}
    });

    let (tx, mut rx) = mpsc::unbounded_channel();
    WsConnector::new()
        .open(
            &format!("ws://{addr}"),
            TransportSink::new(4, tx),
            CancellationToken::new(),
        )
        .unwrap();

    assert_eq!(next_event(&mut rx).await, TransportEvent::Open);
    assert_eq!(
        next_event(&mut rx).await,
        TransportEvent::Message("first".to_string())
    );
    assert_eq!(
        next_event(&mut rx).await,
        TransportEvent::Message("second".to_string())
    );
    assert_eq!(next_event(&mut rx).await, TransportEvent::Close);

    server.await.unwrap();
}

#[tokio::test]
async fn test_dropped_connection_ends_with_close() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        // No close frame, just the TCP stream going away
        drop(ws);
    });

    let (tx, mut rx) = mpsc::unbounded_channel();
    WsConnector::new()
        .open(
            &format!("ws://{addr}"),
            TransportSink::new(5, tx),
            CancellationToken::new(),
        )
        .unwrap();

    assert_eq!(next_event(&mut rx).await, TransportEvent::Open);

    let mut rest = Vec::new();
    loop {
        let event = next_event(&mut rx).await;
        let done = event == TransportEvent::Close;
        rest.push(event);
        if done {
            break;
        }
    }

    // A read error, if reported, comes just before the close
    match rest.as_slice() {
        [TransportEvent::Close] => {}
        [TransportEvent::Error(_), TransportEvent::Close] => {}
        other => panic!("unexpected events after open: {other:?}"),
    }

    server.await.unwrap();
}
