// Shared helpers for the WebSocket session tests
//
// Each mock server accepts exactly one connection on 127.0.0.1 and hands the
// upgraded socket to the test's script.

#![allow(dead_code)]

use futures::StreamExt;
use std::future::Future;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

pub type ServerSocket = WebSocketStream<TcpStream>;

pub struct MockServer {
    pub host: String,
    pub port: u16,
    pub handle: JoinHandle<()>,
}

pub async fn serve_once<F, Fut>(script: F) -> MockServer
where
    F: FnOnce(ServerSocket) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        script(ws).await;
    });

    MockServer {
        host: "ws://127.0.0.1".to_string(),
        port,
        handle,
    }
}

/// Next text frame parsed as JSON
pub async fn recv_json(ws: &mut ServerSocket) -> serde_json::Value {
    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => return serde_json::from_str(&text).unwrap(),
            Some(Ok(_)) => continue,
            other => panic!("expected a text frame, got {:?}", other),
        }
    }
}

/// Read until the client closes; returns the binary payload bytes seen
pub async fn drain_until_closed(ws: &mut ServerSocket) -> usize {
    let mut bytes = 0;
    while let Some(Ok(message)) = ws.next().await {
        match message {
            Message::Binary(data) => bytes += data.len(),
            Message::Close(_) => break,
            _ => {}
        }
    }
    bytes
}
