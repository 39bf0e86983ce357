use async_trait::async_trait;
use chat_relay::backend::{ BackendError, BackendReply, ChatBackend, ChatRequest };
use chat_relay::dispatcher::DispatchOptions;
use chat_relay::server::websocket::serve;
use futures::{ SinkExt, StreamExt };
use serde_json::{ json, Value };
use std::sync::{ Arc, Mutex };
use std::time::Duration;
use tokio::net::{ TcpListener, TcpStream };
use tokio::sync::Notify;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{ connect_async, MaybeTlsStream, WebSocketStream };

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Echoes the message back and hands out a fixed session token.
#[derive(Default)]
struct EchoBackend {
    seen: Mutex<Vec<ChatRequest>>,
}

#[async_trait]
impl ChatBackend for EchoBackend {
    async fn exchange(&self, request: &ChatRequest) -> Result<BackendReply, BackendError> {
        self.seen.lock().unwrap().push(request.clone());
        Ok(BackendReply {
            conversation_id: Some("session-1".into()),
            reply: Some(format!("echo: {}", request.message)),
            error: None,
        })
    }

    fn endpoint(&self) -> String {
        "echo://".into()
    }
}

/// Never answers; signals once the call it is serving gets dropped.
#[derive(Default)]
struct StalledBackend {
    abandoned: Notify,
}

struct Abandoned<'a>(&'a Notify);

impl Drop for Abandoned<'_> {
    fn drop(&mut self) {
        self.0.notify_one();
    }
}

#[async_trait]
impl ChatBackend for StalledBackend {
    async fn exchange(&self, _request: &ChatRequest) -> Result<BackendReply, BackendError> {
        let _abandoned = Abandoned(&self.abandoned);
        std::future::pending().await
    }

    fn endpoint(&self) -> String {
        "stalled://".into()
    }
}

async fn start_gateway(backend: Arc<dyn ChatBackend>) -> Client {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(listener, backend, DispatchOptions::default()));
    let (client, _) = connect_async(format!("ws://{}", addr)).await.unwrap();
    client
}

async fn send(client: &mut Client, frame: Value) {
    client.send(Message::Text(frame.to_string())).await.unwrap();
}

/// Reads frames until one satisfies `accept`, failing after a few seconds.
async fn next_matching(client: &mut Client, accept: impl Fn(&Value) -> bool) -> Value {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let frame = client.next().await.unwrap().unwrap();
            if let Message::Text(text) = frame {
                let value: Value = serde_json::from_str(&text).unwrap();
                if accept(&value) {
                    return value;
                }
            }
        }
    }).await.expect("timed out waiting for frame")
}

#[tokio::test]
async fn connection_starts_with_one_conversation() {
    let mut client = start_gateway(Arc::new(EchoBackend::default())).await;
    let state = next_matching(&mut client, |v| v["type"] == "state").await;

    assert_eq!(state["conversations"].as_array().unwrap().len(), 1);
    assert_eq!(state["conversations"][0]["name"], "Conversation #1");
    assert_eq!(state["active"], state["conversations"][0]["id"]);
    assert_eq!(state["pending"], false);
}

#[tokio::test]
async fn send_appends_user_and_assistant_messages() {
    let backend = Arc::new(EchoBackend::default());
    let mut client = start_gateway(backend.clone()).await;
    next_matching(&mut client, |v| v["type"] == "state").await;

    send(&mut client, json!({ "type": "send", "text": "  hello ", "page_content": "Shop page" })).await;
    let state = next_matching(&mut client, |v| {
        v["messages"].as_array().map_or(false, |m| m.len() == 2) && v["pending"] == false
    }).await;

    assert_eq!(state["messages"][0]["sender"], "user");
    assert_eq!(state["messages"][0]["text"], "hello");
    assert_eq!(state["messages"][1]["sender"], "assistant");
    assert_eq!(state["messages"][1]["text"], "echo: hello");

    send(&mut client, json!({ "type": "send", "text": "again" })).await;
    next_matching(&mut client, |v| v["messages"].as_array().map_or(false, |m| m.len() == 4)).await;

    let seen = backend.seen.lock().unwrap().clone();
    assert_eq!(seen[0].page_content.as_deref(), Some("Shop page"));
    assert_eq!(seen[0].conversation_id, None);
    assert_eq!(seen[1].conversation_id.as_deref(), Some("session-1"));
}

#[tokio::test]
async fn conversation_intents_update_state() {
    let mut client = start_gateway(Arc::new(EchoBackend::default())).await;
    let initial = next_matching(&mut client, |v| v["type"] == "state").await;
    let first = initial["conversations"][0]["id"].clone();

    send(&mut client, json!({ "type": "new_conversation" })).await;
    let state = next_matching(&mut client, |v| v["conversations"].as_array().map_or(false, |c| c.len() == 2)).await;
    let second = state["conversations"][1]["id"].clone();
    assert_eq!(state["active"], second);
    assert_eq!(state["conversations"][1]["name"], "Conversation #2");

    send(&mut client, json!({ "type": "rename", "id": first, "name": "Orders" })).await;
    next_matching(&mut client, |v| v["conversations"][0]["name"] == "Orders").await;

    send(&mut client, json!({ "type": "select", "id": first })).await;
    next_matching(&mut client, |v| v["active"] == first).await;

    send(&mut client, json!({ "type": "delete", "id": first })).await;
    let state = next_matching(&mut client, |v| v["conversations"].as_array().map_or(false, |c| c.len() == 1)).await;
    assert_eq!(state["active"], second);
}

#[tokio::test]
async fn malformed_frame_yields_error_notice() {
    let mut client = start_gateway(Arc::new(EchoBackend::default())).await;
    next_matching(&mut client, |v| v["type"] == "state").await;

    client.send(Message::Text("{\"type\":\"launch\"}".into())).await.unwrap();
    let notice = next_matching(&mut client, |v| v["type"] == "error").await;
    assert!(notice["message"].as_str().unwrap().starts_with("Failed to parse message"));
}

#[tokio::test]
async fn oversized_frame_is_refused_and_connection_dropped() {
    let mut client = start_gateway(Arc::new(EchoBackend::default())).await;
    next_matching(&mut client, |v| v["type"] == "state").await;

    client.send(Message::Text("x".repeat(1024 * 1024 + 1))).await.unwrap();
    let notice = next_matching(&mut client, |v| v["type"] == "error").await;
    assert_eq!(notice["message"], "Message too large");

    let after = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match client.next().await {
                Some(Ok(Message::Text(_))) => continue,
                other => return other,
            }
        }
    }).await.expect("connection stayed open");
    assert!(matches!(after, None | Some(Err(_)) | Some(Ok(Message::Close(_)))));
}

#[tokio::test]
async fn closing_the_socket_abandons_the_send_in_flight() {
    let backend = Arc::new(StalledBackend::default());
    let mut client = start_gateway(backend.clone()).await;
    next_matching(&mut client, |v| v["type"] == "state").await;

    send(&mut client, json!({ "type": "send", "text": "hello" })).await;
    next_matching(&mut client, |v| v["pending"] == true).await;

    client.close(None).await.unwrap();
    tokio::time::timeout(Duration::from_secs(5), backend.abandoned.notified())
        .await
        .expect("in-flight send outlived the connection");
}
