use crate::backend::ChatBackend;
use crate::dispatcher::{ DispatchOptions, MessageDispatcher };
use crate::models::websocket::{ ClientMessage, ServerMessage };
use crate::session::Session;

use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{ AsyncRead, AsyncWrite };
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_stream::wrappers::WatchStream;
use tokio_tungstenite::{ accept_async, WebSocketStream };
use tokio_tungstenite::tungstenite::protocol::Message;

use futures::{ SinkExt, StreamExt };
use log::{ debug, error, info, warn };

const MAX_MESSAGE_SIZE: usize = 1 * 1024 * 1024;

pub async fn start_ws_server(
    addr: &str,
    backend: Arc<dyn ChatBackend>,
    options: DispatchOptions
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let listener = TcpListener::bind(addr).await?;
    info!("WS gateway listening on: {}", listener.local_addr()?);
    serve(listener, backend, options).await
}

/// Accepts connections forever, giving each one its own session.
pub async fn serve(
    listener: TcpListener,
    backend: Arc<dyn ChatBackend>,
    options: DispatchOptions
) -> Result<(), Box<dyn Error + Send + Sync>> {
    loop {
        let (stream, peer) = listener.accept().await?;
        info!("Incoming connection from: {}", peer);
        let backend = Arc::clone(&backend);
        let options = options.clone();

        tokio::spawn(async move {
            match accept_async(stream).await {
                Ok(websocket) => handle_connection(peer, websocket, backend, options).await,
                Err(e) => error!("WebSocket handshake failed for {}: {}", peer, e),
            }
        });
    }
}

pub async fn handle_connection<S>(
    peer: SocketAddr,
    websocket: WebSocketStream<S>,
    backend: Arc<dyn ChatBackend>,
    options: DispatchOptions
)
    where S: AsyncRead + AsyncWrite + Unpin + Send + 'static
{
    let session = Session::new();
    let dispatcher = MessageDispatcher::new(session.clone(), backend, options);
    info!("Session opened for {}", peer);

    let (mut tx, mut rx) = websocket.split();
    let (notice_tx, mut notice_rx) = mpsc::channel::<ServerMessage>(16);
    let mut states = WatchStream::new(session.subscribe());

    let writer = tokio::spawn(async move {
        loop {
            let outgoing = tokio::select! {
                Some(snapshot) = states.next() => ServerMessage::State(snapshot),
                Some(notice) = notice_rx.recv() => notice,
                else => break,
            };
            let json = match serde_json::to_string(&outgoing) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to encode frame for {}: {}", peer, e);
                    continue;
                }
            };
            if let Err(e) = tx.send(Message::Text(json)).await {
                error!("Error sending frame to {}: {}", peer, e);
                break;
            }
        }
    });

    let mut sends = JoinSet::new();
    loop {
        let msg = tokio::select! {
            msg = rx.next() => msg,
            Some(finished) = sends.join_next(), if !sends.is_empty() => {
                match finished {
                    Ok(outcome) => debug!("Send for {} finished: {:?}", peer, outcome),
                    Err(e) => error!("Send task for {} failed: {}", peer, e),
                }
                continue;
            }
        };
        let Some(msg) = msg else {
            break;
        };

        match msg {
            Ok(message) => {
                if message.len() > MAX_MESSAGE_SIZE {
                    warn!(
                        "Message from {} exceeds size limit ({} > {})",
                        peer,
                        message.len(),
                        MAX_MESSAGE_SIZE
                    );
                    notify(&notice_tx, "Message too large").await;
                    break;
                }

                match message {
                    Message::Text(text) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(ClientMessage::Send { text, page_content }) => {
                                let dispatcher = dispatcher.clone();
                                sends.spawn(async move {
                                    dispatcher.send(&text, page_content.as_deref()).await
                                });
                            }
                            Ok(ClientMessage::NewConversation) => {
                                session.create_conversation();
                            }
                            Ok(ClientMessage::Rename { id, name }) => {
                                session.rename_conversation(id, name);
                            }
                            Ok(ClientMessage::Delete { id }) => {
                                session.delete_conversation(id);
                            }
                            Ok(ClientMessage::Select { id }) => {
                                session.select_conversation(id);
                            }
                            Err(e) => {
                                error!("Failed to parse message from {}: {}", peer, e);
                                notify(&notice_tx, format!("Failed to parse message: {}", e)).await;
                            }
                        }
                    }
                    Message::Close(_) => {
                        info!("Received close frame from {}", peer);
                        break;
                    }
                    Message::Binary(_) => {
                        warn!("Ignoring binary message from {}", peer);
                    }
                    Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
                }
            }
            Err(e) => {
                info!("WebSocket connection closed or errored for {}: {}", peer, e);
                break;
            }
        }
    }

    // Dropping every handle to the session ends the state stream, which lets
    // the writer flush what is queued and stop.
    sends.shutdown().await;
    drop(dispatcher);
    drop(session);
    drop(notice_tx);
    if let Err(e) = writer.await {
        error!("Writer task for {} failed: {}", peer, e);
    }
    info!("Session closed for {}", peer);
}

async fn notify(notices: &mpsc::Sender<ServerMessage>, message: impl Into<String>) {
    let notice = ServerMessage::Error { message: message.into() };
    if notices.send(notice).await.is_err() {
        debug!("Writer already gone, dropping notice");
    }
}
