//! Discord Gateway inbound message loop.
//!
//! Keeps one websocket session open (hello, identify, heartbeats), and turns
//! every guild `MESSAGE_CREATE` from a human into a spawned
//! [`Dispatcher::handle_message`] call. Reconnects with exponential backoff
//! until the shutdown signal flips.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::{watch, Mutex};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::channels::discord::format_bot_token;
use crate::channels::ChatSurface;
use crate::commands::Dispatcher;

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;
type WsWrite = futures_util::stream::SplitSink<WsStream, Message>;

const OP_DISPATCH: u64 = 0;
const OP_HEARTBEAT: u64 = 1;
const OP_IDENTIFY: u64 = 2;
const OP_RECONNECT: u64 = 7;
const OP_INVALID_SESSION: u64 = 9;
const OP_HELLO: u64 = 10;
const OP_HEARTBEAT_ACK: u64 = 11;

const MAX_BACKOFF: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct GatewayPayload {
    op: u64,
    #[serde(default)]
    d: Option<Value>,
    #[serde(default)]
    s: Option<u64>,
    #[serde(default)]
    t: Option<String>,
}

/// Connection settings for one gateway loop.
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub gateway_url: String,
    pub bot_token: String,
    pub intents: u64,
}

/// A guild message worth dispatching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub guild_id: String,
    pub channel_id: String,
    pub author_id: String,
    pub content: String,
}

/// Extract a dispatchable message from a `MESSAGE_CREATE` payload. Messages
/// from bots (this one included), direct messages, and empty messages yield
/// `None`.
pub fn parse_message_create(data: &Value, bot_user_id: Option<&str>) -> Option<InboundMessage> {
    let author = data.get("author")?;
    if author.get("bot").and_then(Value::as_bool) == Some(true) {
        return None;
    }
    let author_id = author.get("id").and_then(Value::as_str)?;
    if bot_user_id == Some(author_id) {
        return None;
    }
    let guild_id = data.get("guild_id").and_then(Value::as_str)?;
    let channel_id = data.get("channel_id").and_then(Value::as_str)?;
    let content = data
        .get("content")
        .and_then(Value::as_str)
        .filter(|c| !c.is_empty())?;

    Some(InboundMessage {
        guild_id: guild_id.to_string(),
        channel_id: channel_id.to_string(),
        author_id: author_id.to_string(),
        content: content.to_string(),
    })
}

/// Run the Discord gateway loop (reconnects with backoff).
pub async fn discord_gateway_loop(
    settings: GatewaySettings,
    dispatcher: Dispatcher,
    surface: Arc<dyn ChatSurface>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut backoff = Duration::from_secs(1);

    loop {
        if *shutdown.borrow() {
            break;
        }

        info!(target: "gateway", url = %settings.gateway_url, "connecting to Discord gateway");
        match tokio_tungstenite::connect_async(settings.gateway_url.as_str()).await {
            Ok((ws_stream, _)) => {
                backoff = Duration::from_secs(1);
                if let Err(err) =
                    run_session(ws_stream, &settings, &dispatcher, &surface, &mut shutdown).await
                {
                    warn!(target: "gateway", error = %err, "gateway session ended");
                }
            }
            Err(e) => {
                warn!(target: "gateway", error = %e, "gateway connect failed");
            }
        }

        if *shutdown.borrow() {
            break;
        }

        debug!(target: "gateway", delay_ms = backoff.as_millis() as u64, "reconnecting");
        tokio::select! {
            _ = tokio::time::sleep(backoff) => {}
            _ = shutdown.changed() => {}
        }
        backoff = (backoff * 2).min(MAX_BACKOFF);
    }

    info!(target: "gateway", "Discord gateway loop exited");
}

async fn run_session(
    ws_stream: WsStream,
    settings: &GatewaySettings,
    dispatcher: &Dispatcher,
    surface: &Arc<dyn ChatSurface>,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<(), String> {
    let (write, mut read) = ws_stream.split();
    let write = Arc::new(Mutex::new(write));
    let seq = Arc::new(AtomicU64::new(0));
    let seq_set = Arc::new(AtomicBool::new(false));

    let mut heartbeat_task: Option<tokio::task::JoinHandle<()>> = None;
    let mut identified = false;
    let mut bot_user_id: Option<String> = None;

    let result = loop {
        tokio::select! {
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break Ok(());
                }
            }
            msg = read.next() => {
                let msg = match msg {
                    Some(Ok(msg)) => msg,
                    Some(Err(e)) => break Err(format!("gateway read failed: {e}")),
                    None => break Ok(()),
                };

                let text = match msg {
                    Message::Text(text) => text,
                    Message::Close(frame) => {
                        debug!(target: "gateway", ?frame, "gateway closed the connection");
                        break Ok(());
                    }
                    _ => continue,
                };

                let payload: GatewayPayload = match serde_json::from_str(&text) {
                    Ok(payload) => payload,
                    Err(e) => {
                        debug!(target: "gateway", error = %e, "unparseable gateway payload");
                        continue;
                    }
                };

                if let Some(s) = payload.s {
                    seq.store(s, Ordering::Relaxed);
                    seq_set.store(true, Ordering::Relaxed);
                }

                match payload.op {
                    OP_HELLO => {
                        let interval_ms = payload
                            .d
                            .as_ref()
                            .and_then(|d| d.get("heartbeat_interval"))
                            .and_then(Value::as_u64)
                            .unwrap_or(45_000);
                        if heartbeat_task.is_none() {
                            heartbeat_task = Some(spawn_heartbeat_task(
                                write.clone(),
                                seq.clone(),
                                seq_set.clone(),
                                Duration::from_millis(interval_ms),
                            ));
                        }
                        if !identified {
                            if let Err(e) = send_identify(&write, settings).await {
                                break Err(e);
                            }
                            identified = true;
                        }
                    }
                    OP_DISPATCH => match payload.t.as_deref() {
                        Some("READY") => {
                            bot_user_id = payload
                                .d
                                .as_ref()
                                .and_then(|d| d.pointer("/user/id"))
                                .and_then(Value::as_str)
                                .map(str::to_string);
                            info!(target: "gateway", bot = ?bot_user_id, "Discord gateway READY");
                        }
                        Some("MESSAGE_CREATE") => {
                            let inbound = payload
                                .d
                                .as_ref()
                                .and_then(|d| parse_message_create(d, bot_user_id.as_deref()));
                            if let Some(inbound) = inbound {
                                spawn_dispatch(dispatcher.clone(), surface.clone(), inbound);
                            }
                        }
                        _ => {}
                    },
                    OP_HEARTBEAT => {
                        let current = current_seq(&seq, &seq_set);
                        if let Err(e) = send_heartbeat(&write, current).await {
                            break Err(e);
                        }
                    }
                    OP_RECONNECT => {
                        warn!(target: "gateway", "Discord gateway requested reconnect");
                        break Ok(());
                    }
                    OP_INVALID_SESSION => {
                        warn!(target: "gateway", "Discord gateway invalid session");
                        tokio::time::sleep(Duration::from_secs(5)).await;
                        if let Err(e) = send_identify(&write, settings).await {
                            break Err(e);
                        }
                    }
                    OP_HEARTBEAT_ACK => {}
                    other => debug!(target: "gateway", op = other, "ignoring gateway op"),
                }
            }
        }
    };

    if let Some(task) = heartbeat_task.take() {
        task.abort();
    }
    result
}

/// Run one command without blocking the read loop.
fn spawn_dispatch(dispatcher: Dispatcher, surface: Arc<dyn ChatSurface>, inbound: InboundMessage) {
    tokio::spawn(async move {
        let outcome = dispatcher
            .handle_message(
                surface,
                &inbound.guild_id,
                &inbound.channel_id,
                &inbound.author_id,
                &inbound.content,
            )
            .await;
        debug!(target: "gateway", ?outcome, "message handled");
    });
}

fn current_seq(seq: &AtomicU64, seq_set: &AtomicBool) -> Option<u64> {
    seq_set
        .load(Ordering::Relaxed)
        .then(|| seq.load(Ordering::Relaxed))
}

fn spawn_heartbeat_task(
    write: Arc<Mutex<WsWrite>>,
    seq: Arc<AtomicU64>,
    seq_set: Arc<AtomicBool>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let current = current_seq(&seq, &seq_set);
            if send_heartbeat(&write, current).await.is_err() {
                break;
            }
        }
    })
}

fn identify_payload(settings: &GatewaySettings) -> Value {
    json!({
        "op": OP_IDENTIFY,
        "d": {
            "token": format_bot_token(&settings.bot_token),
            "intents": settings.intents,
            "properties": {
                "os": std::env::consts::OS,
                "browser": env!("CARGO_PKG_NAME"),
                "device": env!("CARGO_PKG_NAME")
            }
        }
    })
}

async fn send_identify(write: &Arc<Mutex<WsWrite>>, settings: &GatewaySettings) -> Result<(), String> {
    send_json(write, &identify_payload(settings)).await
}

async fn send_heartbeat(write: &Arc<Mutex<WsWrite>>, seq: Option<u64>) -> Result<(), String> {
    send_json(write, &json!({ "op": OP_HEARTBEAT, "d": seq })).await
}

async fn send_json(write: &Arc<Mutex<WsWrite>>, payload: &Value) -> Result<(), String> {
    let text = serde_json::to_string(payload).map_err(|e| e.to_string())?;
    let mut writer = write.lock().await;
    writer
        .send(Message::Text(text.into()))
        .await
        .map_err(|e| e.to_string())
}
