use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::audio::encoder::EncodedFrame;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::session::event::{EpisodeEvent, SessionEvent};
use crate::session::wire;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, tungstenite::Message>;
type WsSource = SplitStream<WsStream>;

// A stalled handshake would otherwise hang the connecting state forever.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
const FRAME_CHANNEL_DEPTH: usize = 32;

/// One bidirectional connection to the translation service.
///
/// Two tasks own the socket halves: the send task forwards encoded frames
/// FIFO from the frame channel, the recv task turns inbound JSON into
/// episode-tagged events. `close` is cooperative (cancellation token);
/// calling it more than once is harmless.
pub struct LiveSession {
    id: Uuid,
    frame_tx: mpsc::Sender<EncodedFrame>,
    cancel: CancellationToken,
}

impl LiveSession {
    /// Dials the service and performs the setup handshake. Returns once
    /// setup is SENT; the service's acknowledgement arrives later as
    /// `SessionEvent::Open` on `event_tx`, and no frames are transmitted
    /// until the caller reacts to it.
    pub async fn connect(
        config: &ClientConfig,
        episode: u64,
        event_tx: mpsc::Sender<EpisodeEvent>,
    ) -> Result<Self, ClientError> {
        let url = wire::live_url(&config.api_key);

        let connect = tokio::time::timeout(CONNECT_TIMEOUT, connect_async(url));
        let (ws, _) = connect
            .await
            .map_err(|_| ClientError::Transport("connect timed out".into()))?
            .map_err(ClientError::transport)?;

        let (mut ws_tx, ws_rx) = ws.split();

        let setup = wire::setup_message(&config.live_model);
        let text = serde_json::to_string(&setup).map_err(ClientError::transport)?;
        ws_tx
            .send(tungstenite::Message::Text(text))
            .await
            .map_err(ClientError::transport)?;

        let id = Uuid::new_v4();
        info!("live session {} connected (episode {})", id, episode);

        let (frame_tx, frame_rx) = mpsc::channel(FRAME_CHANNEL_DEPTH);
        let cancel = CancellationToken::new();

        tokio::spawn(send_task(
            ws_tx,
            frame_rx,
            event_tx.clone(),
            episode,
            cancel.clone(),
        ));
        tokio::spawn(recv_task(ws_rx, event_tx, episode, cancel.clone()));

        Ok(Self {
            id,
            frame_tx,
            cancel,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Handle the pipeline uses to submit frames, FIFO.
    pub fn frame_sender(&self) -> mpsc::Sender<EncodedFrame> {
        self.frame_tx.clone()
    }

    /// Cooperative close: both tasks notice the token and wind down; the
    /// send task issues the WebSocket close frame on its way out.
    pub fn close(self) {
        debug!("live session {} closing", self.id);
        self.cancel.cancel();
    }
}

async fn send_task(
    mut ws_tx: WsSink,
    mut frame_rx: mpsc::Receiver<EncodedFrame>,
    event_tx: mpsc::Sender<EpisodeEvent>,
    episode: u64,
    cancel: CancellationToken,
) {
    let mut sent: u64 = 0;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            frame = frame_rx.recv() => {
                let Some(frame) = frame else { break };
                let msg = wire::realtime_input(frame);
                let text = match serde_json::to_string(&msg) {
                    Ok(t) => t,
                    Err(e) => {
                        warn!("frame serialization failed: {}", e);
                        continue;
                    }
                };
                if let Err(e) = ws_tx.send(tungstenite::Message::Text(text)).await {
                    // A failed frame send is a session-level error.
                    let _ = event_tx
                        .send(EpisodeEvent::new(
                            episode,
                            SessionEvent::Error(format!("audio send failed: {e}")),
                        ))
                        .await;
                    break;
                }
                sent += 1;
            }
        }
    }
    // Release the frame channel first so the capture worker unblocks even
    // if the socket close below stalls on a dead network.
    drop(frame_rx);
    // Closing an already-closed socket means "nothing to do".
    if let Err(e) = ws_tx.close().await {
        debug!("socket close after {} frames: {}", sent, e);
    }
}

async fn recv_task(
    mut ws_rx: WsSource,
    event_tx: mpsc::Sender<EpisodeEvent>,
    episode: u64,
    cancel: CancellationToken,
) {
    loop {
        let msg = tokio::select! {
            _ = cancel.cancelled() => break,
            msg = ws_rx.next() => msg,
        };
        let msg = match msg {
            None => {
                let _ = event_tx
                    .send(EpisodeEvent::new(episode, SessionEvent::Closed))
                    .await;
                break;
            }
            Some(Err(e)) => {
                let _ = event_tx
                    .send(EpisodeEvent::new(
                        episode,
                        SessionEvent::Error(format!("session error: {e}")),
                    ))
                    .await;
                break;
            }
            Some(Ok(m)) => m,
        };

        // The service delivers JSON in both text and binary frames.
        let text = match msg {
            tungstenite::Message::Text(t) => t,
            tungstenite::Message::Binary(b) => match String::from_utf8(b) {
                Ok(t) => t,
                Err(_) => {
                    debug!("dropping non-utf8 binary frame");
                    continue;
                }
            },
            tungstenite::Message::Close(frame) => {
                if let Some(frame) = frame {
                    debug!("remote close: {} {}", frame.code, frame.reason);
                }
                let _ = event_tx
                    .send(EpisodeEvent::new(episode, SessionEvent::Closed))
                    .await;
                break;
            }
            _ => continue,
        };

        match serde_json::from_str::<wire::ServerMessage>(&text) {
            Ok(parsed) => {
                for event in parsed.into_events() {
                    if event_tx.send(EpisodeEvent::new(episode, event)).await.is_err() {
                        return;
                    }
                }
            }
            Err(e) => {
                // Unknown message kinds are fine to skip; the protocol
                // grows fields we do not consume.
                debug!("unparsed service message: {}", e);
            }
        }
    }
}
