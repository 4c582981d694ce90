use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::audio::pipeline::CapturePipeline;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::oneshot::FileTranscriber;
use crate::session::event::{EpisodeEvent, SessionEvent};
use crate::session::live::LiveSession;
use crate::transcript::{HistoryRecord, TranscriptAccumulator};

/// What a frontend renders: live text mirrors, phase flags, latest error.
#[derive(Debug, Default)]
pub struct ClientView {
    pub current_input: String,
    pub current_output: String,
    pub connecting: bool,
    pub recording: bool,
    pub busy: bool,
    pub error: Option<String>,
}

/// Owns one recording episode at a time: the capture pipeline, the live
/// session, the transcript accumulator, and the history log.
///
/// All mutation happens on the caller's driving loop, either through
/// `start`/`stop` or through `handle_event` with events drained from the
/// receiver returned by `new`. That single-consumer discipline is the
/// whole concurrency story; there are no locks here.
pub struct SessionManager {
    config: ClientConfig,
    episode: u64,
    pipeline: Option<CapturePipeline>,
    session: Option<LiveSession>,
    accumulator: TranscriptAccumulator,
    history: Vec<HistoryRecord>,
    view: ClientView,
    event_tx: mpsc::Sender<EpisodeEvent>,
}

impl SessionManager {
    pub fn new(config: ClientConfig) -> (Self, mpsc::Receiver<EpisodeEvent>) {
        let (event_tx, event_rx) = mpsc::channel(64);
        let manager = Self {
            config,
            episode: 0,
            pipeline: None,
            session: None,
            accumulator: TranscriptAccumulator::new(),
            history: Vec::new(),
            view: ClientView::default(),
            event_tx,
        };
        (manager, event_rx)
    }

    pub fn view(&self) -> &ClientView {
        &self.view
    }

    /// Insertion-ordered, append-only.
    pub fn history(&self) -> &[HistoryRecord] {
        &self.history
    }

    pub fn current_episode(&self) -> u64 {
        self.episode
    }

    pub fn is_active(&self) -> bool {
        self.view.connecting || self.session.is_some() || self.pipeline.is_some()
    }

    /// True when every resource handle is back at its empty sentinel.
    pub fn is_idle(&self) -> bool {
        self.session.is_none() && self.pipeline.is_none() && !self.view.connecting
    }

    /// Begins a recording episode: microphone first (a permission failure
    /// aborts before any session exists), then the live session. Frames
    /// start flowing only once the service acknowledges setup (`Open`).
    ///
    /// A start while an episode is active supersedes it: the previous
    /// episode is fully stopped first. Callers drive this from a single
    /// loop, so two starts cannot interleave.
    pub async fn start(&mut self) -> Result<(), ClientError> {
        if self.is_active() {
            info!("start while active: stopping previous episode");
            self.stop();
        }
        self.view.error = None;
        self.view.connecting = true;

        let pipeline = match CapturePipeline::open() {
            Ok(p) => p,
            Err(e) => {
                // Abort startup; nothing else changed yet.
                self.view.connecting = false;
                self.view.error = Some(e.to_string());
                return Err(e);
            }
        };

        match LiveSession::connect(&self.config, self.episode, self.event_tx.clone()).await {
            Ok(session) => {
                info!("episode {} awaiting open (session {})", self.episode, session.id());
                self.pipeline = Some(pipeline);
                self.session = Some(session);
                Ok(())
            }
            Err(e) => {
                drop(pipeline);
                self.view.connecting = false;
                self.view.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Applies one inbound event. Events from any episode other than the
    /// current one are stale completions and are discarded.
    pub fn handle_event(&mut self, ev: EpisodeEvent) {
        if ev.episode != self.episode {
            debug!("discarding stale event from episode {}", ev.episode);
            return;
        }
        match ev.event {
            SessionEvent::Open => {
                self.view.connecting = false;
                self.view.recording = true;
                if let (Some(pipeline), Some(session)) = (&mut self.pipeline, &self.session) {
                    pipeline.begin(session.frame_sender());
                }
            }
            SessionEvent::InputDelta(text) => {
                self.accumulator.append_input(&text);
                self.view.current_input = self.accumulator.input().to_string();
            }
            SessionEvent::OutputDelta(text) => {
                self.accumulator.append_output(&text);
                self.view.current_output = self.accumulator.output().to_string();
            }
            SessionEvent::TurnComplete => {
                if let Some(record) = self.accumulator.commit_if_non_blank() {
                    self.history.push(record);
                }
                self.view.current_input.clear();
                self.view.current_output.clear();
            }
            SessionEvent::Error(message) => {
                warn!("session error: {}", message);
                self.view.error = Some(message);
                self.stop();
            }
            SessionEvent::Closed => {
                // Teardown is owned by stop and the error path.
                debug!("session closed");
            }
        }
    }

    /// Idempotent teardown. A partial transcript that never saw its turn
    /// boundary is committed so manual stops do not drop spoken content.
    /// Safe with no prior start and safe to repeat.
    pub fn stop(&mut self) {
        if let Some(record) = self.accumulator.commit_if_non_blank() {
            self.history.push(record);
        }
        self.view.current_input.clear();
        self.view.current_output.clear();

        // Session first: cancelling it releases the frame channel, so the
        // capture worker can never be left blocked on a stalled send while
        // we join it below.
        if let Some(session) = self.session.take() {
            session.close();
        }
        if let Some(mut pipeline) = self.pipeline.take() {
            pipeline.stop();
        }

        self.view.recording = false;
        self.view.connecting = false;
        // Anything still in flight belongs to a dead episode now.
        self.episode += 1;
    }

    /// One-shot file path: single request/response, same record shape,
    /// no session to tear down on failure.
    pub async fn transcribe_file(
        &mut self,
        transcriber: &FileTranscriber,
        bytes: &[u8],
        mime_type: &str,
    ) -> Result<(), ClientError> {
        self.view.busy = true;
        self.view.error = None;

        let result = transcriber.transcribe(bytes, mime_type).await;
        self.view.busy = false;

        match result {
            Ok(record) => {
                self.apply_file_record(record);
                Ok(())
            }
            Err(e) => {
                self.view.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Appends a finished one-shot record and mirrors it into the live
    /// text panes.
    pub fn apply_file_record(&mut self, record: HistoryRecord) {
        self.view.current_input = record.user.clone();
        self.view.current_output = record.translation.clone();
        self.history.push(record);
    }
}
