/// Inbound session lifecycle and content events, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Service acknowledged setup; frames may flow.
    Open,
    /// Partial transcription of the user's speech.
    InputDelta(String),
    /// Partial transcription of the translated reply.
    OutputDelta(String),
    /// The current utterance/response exchange finished.
    TurnComplete,
    /// Session-level failure (connect, send, or service error).
    Error(String),
    /// Remote closed the channel. Teardown is driven elsewhere.
    Closed,
}

/// An event stamped with the episode it belongs to.
///
/// Asynchronous completions can land after the episode that spawned them
/// has been stopped; the manager accepts only the current episode and
/// discards the rest, so a late send or receive can never resurrect
/// cleared state.
#[derive(Debug, Clone)]
pub struct EpisodeEvent {
    pub episode: u64,
    pub event: SessionEvent,
}

impl EpisodeEvent {
    pub fn new(episode: u64, event: SessionEvent) -> Self {
        Self { episode, event }
    }
}
