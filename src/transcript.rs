/// A finalized (source speech, Malayalam translation) pair. Immutable once
/// appended to history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    pub user: String,
    pub translation: String,
}

/// Collects incremental transcription deltas until a turn completes.
///
/// State is a pure function of the ordered append calls since the last
/// reset; only the session event stream mutates it, so no locking.
#[derive(Debug, Default)]
pub struct TranscriptAccumulator {
    input: String,
    output: String,
}

impl TranscriptAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Monotonic append, never truncates.
    pub fn append_input(&mut self, text: &str) {
        self.input.push_str(text);
    }

    pub fn append_output(&mut self, text: &str) {
        self.output.push_str(text);
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    /// Commits a record iff at least one buffer has non-whitespace
    /// content. Both buffers are cleared either way.
    pub fn commit_if_non_blank(&mut self) -> Option<HistoryRecord> {
        let user = std::mem::take(&mut self.input);
        let translation = std::mem::take(&mut self.output);

        if user.trim().is_empty() && translation.trim().is_empty() {
            return None;
        }
        Some(HistoryRecord { user, translation })
    }

    pub fn clear(&mut self) {
        self.input.clear();
        self.output.clear();
    }
}
