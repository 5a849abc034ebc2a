//! Append-only conversation transcript.
//!
//! The transcript owns an ordered sequence of completed turn blocks plus at
//! most one in-progress partial block for the actively streaming speaker.
//! Completed blocks are immutable once folded; only the partial block grows.
//! Each block renders as a bold speaker header, a blank line, and the body.

/// A completed, immutable turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnBlock {
    pub speaker: String,
    pub body: String,
}

#[derive(Debug, Clone)]
struct PartialBlock {
    speaker: String,
    body: String,
}

/// Accumulated conversation log plus the in-progress turn.
///
/// Created empty at process start and never persisted. The candidate
/// display text is rebuilt from scratch on every chunk: prefix truncation
/// shifts wrap points nonlinearly, so no chunk-to-chunk caching is safe.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    blocks: Vec<TurnBlock>,
    log: String,
    partial: Option<PartialBlock>,
}

fn block_header(speaker: &str) -> String {
    format!("**{speaker}:**\n\n")
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a partial block for `speaker`. Any unfolded partial from a
    /// previous turn is discarded.
    pub fn begin_turn(&mut self, speaker: impl Into<String>) {
        self.partial = Some(PartialBlock { speaker: speaker.into(), body: String::new() });
    }

    /// Append a streamed chunk to the open partial block. A chunk arriving
    /// with no open turn is dropped.
    pub fn append_chunk(&mut self, chunk: &str) {
        if let Some(partial) = &mut self.partial {
            partial.body.push_str(chunk);
        }
    }

    /// Fold the partial block into the immutable log at turn completion.
    ///
    /// Returns the completed block, or `None` if no turn was open.
    pub fn fold(&mut self) -> Option<&TurnBlock> {
        let partial = self.partial.take()?;

        self.log.push_str(&block_header(&partial.speaker));
        self.log.push_str(&partial.body);
        self.log.push_str("\n\n");

        self.blocks.push(TurnBlock { speaker: partial.speaker, body: partial.body });
        self.blocks.last()
    }

    /// Drop an interrupted turn without folding it. The discarded text stays
    /// on screen (it was already displayed) but leaves the formal log.
    pub fn discard_partial(&mut self) -> Option<String> {
        self.partial.take().map(|partial| partial.body)
    }

    /// The text handed to the viewport fitter: the accumulated log plus the
    /// in-progress block under its speaker header.
    pub fn candidate_display(&self) -> String {
        match &self.partial {
            Some(partial) => {
                let mut display = String::with_capacity(self.log.len() + partial.body.len() + 16);
                display.push_str(&self.log);
                display.push_str(&block_header(&partial.speaker));
                display.push_str(&partial.body);
                display
            }
            None => self.log.clone(),
        }
    }

    /// The immutable log of folded turns.
    pub fn log(&self) -> &str {
        &self.log
    }

    pub fn blocks(&self) -> &[TurnBlock] {
        &self.blocks
    }

    pub fn has_partial(&self) -> bool {
        self.partial.is_some()
    }

    pub fn partial_body(&self) -> Option<&str> {
        self.partial.as_ref().map(|partial| partial.body.as_str())
    }
}
