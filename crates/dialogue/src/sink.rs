//! Outbound display port.
//!
//! The controller never touches the terminal directly; it hands each
//! fitted window to a [`DisplaySink`] together with a status describing
//! who is speaking. The sink reports its current viewport budget on
//! demand so the controller stays correct across terminal resizes.

use symposium_core::Result;

/// The text budget of the conversation region: how many rendered lines
/// fit, and at what wrap width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    /// Maximum rendered lines the region can hold
    pub max_lines: usize,
    /// Wrap width in terminal columns
    pub width: u16,
}

/// What the stage should convey alongside the transcript window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkStatus<'a> {
    /// No turn in flight yet
    Waiting,
    /// Named speaker is streaming a response
    Streaming { speaker: &'a str },
    /// The run ended after a stream failure from the named speaker
    Failed { speaker: &'a str },
}

/// Where fitted transcript windows go.
pub trait DisplaySink {
    /// Current conversation-region budget, re-queried every chunk.
    fn viewport(&self) -> Viewport;

    /// Present the fitted window. Called once per received chunk.
    fn show(&mut self, window: &str, status: SinkStatus<'_>) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_copy_semantics() {
        let viewport = Viewport { max_lines: 10, width: 80 };
        let copy = viewport;
        assert_eq!(viewport, copy);
    }

    #[test]
    fn test_sink_status_carries_speaker() {
        let status = SinkStatus::Streaming { speaker: "Nietzsche" };
        assert!(matches!(status, SinkStatus::Streaming { speaker } if speaker == "Nietzsche"));
    }
}
