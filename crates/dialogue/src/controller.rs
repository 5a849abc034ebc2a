//! The turn-taking state machine.
//!
//! Two speakers alternate indefinitely. Speaker one opens against the
//! configured opening question; speaker two first sees that answer with
//! a hand-off framing appended; from then on each speaker receives the
//! other's previous answer verbatim. One turn runs to completion before
//! the next begins, and the run only ends through cancellation or a
//! fatal stream failure.

use futures::StreamExt;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::sink::{DisplaySink, SinkStatus};
use symposium_core::{Error, Measure, Result, SessionConfig, Transcript, fit_to_viewport};
use symposium_providers::{
    CancelToken, ChatMessage, ChatRequest, Provider, StreamEvent,
};

/// One dialogue participant: display name, private message history, and
/// the provider that speaks for it.
pub struct Speaker {
    name: String,
    history: Vec<ChatMessage>,
    provider: Arc<dyn Provider>,
}

impl Speaker {
    /// Create a speaker with its history seeded by a system persona.
    pub fn new(name: impl Into<String>, persona: impl Into<String>, provider: Arc<dyn Provider>) -> Self {
        Self {
            name: name.into(),
            history: vec![ChatMessage::system(persona)],
            provider,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read-only view of this speaker's private history.
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }
}

/// How a run ended. Failure and cancellation are different outcomes:
/// stopping the session is expected, a broken stream is not.
#[derive(Debug)]
pub enum RunEnd {
    /// The user stopped the session
    Cancelled,
    /// A provider stream failed; the run stops on the first failure
    Failed(Error),
}

enum TurnOutcome {
    Completed(String),
    Cancelled,
}

/// Drives the unbounded alternating dialogue.
pub struct DialogueController<S: DisplaySink, M: Measure> {
    first: Speaker,
    second: Speaker,
    session: SessionConfig,
    transcript: Transcript,
    sink: S,
    measure: M,
    cancel: CancelToken,
}

impl<S: DisplaySink, M: Measure> DialogueController<S, M> {
    pub fn new(
        first: Speaker, second: Speaker, session: SessionConfig, sink: S, measure: M,
        cancel: CancelToken,
    ) -> Self {
        Self {
            first,
            second,
            session,
            transcript: Transcript::new(),
            sink,
            measure,
            cancel,
        }
    }

    /// The accumulated transcript, available during and after the run.
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Run turns until cancelled or a stream fails.
    pub async fn run(&mut self) -> RunEnd {
        if let Err(e) = self.sink.show("", SinkStatus::Waiting) {
            return RunEnd::Failed(e);
        }

        let mut last_reply = String::new();
        let mut turn: u64 = 0;

        loop {
            if self.cancel.is_cancelled() {
                info!(turns_completed = turn, "dialogue cancelled");
                return RunEnd::Cancelled;
            }

            let prompt = match turn {
                0 => self.session.opening_question.clone(),
                1 => format!("{}\n\n{}", last_reply, self.session.handoff_framing),
                _ => last_reply.clone(),
            };

            let result = if turn % 2 == 0 {
                Self::run_turn(
                    &mut self.first,
                    &mut self.transcript,
                    &mut self.sink,
                    &self.measure,
                    &self.cancel,
                    prompt,
                )
                .await
            } else {
                Self::run_turn(
                    &mut self.second,
                    &mut self.transcript,
                    &mut self.sink,
                    &self.measure,
                    &self.cancel,
                    prompt,
                )
                .await
            };

            match result {
                Ok(TurnOutcome::Completed(reply)) => {
                    last_reply = reply;
                    turn += 1;
                }
                Ok(TurnOutcome::Cancelled) => {
                    info!(turns_completed = turn, "dialogue cancelled mid-turn");
                    return RunEnd::Cancelled;
                }
                Err(e) => {
                    error!(turns_completed = turn, error = %e, "dialogue run failed");
                    if let Error::Stream { speaker, .. } = &e {
                        let speaker = speaker.clone();
                        let window = self.fit_current_window();
                        let _ = self.sink.show(&window, SinkStatus::Failed { speaker: &speaker });
                    }
                    return RunEnd::Failed(e);
                }
            }
        }
    }

    /// One complete turn: prompt the speaker, stream its answer into the
    /// transcript, refit and redraw on every chunk, then fold the finished
    /// block and record the assistant reply in the speaker's history.
    async fn run_turn(
        speaker: &mut Speaker, transcript: &mut Transcript, sink: &mut S, measure: &M,
        cancel: &CancelToken, prompt: String,
    ) -> Result<TurnOutcome> {
        debug!(speaker = %speaker.name, prompt_len = prompt.len(), "starting turn");

        speaker.history.push(ChatMessage::user(prompt));
        let request = ChatRequest::builder().messages(speaker.history.clone()).build();

        transcript.begin_turn(&speaker.name);

        let mut stream = speaker
            .provider
            .stream_chat(request, cancel.clone())
            .await
            .map_err(|e| Error::stream(&speaker.name, e.to_string()))?;

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    transcript.discard_partial();
                    return Ok(TurnOutcome::Cancelled);
                }

                event = stream.next() => match event {
                    Some(StreamEvent::Token(token)) => {
                        if token.is_empty() {
                            continue;
                        }

                        transcript.append_chunk(&token);

                        let candidate = transcript.candidate_display();
                        let viewport = sink.viewport();
                        let window =
                            fit_to_viewport(&candidate, viewport.max_lines, viewport.width, measure);
                        sink.show(window, SinkStatus::Streaming { speaker: &speaker.name })?;
                    }
                    Some(StreamEvent::Error(reason)) => {
                        transcript.discard_partial();
                        return Err(Error::stream(&speaker.name, reason));
                    }
                    Some(StreamEvent::Done) | None => break,
                }
            }
        }

        let block = transcript.fold().ok_or_else(|| {
            Error::stream(&speaker.name, "stream ended before any turn began".to_string())
        })?;
        let reply = block.body.clone();

        debug!(speaker = %speaker.name, reply_len = reply.len(), "turn complete");
        speaker.history.push(ChatMessage::assistant(reply.clone()));

        Ok(TurnOutcome::Completed(reply))
    }

    fn fit_current_window(&self) -> String {
        let candidate = self.transcript.candidate_display();
        let viewport = self.sink.viewport();
        fit_to_viewport(&candidate, viewport.max_lines, viewport.width, &self.measure).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::Viewport;
    use std::sync::Arc;
    use symposium_providers::{MockProvider, MockTurn, Role};

    /// Counts rendered lines as `ceil(chars / width)` per source line.
    struct CharOracle;

    impl Measure for CharOracle {
        fn measure(&self, text: &str, width: u16) -> usize {
            let width = width.max(1) as usize;
            text.split('\n')
                .map(|line| {
                    let chars = line.chars().count();
                    if chars == 0 { 1 } else { chars.div_ceil(width) }
                })
                .sum()
        }
    }

    /// Sink that records every window it is shown and can cancel the run
    /// after a fixed number of chunks.
    struct RecordingSink {
        viewport: Viewport,
        shown: Vec<(String, String)>,
        cancel_after: Option<(usize, CancelToken)>,
    }

    impl RecordingSink {
        fn new(max_lines: usize, width: u16) -> Self {
            Self {
                viewport: Viewport { max_lines, width },
                shown: Vec::new(),
                cancel_after: None,
            }
        }

        fn cancelling_after(mut self, shows: usize, cancel: CancelToken) -> Self {
            self.cancel_after = Some((shows, cancel));
            self
        }
    }

    impl DisplaySink for RecordingSink {
        fn viewport(&self) -> Viewport {
            self.viewport
        }

        fn show(&mut self, window: &str, status: SinkStatus<'_>) -> Result<()> {
            let label = match status {
                SinkStatus::Waiting => "waiting".to_string(),
                SinkStatus::Streaming { speaker } => speaker.to_string(),
                SinkStatus::Failed { speaker } => format!("failed:{}", speaker),
            };
            self.shown.push((window.to_string(), label));

            if let Some((threshold, cancel)) = &self.cancel_after
                && self.shown.len() >= *threshold
            {
                cancel.cancel();
            }
            Ok(())
        }
    }

    fn text_turn(chunks: &[&str]) -> MockTurn {
        MockTurn::Text { chunks: chunks.iter().map(|c| c.to_string()).collect() }
    }

    fn controller_with(
        first_turns: Vec<MockTurn>, second_turns: Vec<MockTurn>, sink: RecordingSink,
        cancel: CancelToken,
    ) -> DialogueController<RecordingSink, CharOracle> {
        let first = Speaker::new(
            "Nietzsche",
            "Respond as Nietzsche.",
            Arc::new(MockProvider::from_turns(first_turns)),
        );
        let second = Speaker::new(
            "Heidegger",
            "Respond as Heidegger.",
            Arc::new(MockProvider::from_turns(second_turns)),
        );
        DialogueController::new(first, second, SessionConfig::default(), sink, CharOracle, cancel)
    }

    #[tokio::test]
    async fn test_run_alternates_and_stops_on_stream_failure() {
        let cancel = CancelToken::new();
        let mut controller = controller_with(
            vec![text_turn(&["Power ", "is will."]), text_turn(&["Becoming."])],
            vec![
                text_turn(&["Being ", "is time."]),
                MockTurn::Error { message: "connection reset".to_string() },
            ],
            RecordingSink::new(100, 80),
            cancel,
        );

        let end = controller.run().await;

        match end {
            RunEnd::Failed(Error::Stream { speaker, reason }) => {
                assert_eq!(speaker, "Heidegger");
                assert_eq!(reason, "connection reset");
            }
            other => panic!("expected stream failure, got {:?}", other),
        }

        // Three completed blocks, strictly alternating.
        let names: Vec<&str> =
            controller.transcript().blocks().iter().map(|b| b.speaker.as_str()).collect();
        assert_eq!(names, ["Nietzsche", "Heidegger", "Nietzsche"]);
        assert!(!controller.transcript().has_partial());

        let first_history = controller.first.history();
        let second_history = controller.second.history();

        // system, user, assistant, user, assistant
        let first_roles: Vec<Role> = first_history.iter().map(|m| m.role).collect();
        assert_eq!(
            first_roles,
            [Role::System, Role::User, Role::Assistant, Role::User, Role::Assistant]
        );

        // The failed turn leaves a dangling user entry and no assistant.
        let second_roles: Vec<Role> = second_history.iter().map(|m| m.role).collect();
        assert_eq!(second_roles, [Role::System, Role::User, Role::Assistant, Role::User]);
    }

    #[tokio::test]
    async fn test_bootstrap_prompts() {
        let cancel = CancelToken::new();
        let mut controller = controller_with(
            vec![text_turn(&["First answer."]), text_turn(&["Third answer."])],
            vec![
                text_turn(&["Second answer."]),
                MockTurn::Error { message: "stop the test".to_string() },
            ],
            RecordingSink::new(100, 80),
            cancel,
        );

        let _ = controller.run().await;

        let session = SessionConfig::default();

        // Turn one: the opening question, verbatim.
        assert_eq!(controller.first.history()[1].content, session.opening_question);

        // Turn two: speaker one's answer with the hand-off framing appended.
        let expected_handoff = format!("First answer.\n\n{}", session.handoff_framing);
        assert_eq!(controller.second.history()[1].content, expected_handoff);

        // Turn three onward: the previous answer, verbatim.
        assert_eq!(controller.first.history()[3].content, "Second answer.");
    }

    #[tokio::test]
    async fn test_cancellation_mid_stream_discards_partial() {
        let cancel = CancelToken::new();
        // The waiting draw plus three chunk draws, then cancel.
        let sink = RecordingSink::new(100, 80).cancelling_after(4, cancel.clone());
        let mut controller = controller_with(
            vec![text_turn(&["one ", "two ", "three ", "four ", "five"])],
            vec![text_turn(&["never reached"])],
            sink,
            cancel,
        );

        let end = controller.run().await;
        assert!(matches!(end, RunEnd::Cancelled));

        // The last window shown holds the three chunks that arrived.
        let (last_window, _) = controller.sink().shown.last().unwrap();
        assert!(last_window.contains("one two three"));

        // The interrupted turn never folded and its partial is gone.
        assert!(controller.transcript().blocks().is_empty());
        assert!(!controller.transcript().has_partial());
        assert!(controller.transcript().log().is_empty());

        // No assistant entry for the cancelled turn.
        let roles: Vec<Role> = controller.first.history().iter().map(|m| m.role).collect();
        assert_eq!(roles, [Role::System, Role::User]);
    }

    #[tokio::test]
    async fn test_pre_cancelled_run_ends_immediately() {
        let cancel = CancelToken::new();
        cancel.cancel();

        let mut controller = controller_with(
            vec![text_turn(&["unused"])],
            vec![text_turn(&["unused"])],
            RecordingSink::new(100, 80),
            cancel,
        );

        let end = controller.run().await;
        assert!(matches!(end, RunEnd::Cancelled));
        assert!(controller.transcript().blocks().is_empty());
    }

    #[tokio::test]
    async fn test_windows_respect_viewport_budget() {
        let cancel = CancelToken::new();
        // Tiny viewport forces truncation almost immediately.
        let sink = RecordingSink::new(2, 10);
        let mut controller = controller_with(
            vec![text_turn(&["alpha beta gamma delta ", "epsilon zeta eta theta"])],
            vec![MockTurn::Error { message: "stop the test".to_string() }],
            sink,
            cancel,
        );

        let _ = controller.run().await;

        let oracle = CharOracle;
        let streamed: Vec<&(String, String)> = controller
            .sink()
            .shown
            .iter()
            .filter(|(_, label)| label == "Nietzsche")
            .collect();
        assert!(!streamed.is_empty());
        for (window, _) in streamed {
            assert!(oracle.measure(window, 10) <= 2, "window exceeded budget: {:?}", window);
        }
    }

    #[tokio::test]
    async fn test_completed_turns_accumulate_in_log() {
        let cancel = CancelToken::new();
        let mut controller = controller_with(
            vec![text_turn(&["A1"])],
            vec![text_turn(&["B1"]), MockTurn::Error { message: "stop".to_string() }],
            RecordingSink::new(100, 80),
            cancel,
        );

        // Second speaker completes one turn, then its provider fails on the
        // next; first speaker answers in between.
        let _ = controller.run().await;

        let log = controller.transcript().log();
        assert!(log.contains("**Nietzsche:**\n\nA1\n\n"));
        assert!(log.contains("**Heidegger:**\n\nB1\n\n"));
    }
}
