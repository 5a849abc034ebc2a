//! Scripted provider for tests and offline demos.

use futures::stream::Stream;
use serde::Deserialize;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::adapter::Provider;
use crate::types::{CancelToken, ChatRequest, StreamEvent};
use symposium_core::{Error, Result};

/// One scripted turn from a mock responses file
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MockTurn {
    /// Emit these chunks as tokens, then Done
    Text { chunks: Vec<String> },
    /// Emit a stream error
    Error { message: String },
}

#[derive(Debug, Deserialize)]
struct MockScript {
    #[serde(default)]
    turns: Vec<MockTurn>,
}

/// Provider that replays scripted turns instead of calling a backend.
///
/// Turns are consumed in order; once exhausted, a fixed placeholder
/// response repeats so unbounded dialogues keep running.
pub struct MockProvider {
    turns: Vec<MockTurn>,
    cursor: AtomicUsize,
}

impl MockProvider {
    /// Load scripted turns from a TOML file, or fall back to the
    /// built-in placeholder when no file is given.
    pub fn new(responses_file: Option<String>) -> Self {
        let turns = responses_file
            .and_then(|path| Self::load_script(&path).ok())
            .unwrap_or_default();
        Self { turns, cursor: AtomicUsize::new(0) }
    }

    /// Build a provider from explicit turns (used by tests).
    pub fn from_turns(turns: Vec<MockTurn>) -> Self {
        Self { turns, cursor: AtomicUsize::new(0) }
    }

    fn load_script(path: &str) -> Result<Vec<MockTurn>> {
        let content = std::fs::read_to_string(path)?;
        let script: MockScript = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("mock responses parse error: {}", e)))?;
        Ok(script.turns)
    }

    fn next_turn(&self) -> MockTurn {
        let index = self.cursor.fetch_add(1, Ordering::SeqCst);
        match self.turns.get(index) {
            Some(turn) => turn.clone(),
            None => MockTurn::Text {
                chunks: vec![
                    "I have nothing further ".to_string(),
                    "to add at this time.".to_string(),
                ],
            },
        }
    }
}

#[async_trait::async_trait]
impl Provider for MockProvider {
    async fn stream_chat<'a>(
        &'a self, _request: ChatRequest, cancel_token: CancelToken,
    ) -> Result<Pin<Box<dyn Stream<Item = StreamEvent> + Send + 'a>>> {
        let turn = self.next_turn();

        let stream = async_stream::stream! {
            match turn {
                MockTurn::Text { chunks } => {
                    for chunk in chunks {
                        if cancel_token.is_cancelled() {
                            return;
                        }
                        yield StreamEvent::Token(chunk);
                        tokio::task::yield_now().await;
                    }
                    yield StreamEvent::Done;
                }
                MockTurn::Error { message } => {
                    yield StreamEvent::Error(message);
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn collect_events(provider: &MockProvider) -> Vec<StreamEvent> {
        tokio_test::block_on(async {
            let stream = provider
                .stream_chat(ChatRequest::builder().build(), CancelToken::new())
                .await
                .unwrap();
            stream.collect().await
        })
    }

    #[test]
    fn test_scripted_text_turn() {
        let provider = MockProvider::from_turns(vec![MockTurn::Text {
            chunks: vec!["Thus ".to_string(), "spoke ".to_string(), "Zarathustra.".to_string()],
        }]);

        let events = collect_events(&provider);
        assert_eq!(events.len(), 4);
        assert!(matches!(&events[0], StreamEvent::Token(t) if t == "Thus "));
        assert!(matches!(&events[3], StreamEvent::Done));
    }

    #[test]
    fn test_scripted_error_turn() {
        let provider =
            MockProvider::from_turns(vec![MockTurn::Error { message: "connection refused".to_string() }]);

        let events = collect_events(&provider);
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], StreamEvent::Error(m) if m == "connection refused"));
    }

    #[test]
    fn test_turns_consumed_in_order_then_placeholder() {
        let provider = MockProvider::from_turns(vec![
            MockTurn::Text { chunks: vec!["first".to_string()] },
            MockTurn::Text { chunks: vec!["second".to_string()] },
        ]);

        let first = collect_events(&provider);
        let second = collect_events(&provider);
        let third = collect_events(&provider);

        assert!(matches!(&first[0], StreamEvent::Token(t) if t == "first"));
        assert!(matches!(&second[0], StreamEvent::Token(t) if t == "second"));
        assert!(matches!(&third[0], StreamEvent::Token(t) if t.contains("nothing further")));
        assert!(matches!(third.last(), Some(StreamEvent::Done)));
    }

    #[test]
    fn test_cancelled_stream_ends_early() {
        let provider = MockProvider::from_turns(vec![MockTurn::Text {
            chunks: vec!["a".to_string(), "b".to_string()],
        }]);

        let cancel = CancelToken::new();
        cancel.cancel();

        let events: Vec<StreamEvent> = tokio_test::block_on(async {
            let stream = provider
                .stream_chat(ChatRequest::builder().build(), cancel)
                .await
                .unwrap();
            stream.collect().await
        });

        assert!(events.is_empty());
    }

    #[test]
    fn test_script_file_loading() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("responses.toml");
        std::fs::write(
            &path,
            r#"
[[turns]]
type = "text"
chunks = ["scripted ", "reply"]

[[turns]]
type = "error"
message = "boom"
"#,
        )
        .unwrap();

        let provider = MockProvider::new(Some(path.to_string_lossy().to_string()));
        let events = collect_events(&provider);
        assert!(matches!(&events[0], StreamEvent::Token(t) if t == "scripted "));

        let events = collect_events(&provider);
        assert!(matches!(&events[0], StreamEvent::Error(m) if m == "boom"));
    }
}
