//! Streaming chat providers.
//!
//! Each backend implements the [`Provider`] trait: given a chat request
//! and a cancellation token, it returns a stream of [`StreamEvent`]s
//! (tokens, a terminal `Done`, or an error). Cancellation ends the
//! stream quietly; it is never reported as an error.

pub mod adapter;
pub mod mock;
pub mod types;

pub use adapter::{OllamaProvider, OpenAiProvider, Provider, ProviderFactory};
pub use mock::{MockProvider, MockTurn};
pub use types::{CancelToken, ChatMessage, ChatRequest, ChatRequestBuilder, Role, StreamEvent};
