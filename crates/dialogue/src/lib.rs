//! Turn-taking for an unbounded two-speaker dialogue.
//!
//! The [`DialogueController`] owns both speakers and the transcript,
//! drives one streamed turn at a time, and pushes fitted transcript
//! windows through the [`DisplaySink`] port. Rendering lives elsewhere;
//! this crate only decides what text the viewport should hold.

pub mod controller;
pub mod sink;

pub use controller::{DialogueController, RunEnd, Speaker};
pub use sink::{DisplaySink, SinkStatus, Viewport};
