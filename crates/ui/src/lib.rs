//! Terminal rendering for the symposium stage.
//!
//! Markdown goes in, styled ratatui lines come out; the same renderer
//! backs both drawing and the viewport-height oracle so the fitter's
//! measurements match what actually lands on screen.

pub mod layout;
pub mod markdown;
pub mod measure;
pub mod sink;
pub mod terminal;
pub mod theme;

pub use layout::StageLayout;
pub use markdown::render_markdown;
pub use measure::MarkdownMeasure;
pub use sink::{StageInfo, TerminalSink};
pub use terminal::{StageTerminal, TerminalGuard};
pub use theme::Theme;
