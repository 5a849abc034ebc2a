use symposium_core::Measure;

use crate::markdown::render_markdown;

/// The rendered-height oracle: how many terminal lines a markdown text
/// occupies at a given wrap width.
///
/// This is the expensive measurement the viewport fitter binary-searches
/// against. It must agree exactly with what the sink draws, so it counts
/// the output of the same renderer.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownMeasure;

impl Measure for MarkdownMeasure {
    fn measure(&self, text: &str, width: u16) -> usize {
        render_markdown(text, width).len()
    }
}
