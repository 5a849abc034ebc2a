//! Markdown rendering to styled terminal lines.
//!
//! The transcript arrives as markdown (speaker headers are `**bold**`,
//! models freely emit lists and code fences). Rendering and measuring
//! must agree exactly, so both go through [`render_markdown`]: the
//! viewport oracle counts the lines this function produces.

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::theme::Theme;

/// Render markdown to wrapped, styled lines at the given width.
pub fn render_markdown(text: &str, width: u16) -> Vec<Line<'static>> {
    let max_width = (width as usize).max(1);

    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(text, options);

    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut segments: Vec<(String, Style)> = Vec::new();
    let mut style_stack: Vec<Style> = vec![Theme::text()];
    let mut in_code_block = false;
    let mut code_buffer = String::new();
    let mut list_depth: usize = 0;
    let mut item_prefix: Option<String> = None;

    for event in parser {
        match event {
            Event::Start(Tag::Heading { .. }) => {
                style_stack.push(Theme::text().add_modifier(Modifier::BOLD));
            }
            Event::End(TagEnd::Heading(_)) => {
                style_stack.pop();
                flush_block(&mut lines, &mut segments, max_width, item_prefix.take());
                lines.push(Line::default());
            }
            Event::End(TagEnd::Paragraph) => {
                flush_block(&mut lines, &mut segments, max_width, item_prefix.take());
                if list_depth == 0 {
                    lines.push(Line::default());
                }
            }
            Event::Start(Tag::List(_)) => {
                list_depth += 1;
            }
            Event::End(TagEnd::List(_)) => {
                list_depth = list_depth.saturating_sub(1);
                if list_depth == 0 {
                    lines.push(Line::default());
                }
            }
            Event::Start(Tag::Item) => {
                let indent = "  ".repeat(list_depth.saturating_sub(1));
                item_prefix = Some(format!("{indent}• "));
            }
            Event::End(TagEnd::Item) => {
                flush_block(&mut lines, &mut segments, max_width, item_prefix.take());
            }
            Event::Start(Tag::Strong) => {
                let current = current_style(&style_stack);
                style_stack.push(current.add_modifier(Modifier::BOLD));
            }
            Event::End(TagEnd::Strong) => {
                style_stack.pop();
            }
            Event::Start(Tag::Emphasis) => {
                let current = current_style(&style_stack);
                style_stack.push(current.add_modifier(Modifier::ITALIC));
            }
            Event::End(TagEnd::Emphasis) => {
                style_stack.pop();
            }
            Event::Start(Tag::CodeBlock(_)) => {
                flush_block(&mut lines, &mut segments, max_width, item_prefix.take());
                in_code_block = true;
                code_buffer.clear();
            }
            Event::End(TagEnd::CodeBlock) => {
                in_code_block = false;
                // Code is shown verbatim, never word-wrapped.
                for code_line in code_buffer.lines() {
                    lines.push(Line::from(Span::styled(code_line.to_string(), Theme::muted())));
                }
                lines.push(Line::default());
            }
            Event::Text(text) => {
                if in_code_block {
                    code_buffer.push_str(&text);
                } else {
                    segments.push((text.to_string(), current_style(&style_stack)));
                }
            }
            Event::Code(code) => {
                segments.push((code.to_string(), Theme::muted()));
            }
            Event::SoftBreak => {
                segments.push((" ".to_string(), current_style(&style_stack)));
            }
            Event::HardBreak => {
                flush_block(&mut lines, &mut segments, max_width, item_prefix.clone());
            }
            Event::Rule => {
                flush_block(&mut lines, &mut segments, max_width, item_prefix.take());
                lines.push(Line::from(Span::styled("─".repeat(max_width), Theme::muted())));
                lines.push(Line::default());
            }
            _ => {}
        }
    }

    flush_block(&mut lines, &mut segments, max_width, item_prefix.take());

    while lines.last().is_some_and(|line| line.spans.is_empty()) {
        lines.pop();
    }

    lines
}

fn current_style(stack: &[Style]) -> Style {
    stack.last().copied().unwrap_or_default()
}

/// Word-wrap the accumulated block into lines, preserving per-word
/// styles. Overlong words are hard-split at the wrap width.
fn flush_block(
    lines: &mut Vec<Line<'static>>, segments: &mut Vec<(String, Style)>, max_width: usize,
    prefix: Option<String>,
) {
    let prefix = prefix.unwrap_or_default();
    if segments.is_empty() {
        if !prefix.is_empty() {
            lines.push(Line::from(Span::raw(prefix)));
        }
        return;
    }

    let mut words: Vec<(String, Style)> = Vec::new();
    for (text, style) in segments.drain(..) {
        for word in text.split_whitespace() {
            words.push((word.to_string(), style));
        }
    }

    let indent = " ".repeat(prefix.width());
    let available = max_width.saturating_sub(prefix.width()).max(1);

    let mut wrapped: Vec<Vec<Span<'static>>> = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    let mut current_width = 0usize;

    for (word, style) in words {
        let word_width = word.width();
        let space_width = if current.is_empty() { 0 } else { 1 };

        if current_width + space_width + word_width > available {
            if !current.is_empty() {
                wrapped.push(std::mem::take(&mut current));
                current_width = 0;
            }

            if word_width > available {
                let mut chunk = String::new();
                let mut chunk_width = 0usize;

                for ch in word.chars() {
                    let ch_width = ch.width().unwrap_or(0);
                    if chunk_width + ch_width > available && !chunk.is_empty() {
                        wrapped.push(vec![Span::styled(std::mem::take(&mut chunk), style)]);
                        chunk_width = 0;
                    }
                    chunk.push(ch);
                    chunk_width += ch_width;
                }

                if !chunk.is_empty() {
                    current_width = chunk.width();
                    current.push(Span::styled(chunk, style));
                }
                continue;
            }
        }

        if !current.is_empty() {
            current.push(Span::raw(" "));
            current_width += 1;
        }
        current_width += word_width;
        current.push(Span::styled(word, style));
    }

    if !current.is_empty() {
        wrapped.push(current);
    }

    if wrapped.is_empty() {
        if !prefix.is_empty() {
            lines.push(Line::from(Span::raw(prefix)));
        }
        return;
    }

    for (i, mut spans) in wrapped.into_iter().enumerate() {
        let lead = if i == 0 { prefix.clone() } else { indent.clone() };
        if !lead.is_empty() {
            spans.insert(0, Span::raw(lead));
        }
        lines.push(Line::from(spans));
    }
}
