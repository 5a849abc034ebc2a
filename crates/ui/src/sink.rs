//! The ratatui display sink.
//!
//! Draws the whole stage every time the controller hands it a window:
//! title line, the two persona panels, the two seed-prompt panels, and
//! the conversation region holding the fitted transcript window. The
//! viewport budget is recomputed from the live terminal size on every
//! query, so resizes take effect on the next chunk.

use ratatui::Frame;
use ratatui::Terminal;
use ratatui::backend::Backend;
use ratatui::layout::{Alignment, Rect, Size};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::layout::StageLayout;
use crate::markdown::render_markdown;
use crate::theme::Theme;
use symposium_core::{Config, Result};
use symposium_dialogue::{DisplaySink, SinkStatus, Viewport};

/// Static stage content: everything drawn besides the live window.
#[derive(Debug, Clone)]
pub struct StageInfo {
    pub first_name: String,
    pub first_model: String,
    pub first_persona: String,
    pub second_name: String,
    pub second_model: String,
    pub second_persona: String,
    pub opening_question: String,
    pub handoff_framing: String,
    pub setup_padding: u16,
    pub seed_height: u16,
}

impl StageInfo {
    pub fn from_config(config: &Config) -> Self {
        Self {
            first_name: config.speakers.first.name.clone(),
            first_model: config.speakers.first.provider.model_label().to_string(),
            first_persona: config.speakers.first.persona.trim().to_string(),
            second_name: config.speakers.second.name.clone(),
            second_model: config.speakers.second.provider.model_label().to_string(),
            second_persona: config.speakers.second.persona.trim().to_string(),
            opening_question: config.session.opening_question.clone(),
            handoff_framing: config.session.handoff_framing.clone(),
            setup_padding: config.layout.setup_padding,
            seed_height: config.layout.seed_height,
        }
    }

    /// Stage regions for a terminal of this size.
    pub fn layout(&self, area: Rect) -> StageLayout {
        let panel_width = area.width / 2;
        let setup_height = StageLayout::role_panel_height(
            &self.first_persona,
            &self.second_persona,
            panel_width,
            self.setup_padding,
        );
        StageLayout::calculate(area, setup_height, self.seed_height)
    }
}

/// Terminal-backed implementation of the controller's display port.
pub struct TerminalSink<B: Backend> {
    terminal: Terminal<B>,
    stage: StageInfo,
}

impl<B: Backend> TerminalSink<B> {
    pub fn new(terminal: Terminal<B>, stage: StageInfo) -> Self {
        Self { terminal, stage }
    }

    pub fn into_terminal(self) -> Terminal<B> {
        self.terminal
    }

    #[cfg(test)]
    fn backend(&self) -> &B {
        self.terminal.backend()
    }
}

impl<B: Backend> DisplaySink for TerminalSink<B>
where
    symposium_core::Error: From<B::Error>,
{
    fn viewport(&self) -> Viewport {
        let size = self.terminal.size().unwrap_or(Size { width: 80, height: 24 });
        let area = Rect::new(0, 0, size.width, size.height);
        let conversation = self.stage.layout(area).conversation;

        Viewport {
            max_lines: conversation.height.saturating_sub(2) as usize,
            width: conversation.width.saturating_sub(2),
        }
    }

    fn show(&mut self, window: &str, status: SinkStatus<'_>) -> Result<()> {
        let stage = &self.stage;

        self.terminal.draw(|frame| {
            let layout = stage.layout(frame.area());

            let title = format!("{} vs {}", stage.first_name, stage.second_name);
            frame.render_widget(
                Paragraph::new(Line::styled(title, Theme::title())).alignment(Alignment::Center),
                layout.title,
            );

            render_role_panel(frame, layout.first_role, &stage.first_name, &stage.first_model, &stage.first_persona);
            render_role_panel(frame, layout.second_role, &stage.second_name, &stage.second_model, &stage.second_persona);

            render_seed_panel(frame, layout.first_seed, "Opening Question", &stage.opening_question);
            render_seed_panel(frame, layout.second_seed, "Hand-off Framing", &stage.handoff_framing);

            let (border_style, conversation_title) = match status {
                SinkStatus::Waiting => (Theme::conversation(), "Conversation".to_string()),
                SinkStatus::Streaming { speaker } => {
                    (Theme::conversation(), format!("Conversation: {} is speaking", speaker))
                }
                SinkStatus::Failed { speaker } => {
                    (Theme::error(), format!("Conversation: stream from {} failed", speaker))
                }
            };

            let inner_width = layout.conversation.width.saturating_sub(2);
            let lines = render_markdown(window, inner_width);
            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(conversation_title);
            frame.render_widget(Paragraph::new(lines).block(block), layout.conversation);
        })?;

        Ok(())
    }
}

fn render_role_panel(frame: &mut Frame, area: Rect, name: &str, model: &str, persona: &str) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Theme::setup())
        .title(format!("{} ({})", name, model));
    frame.render_widget(
        Paragraph::new(persona.to_string()).style(Theme::text()).wrap(Wrap { trim: true }).block(block),
        area,
    );
}

fn render_seed_panel(frame: &mut Frame, area: Rect, title: &str, text: &str) {
    let block = Block::default().borders(Borders::ALL).border_style(Theme::setup()).title(title.to_string());
    frame.render_widget(
        Paragraph::new(text.to_string()).style(Theme::muted()).wrap(Wrap { trim: true }).block(block),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;

    fn test_stage() -> StageInfo {
        StageInfo {
            first_name: "Nietzsche".to_string(),
            first_model: "gemma3:27b".to_string(),
            first_persona: "Respond as Nietzsche.".to_string(),
            second_name: "Heidegger".to_string(),
            second_model: "gpt-oss:20b".to_string(),
            second_persona: "Respond as Heidegger.".to_string(),
            opening_question: "State your position.".to_string(),
            handoff_framing: "Respond to your interlocutor.".to_string(),
            setup_padding: 2,
            seed_height: 7,
        }
    }

    fn test_sink(width: u16, height: u16) -> TerminalSink<TestBackend> {
        let terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        TerminalSink::new(terminal, test_stage())
    }

    fn screen_text(sink: &TerminalSink<TestBackend>) -> String {
        sink.backend().buffer().content.iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn test_viewport_excludes_setup_and_borders() {
        let sink = test_sink(80, 30);

        // One-line personas: 1 + 2 borders + 2 padding = 5 setup rows.
        // Conversation: 30 - 1 title - 5 setup - 7 seed = 17 rows, minus
        // its own borders.
        let viewport = sink.viewport();
        assert_eq!(viewport.max_lines, 15);
        assert_eq!(viewport.width, 78);
    }

    #[test]
    fn test_show_renders_window_and_speaker() {
        let mut sink = test_sink(80, 30);
        sink.show(
            "**Nietzsche:**\n\nGod is dead.",
            SinkStatus::Streaming { speaker: "Nietzsche" },
        )
        .unwrap();

        let screen = screen_text(&sink);
        assert!(screen.contains("God is dead."));
        assert!(screen.contains("is speaking"));
        assert!(screen.contains("Opening Question"));
        assert!(screen.contains("Nietzsche vs Heidegger"));
    }

    #[test]
    fn test_show_waiting_and_failed_titles() {
        let mut sink = test_sink(80, 30);

        sink.show("", SinkStatus::Waiting).unwrap();
        assert!(screen_text(&sink).contains("Conversation"));

        sink.show("partial", SinkStatus::Failed { speaker: "Heidegger" }).unwrap();
        let screen = screen_text(&sink);
        assert!(screen.contains("stream from Heidegger failed"));
        assert!(screen.contains("partial"));
    }

    #[test]
    fn test_viewport_shrinks_with_terminal() {
        let large = test_sink(80, 40).viewport();
        let small = test_sink(80, 24).viewport();
        assert!(large.max_lines > small.max_lines);
        assert_eq!(large.width, small.width);
    }
}
