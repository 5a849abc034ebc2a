use ratatui::layout::{Constraint, Direction, Layout, Rect};
use unicode_width::UnicodeWidthStr;

/// The three-region stage: speaker personas on top, the two seed
/// prompts beneath them, and the conversation filling the rest.
#[derive(Debug, Clone)]
pub struct StageLayout {
    /// Title line
    pub title: Rect,
    /// Left persona panel
    pub first_role: Rect,
    /// Right persona panel
    pub second_role: Rect,
    /// Left seed-prompt panel (opening question)
    pub first_seed: Rect,
    /// Right seed-prompt panel (hand-off framing)
    pub second_seed: Rect,
    /// Live conversation region
    pub conversation: Rect,
}

impl StageLayout {
    /// Split the terminal into the stage regions. `setup_height` and
    /// `seed_height` are total rows for the persona and seed rows.
    pub fn calculate(area: Rect, setup_height: u16, seed_height: u16) -> Self {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(setup_height),
                Constraint::Length(seed_height),
                Constraint::Min(0),
            ])
            .split(area);

        let roles = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[1]);

        let seeds = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[2]);

        Self {
            title: rows[0],
            first_role: roles[0],
            second_role: roles[1],
            first_seed: seeds[0],
            second_seed: seeds[1],
            conversation: rows[3],
        }
    }

    /// Rows needed for the persona row: the taller wrapped persona plus
    /// borders plus the configured padding.
    pub fn role_panel_height(
        first_persona: &str, second_persona: &str, panel_width: u16, padding: u16,
    ) -> u16 {
        let inner = panel_width.saturating_sub(2).max(1);
        let tallest = wrapped_height(first_persona, inner).max(wrapped_height(second_persona, inner));
        (tallest as u16).saturating_add(2).saturating_add(padding)
    }
}

/// Estimate wrapped line count for plain text at a width: per source
/// line, `ceil(display_width / width)`, empty lines counting as one.
fn wrapped_height(text: &str, width: u16) -> usize {
    let width = width.max(1) as usize;
    text.trim()
        .lines()
        .map(|line| {
            let line_width = line.width();
            if line_width == 0 { 1 } else { line_width.div_ceil(width) }
        })
        .sum()
}
