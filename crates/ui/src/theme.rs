use ratatui::style::{Color, Modifier, Style};

/// Color scheme for the symposium stage.
///
/// The setup region (personas and seed prompts) is green; the live
/// conversation is blue; a failed stream turns the conversation border
/// red. Palette values follow iceberg.vim's muted darks.
#[derive(Debug, Clone, Copy)]
pub struct Theme;

impl Theme {
    /// Primary text
    pub const FG: Color = Color::Rgb(198, 200, 209);

    /// Setup region accent: green
    pub const GREEN: Color = Color::Rgb(180, 190, 130);

    /// Conversation accent: blue
    pub const BLUE: Color = Color::Rgb(132, 160, 198);

    /// Stream failures: red
    pub const RED: Color = Color::Rgb(226, 120, 120);

    /// Secondary text: dim blue-gray
    pub const MUTED: Color = Color::Rgb(107, 112, 137);

    /// Setup panel borders and titles
    pub fn setup() -> Style {
        Style::default().fg(Self::GREEN)
    }

    /// Conversation panel border and title
    pub fn conversation() -> Style {
        Style::default().fg(Self::BLUE)
    }

    /// Border tone after a stream failure
    pub fn error() -> Style {
        Style::default().fg(Self::RED)
    }

    /// Secondary text (model labels, hints)
    pub fn muted() -> Style {
        Style::default().fg(Self::MUTED)
    }

    /// Stage title line
    pub fn title() -> Style {
        Style::default().fg(Self::FG).add_modifier(Modifier::BOLD)
    }

    /// Body text inside panels
    pub fn text() -> Style {
        Style::default().fg(Self::FG)
    }
}
