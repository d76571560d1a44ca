//! Color theme and styling definitions using ratatui colors.

use ratatui::style::{Color, Modifier, Style};

/// Color theme for terminal UI elements.
#[derive(Debug, Clone)]
pub struct ColorTheme {
    /// Per-rank level colors (trace..fault).
    pub level_colors: [Color; 6],

    /// Highlighted (cursor) row.
    pub selection: Style,

    /// Matched search substring on the cursor row.
    pub search_match: Style,

    /// Highlighted autocomplete option.
    pub option_selected: Style,

    /// Field names in record-detail mode.
    pub record_key: Style,

    /// Position indicator on the status row.
    pub position: Style,
}

impl Default for ColorTheme {
    fn default() -> Self {
        Self {
            level_colors: [
                Color::DarkGray, // trace
                Color::Cyan,     // debug
                Color::Green,    // info
                Color::Yellow,   // warn
                Color::Red,      // error
                Color::Magenta,  // fault
            ],
            selection: Style::default().fg(Color::Black).bg(Color::White),
            search_match: Style::default().fg(Color::White).bg(Color::Black),
            option_selected: Style::default().fg(Color::Black).bg(Color::White),
            record_key: Style::default().add_modifier(Modifier::BOLD),
            position: Style::default().fg(Color::DarkGray),
        }
    }
}

impl ColorTheme {
    /// Create a monochrome theme for terminals without color support.
    pub fn monochrome() -> Self {
        Self {
            level_colors: [Color::Reset; 6],
            selection: Style::default().add_modifier(Modifier::REVERSED),
            search_match: Style::default().add_modifier(Modifier::UNDERLINED),
            option_selected: Style::default().add_modifier(Modifier::REVERSED),
            record_key: Style::default().add_modifier(Modifier::BOLD),
            position: Style::default(),
        }
    }

    /// Foreground color for a level rank, `None` for unknown ranks.
    pub fn level_color(&self, rank: i32) -> Option<Color> {
        if (0..self.level_colors.len() as i32).contains(&rank) {
            Some(self.level_colors[rank as usize])
        } else {
            None
        }
    }
}
