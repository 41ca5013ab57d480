//! Colour tokens for the DeskView TUI.
//!
//! Neon accents on a dark background. Panels call the free style functions;
//! `Theme` is the underlying palette.

use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    /// Electric cyan (focus, highlights)
    pub accent: Color,
    /// Neon green (positive values, success)
    pub positive: Color,
    /// Hot pink (negative values, failures)
    pub negative: Color,
    /// Neon orange (warnings, stale data)
    pub warning: Color,
    /// Cool purple (secondary info)
    pub neutral: Color,
    /// Steel blue (hints, disabled)
    pub muted: Color,
    pub text_primary: Color,
}

impl Default for Theme {
    fn default() -> Self {
        PALETTE
    }
}

const PALETTE: Theme = Theme {
    accent: Color::Rgb(0, 255, 255),
    positive: Color::Rgb(0, 255, 128),
    negative: Color::Rgb(255, 20, 147),
    warning: Color::Rgb(255, 140, 0),
    neutral: Color::Rgb(147, 112, 219),
    muted: Color::Rgb(100, 149, 237),
    text_primary: Color::White,
};

impl Theme {
    /// Sign colour for a monetary value. Zero counts as positive.
    pub fn money_color(&self, value: f64) -> Color {
        if value >= 0.0 {
            self.positive
        } else {
            self.negative
        }
    }
}

pub fn accent() -> Style {
    Style::default().fg(PALETTE.accent)
}

pub fn accent_bold() -> Style {
    accent().add_modifier(Modifier::BOLD)
}

pub fn positive() -> Style {
    Style::default().fg(PALETTE.positive)
}

pub fn negative() -> Style {
    Style::default().fg(PALETTE.negative)
}

pub fn warning() -> Style {
    Style::default().fg(PALETTE.warning)
}

pub fn neutral() -> Style {
    Style::default().fg(PALETTE.neutral)
}

pub fn muted() -> Style {
    Style::default().fg(PALETTE.muted)
}

pub fn text() -> Style {
    Style::default().fg(PALETTE.text_primary)
}

pub fn panel_border(active: bool) -> Style {
    if active {
        accent()
    } else {
        muted()
    }
}

pub fn panel_title(active: bool) -> Style {
    if active {
        accent_bold()
    } else {
        muted()
    }
}

/// Style for a rendered money cell. Cells that don't parse (e.g. "-") are muted.
pub fn money_cell(cell: &str) -> Style {
    match cell.parse::<f64>() {
        Ok(v) => Style::default().fg(PALETTE.money_color(v)),
        Err(_) => muted(),
    }
}
