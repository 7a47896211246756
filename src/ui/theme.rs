//! Colour palette and text styles used across the UI.

use ratatui::style::{Color, Modifier, Style};

/// Central theme: change colours here and they propagate everywhere.
pub struct Theme;

impl Theme {
    // ── grid ───────────────────────────────────────────────────
    pub fn tile_border(tint: [u8; 3]) -> Style {
        Style::default().fg(Color::Rgb(tint[0], tint[1], tint[2]))
    }

    /// Gold double frame for framed pets.
    pub fn frame_style() -> Style {
        Style::default()
            .fg(Color::Rgb(212, 175, 55))
            .add_modifier(Modifier::BOLD)
    }

    pub fn focus_style() -> Style {
        Style::default()
            .fg(Color::Rgb(255, 105, 180))
            .add_modifier(Modifier::BOLD)
    }

    pub fn label_style() -> Style {
        Style::default().fg(Color::Rgb(90, 80, 100))
    }

    pub fn placeholder_style() -> Style {
        Style::default()
            .fg(Color::Rgb(170, 160, 185))
            .add_modifier(Modifier::DIM)
    }

    pub fn cue_style() -> Style {
        Style::default()
            .fg(Color::Rgb(120, 90, 200))
            .add_modifier(Modifier::BOLD)
    }

    /// Pastel ramp cycled by the holographic texture offset.
    pub const HOLO_RAMP: [Color; 6] = [
        Color::Rgb(255, 179, 186),
        Color::Rgb(255, 223, 186),
        Color::Rgb(255, 255, 186),
        Color::Rgb(186, 255, 201),
        Color::Rgb(186, 225, 255),
        Color::Rgb(218, 186, 255),
    ];

    // ── effects ────────────────────────────────────────────────
    pub fn stamp_style(fading: bool) -> Style {
        let style = Style::default().fg(Color::Rgb(214, 69, 65));
        if fading {
            style.add_modifier(Modifier::DIM)
        } else {
            style.add_modifier(Modifier::BOLD)
        }
    }

    pub fn particle_style() -> Style {
        Style::default()
            .fg(Color::Rgb(255, 140, 0))
            .add_modifier(Modifier::BOLD)
    }

    // ── chrome ─────────────────────────────────────────────────
    pub fn title_style() -> Style {
        Style::default()
            .fg(Color::Rgb(120, 90, 200))
            .add_modifier(Modifier::BOLD)
    }

    pub fn border_style() -> Style {
        Style::default().fg(Color::Gray)
    }

    pub fn gauge_style() -> Style {
        Style::default().fg(Color::Rgb(255, 105, 180)).bg(Color::DarkGray)
    }

    pub fn status_bar_style() -> Style {
        Style::default().bg(Color::DarkGray).fg(Color::White)
    }

    pub fn announcement_style() -> Style {
        Style::default()
            .bg(Color::DarkGray)
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    }

    pub fn placement_style() -> Style {
        Style::default()
            .bg(Color::Rgb(214, 69, 65))
            .fg(Color::White)
            .add_modifier(Modifier::BOLD)
    }
}
