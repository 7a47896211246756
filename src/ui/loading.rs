//! Loading screen shown while pet images are preloaded.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Gauge, Paragraph, Widget},
};

use super::theme::Theme;

/// Braille-dot spinner frames.  Cycles through these on each tick.
const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub struct LoadingScreen {
    /// 0..=100
    pub progress: u8,
    /// Frame counter (drives the spinner).
    pub tick: u64,
    pub total: usize,
}

impl Widget for LoadingScreen {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let popup = centered_fixed(44, 7, area);
        Clear.render(popup, buf);

        let block = Block::default()
            .title(" pet-grid ")
            .title_style(Theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Theme::border_style());
        let inner = block.inner(popup);
        block.render(popup, buf);

        let [_, label_row, _, gauge_row] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(inner);

        let frame = SPINNER_FRAMES[(self.tick as usize / 3) % SPINNER_FRAMES.len()];
        Paragraph::new(Line::from(vec![
            Span::styled(format!(" {frame} "), Theme::cue_style()),
            Span::raw(format!("Loading {} pets…", self.total)),
        ]))
        .render(label_row, buf);

        let percent = self.progress.min(100);
        Gauge::default()
            .gauge_style(Theme::gauge_style())
            .percent(percent as u16)
            .label(format!("{percent}%"))
            .render(gauge_row.inner(ratatui::layout::Margin::new(1, 0)), buf);
    }
}

/// Create a centered rectangle with fixed dimensions, clamped to the available area.
fn centered_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(w)) / 2;
    let y = area.y + (area.height.saturating_sub(h)) / 2;
    Rect::new(x, y, w, h)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn popup_is_centred_and_clamped() {
        assert_eq!(centered_fixed(44, 7, Rect::new(0, 0, 100, 25)), Rect::new(28, 9, 44, 7));
        assert_eq!(centered_fixed(44, 7, Rect::new(0, 0, 20, 4)), Rect::new(0, 0, 20, 4));
    }

    #[test]
    fn renders_title_and_percentage() {
        let area = Rect::new(0, 0, 60, 12);
        let mut buf = Buffer::empty(area);
        LoadingScreen {
            progress: 42,
            tick: 0,
            total: 28,
        }
        .render(area, &mut buf);

        let text: String = (0..area.height)
            .flat_map(|y| (0..area.width).map(move |x| (x, y)))
            .map(|(x, y)| buf[(x, y)].symbol().to_string())
            .collect();
        assert!(text.contains("pet-grid"));
        assert!(text.contains("Loading 28 pets"));
        assert!(text.contains("42%"));
    }
}
