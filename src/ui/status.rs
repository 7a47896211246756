//! Bottom bar: live announcements, the placement banner, or key hints.

use std::time::Instant;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::app::state::AppState;
use crate::config::Action;
use crate::core::momentum::MotionMode;

use super::theme::Theme;

pub struct StatusBar<'a> {
    pub state: &'a AppState,
    pub now: Instant,
}

impl<'a> StatusBar<'a> {
    fn line(&self) -> Line<'static> {
        let state = self.state;
        if let Some(text) = state.live_announcement(self.now) {
            return Line::from(Span::styled(format!(" {text}"), Theme::announcement_style()));
        }
        if let Some(stamp) = state.engine.placement() {
            let cancel = state.config.short_binding(Action::CancelMode);
            return Line::from(Span::styled(
                format!(" {} stamp mode · click to place · {cancel} to stop", stamp.label()),
                Theme::placement_style(),
            ));
        }
        let mode = match state.engine.mode() {
            MotionMode::Idle => "",
            MotionMode::Dragging => " · dragging",
            MotionMode::Coasting => " · coasting",
        };
        Line::from(Span::styled(
            format!(" {}{mode}", state.config.status_bar_hint()),
            Theme::status_bar_style(),
        ))
    }
}

impl<'a> Widget for StatusBar<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let style = if self.state.engine.placement().is_some()
            && self.state.live_announcement(self.now).is_none()
        {
            Theme::placement_style()
        } else {
            Theme::status_bar_style()
        };
        Paragraph::new(self.line()).style(style).render(area, buf);
    }
}
