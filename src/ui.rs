use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::geometry::{Point, Size};
use crate::session::{SessionView, HITS_TO_FINISH};

const STATUS_LINES: u16 = 1;
const FACE: &str = ":)";

/// Splits the terminal into the status bar and the playfield
pub fn split(area: Rect) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(STATUS_LINES), Constraint::Min(0)])
        .split(area);
    (chunks[0], chunks[1])
}

/// Playfield size in viewport units
pub fn viewport_of(playfield: Rect) -> Size {
    Size::new(playfield.width as u32, playfield.height as u32)
}

/// Maps a clicked cell to the point at its centre in playfield coordinates.
/// Clicks outside the playfield are dropped.
pub fn tap_point(playfield: Rect, column: u16, row: u16) -> Option<Point> {
    let inside = column >= playfield.x
        && column < playfield.x.saturating_add(playfield.width)
        && row >= playfield.y
        && row < playfield.y.saturating_add(playfield.height);

    inside.then(|| {
        Point::new(
            (column - playfield.x) as f64 + 0.5,
            (row - playfield.y) as f64 + 0.5,
        )
    })
}

fn to_cells(v: u32) -> u16 {
    u16::try_from(v).unwrap_or(u16::MAX)
}

/// One frame of the game
pub struct GameScreen<'a> {
    pub view: &'a SessionView,
}

impl<'a> GameScreen<'a> {
    pub fn new(view: &'a SessionView) -> Self {
        Self { view }
    }

    fn status_line(&self) -> Line<'static> {
        let view = self.view;
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);
        let mut spans = Vec::new();

        if view.counter_visible {
            spans.push(Span::styled("taps ", dim_style));
            spans.push(Span::styled(view.counter_text.clone(), bold_style));
            spans.push(Span::raw("   "));
        }

        spans.push(Span::styled("time ", dim_style));
        spans.push(Span::styled(view.elapsed_text.clone(), bold_style));
        spans.push(Span::raw("   "));

        spans.push(Span::styled("best ", dim_style));
        spans.push(Span::styled(
            view.best_text.clone().unwrap_or_else(|| "--:--:--".to_string()),
            Style::default().patch(bold_style).fg(Color::Green),
        ));

        if view.button_visible {
            spans.push(Span::raw("   "));
            spans.push(Span::styled(
                format!("[{}]", view.button_label),
                Style::default().patch(bold_style).fg(Color::Cyan),
            ));
        }

        if view.new_record && view.instructions_visible {
            spans.push(Span::raw("   "));
            spans.push(Span::styled(
                "New record!",
                Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD | Modifier::ITALIC),
            ));
        }

        Line::from(spans)
    }

    fn render_instructions(&self, playfield: Rect, buf: &mut Buffer) {
        let text = vec![
            Line::from(format!(
                "Tap the happy face {HITS_TO_FINISH} times as fast as you can."
            )),
            Line::from(Span::styled(
                "space/enter: start or stop   esc: quit",
                Style::default().add_modifier(Modifier::DIM),
            )),
        ];
        let height = (text.len() as u16).min(playfield.height);
        let area = Rect {
            x: playfield.x,
            y: playfield.y + playfield.height.saturating_sub(height) / 2,
            width: playfield.width,
            height,
        };

        Paragraph::new(text)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(area, buf);
    }

    fn render_target(&self, playfield: Rect, buf: &mut Buffer) {
        let Some(position) = self.view.target_position else {
            return;
        };
        let area = Rect {
            x: playfield.x.saturating_add(to_cells(position.x)),
            y: playfield.y.saturating_add(to_cells(position.y)),
            width: to_cells(self.view.target_size.width),
            height: to_cells(self.view.target_size.height),
        }
        .intersection(playfield);

        if area.is_empty() {
            return;
        }

        let face_style = Style::default()
            .fg(Color::Black)
            .bg(Color::Yellow)
            .add_modifier(Modifier::BOLD);

        Paragraph::new(FACE)
            .alignment(Alignment::Center)
            .style(face_style)
            .block(Block::default().borders(Borders::ALL).style(face_style))
            .render(area, buf);
    }
}

impl Widget for GameScreen<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (status, playfield) = split(area);

        Paragraph::new(self.status_line()).render(status, buf);

        if self.view.instructions_visible {
            self.render_instructions(playfield, buf);
        }
        if self.view.target_visible {
            self.render_target(playfield, buf);
        }
    }
}
