pub mod breathe;
pub mod history;
pub mod micro;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};

use crate::app::{App, Screen, HOME_ITEMS};
use crate::celebration::CompletionBurst;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;

pub(crate) fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

pub(crate) fn dim() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

pub(crate) fn italic() -> Style {
    Style::default().add_modifier(Modifier::ITALIC)
}

/// A selectable row: marker and highlight when `selected`
pub(crate) fn menu_line(label: String, selected: bool) -> Line<'static> {
    if selected {
        Line::from(Span::styled(format!("> {label}"), bold().fg(Color::Cyan)))
    } else {
        Line::from(Span::raw(format!("  {label}")))
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Min(1),    // screen body
                Constraint::Length(2), // status / toast
                Constraint::Length(1), // legend
            ])
            .split(area);

        match self.screen {
            Screen::Home => render_home(self, chunks[0], buf),
            Screen::Breathe => breathe::render(self, chunks[0], buf),
            Screen::Micro => micro::render(self, chunks[0], buf),
            Screen::History => history::render(self, chunks[0], buf),
        }

        if let Some(status) = &self.status {
            Paragraph::new(Span::styled(status.clone(), italic().fg(Color::Cyan)))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .render(chunks[1], buf);
        }

        Paragraph::new(Span::styled(legend(self), italic().add_modifier(Modifier::DIM)))
            .alignment(Alignment::Center)
            .render(chunks[2], buf);

        if self.burst.is_active() {
            render_burst(&self.burst, area, buf);
        }
    }
}

fn legend(app: &App) -> &'static str {
    match app.screen {
        Screen::Home => "(↑/↓) select  (enter) open  (q)uit",
        Screen::Breathe if app.breathe.is_active() => {
            "(space) pause/resume  (r)eset  (c)omplete  (esc) close"
        }
        Screen::Breathe => "(↑/↓) select  (enter) start  (esc) back",
        Screen::Micro => "(↑/↓) select  (enter) start/switch  (space) pause  (r)eset  (esc) back",
        Screen::History => "(esc) back  (q)uit",
    }
}

fn render_home(app: &App, area: Rect, buf: &mut Buffer) {
    let mut lines = vec![
        Line::from(Span::styled("PulseHabit", bold().fg(Color::Magenta))),
        Line::from(Span::styled("take a moment to breathe", dim())),
        Line::from(""),
    ];
    lines.extend(
        HOME_ITEMS
            .iter()
            .enumerate()
            .map(|(i, item)| menu_line(item.to_string(), i == app.home_index)),
    );
    if app.ledger.earned_xp > 0 {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("+{} XP earned this run", app.ledger.earned_xp),
            Style::default().fg(Color::Green),
        )));
    }

    let height = lines.len() as u16;
    let top = area.height.saturating_sub(height) / 2;
    let body = Rect {
        y: area.y + top,
        height: area.height.saturating_sub(top),
        ..area
    };
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(body, buf);
}

/// Draw burst particles over whatever is already in `buf`
fn render_burst(burst: &CompletionBurst, area: Rect, buf: &mut Buffer) {
    let colors = [
        Color::LightCyan,
        Color::LightBlue,
        Color::Cyan,
        Color::LightMagenta,
        Color::White,
    ];

    for particle in &burst.particles {
        if particle.x < 0.0 || particle.y < 0.0 {
            continue;
        }
        let (x, y) = (particle.x as u16, particle.y as u16);
        if x >= area.width || y >= area.height {
            continue;
        }

        let style = if particle.is_label {
            bold().fg(Color::Green)
        } else {
            Style::default().fg(colors[particle.color_index % colors.len()])
        };

        if let Some(cell) = buf.cell_mut((area.x + x, area.y + y)) {
            cell.set_symbol(&particle.symbol.to_string());
            cell.set_style(style);
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn render_app(app: &App, width: u16, height: u16) -> Vec<String> {
        let area = Rect::new(0, 0, width, height);
        let mut buffer = Buffer::empty(area);
        app.render(area, &mut buffer);
        (0..height)
            .map(|y| {
                (0..width)
                    .map(|x| buffer.cell((x, y)).map_or(" ", |c| c.symbol()))
                    .collect::<String>()
            })
            .collect()
    }

    pub fn contains(rows: &[String], needle: &str) -> bool {
        rows.iter().any(|r| r.contains(needle))
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{contains, render_app};
    use super::*;
    use crate::config::Config;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    #[test]
    fn home_lists_menu() {
        let app = App::new(&Config::default(), None);
        let rows = render_app(&app, 80, 24);
        assert!(contains(&rows, "PulseHabit"));
        assert!(contains(&rows, "> Quick breathe"));
        assert!(contains(&rows, "Micro sessions"));
        assert!(contains(&rows, "(q)uit"));
    }

    #[test]
    fn selection_marker_follows_cursor() {
        let mut app = App::new(&Config::default(), None);
        app.on_key(KeyEvent::new(KeyCode::Down, KeyModifiers::NONE));
        let rows = render_app(&app, 80, 24);
        assert!(contains(&rows, "> Micro sessions"));
        assert!(!contains(&rows, "> Quick breathe"));
    }

    #[test]
    fn status_line_rendered() {
        let mut app = App::new(&Config::default(), None);
        app.status = Some("hello there".into());
        let rows = render_app(&app, 80, 24);
        assert!(contains(&rows, "hello there"));
    }

    #[test]
    fn burst_draws_label() {
        let mut app = App::new(&Config::default(), None);
        app.burst.start(10, 80, 24);
        let rows = render_app(&app, 80, 24);
        assert!(contains(&rows, "+10XP") || contains(&rows, "+10 XP"));
    }

    #[test]
    fn tiny_and_huge_areas_do_not_panic() {
        let mut app = App::new(&Config::default(), None);
        app.burst.start(10, 200, 60);
        for (w, h) in [(1, 1), (10, 3), (20, 5), (200, 60)] {
            let rows = render_app(&app, w, h);
            assert_eq!(rows.len(), h as usize);
        }
    }
}
