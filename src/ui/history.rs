use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Widget},
};

use super::{bold, dim};
use crate::app::{App, HistoryView};

pub fn render(app: &App, area: Rect, buf: &mut Buffer) {
    match &app.history_view {
        Some(view) => render_view(view, area, buf),
        None => {
            Paragraph::new(vec![
                Line::from(Span::styled("History", bold().fg(Color::Magenta))),
                Line::from(""),
                Line::from(Span::styled("No session history available", dim())),
            ])
            .alignment(Alignment::Center)
            .render(area, buf);
        }
    }
}

fn render_view(view: &HistoryView, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // heading
            Constraint::Length(3), // level gauge
            Constraint::Min(1),    // recent sessions
        ])
        .split(area);

    Paragraph::new(vec![
        Line::from(Span::styled("History", bold().fg(Color::Magenta))),
        Line::from(Span::styled(
            format!(
                "{} sessions completed · {} XP total",
                view.sessions_completed, view.level.total_xp
            ),
            dim(),
        )),
    ])
    .alignment(Alignment::Center)
    .render(chunks[0], buf);

    Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Level {} ", view.level.level)),
        )
        .gauge_style(Style::default().fg(Color::Green))
        .ratio((view.level.progress / 100.0).clamp(0.0, 1.0))
        .label(format!("{} / {} XP", view.level.total_xp, view.level.next_level_xp))
        .render(chunks[1], buf);

    let lines: Vec<Line> = if view.recent.is_empty() {
        vec![Line::from(Span::styled(
            "Nothing yet. Finish a session to earn XP.",
            dim(),
        ))]
    } else {
        view.recent
            .iter()
            .map(|s| {
                let when = s.completed_at.format("%Y-%m-%d %H:%M").to_string();
                let what = if s.cycles > 0 {
                    format!("{} ({} cycles)", s.session_id, s.cycles)
                } else {
                    s.session_id.clone()
                };
                Line::from(vec![
                    Span::styled(when, dim()),
                    Span::raw("  "),
                    Span::styled(format!("{:<6}", s.source.to_string()), dim()),
                    Span::raw(what),
                    Span::styled(format!("  +{} XP", s.xp), Style::default().fg(Color::Green)),
                ])
            })
            .collect()
    };

    Paragraph::new(lines)
        .block(Block::default().title(Span::styled("Recent sessions", bold())))
        .render(chunks[2], buf);
}

#[cfg(test)]
mod tests {
    use crate::app::{App, Screen};
    use crate::config::Config;
    use crate::controller::{Reward, RewardSource};
    use crate::history::HistoryDb;
    use crate::ui::test_support::{contains, render_app};
    use chrono::{Local, TimeZone};

    fn reward(session_id: &str, xp: u32, cycles: u32) -> Reward {
        Reward {
            source: RewardSource::Popup,
            session_id: session_id.to_string(),
            xp,
            cycles,
            completed_at: Local.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn without_db_shows_placeholder() {
        let mut app = App::new(&Config::default(), None);
        app.open(Screen::History);
        let rows = render_app(&app, 80, 24);
        assert!(contains(&rows, "No session history available"));
    }

    #[test]
    fn empty_db_shows_level_zero() {
        let db = HistoryDb::in_memory().unwrap();
        let mut app = App::new(&Config::default(), Some(db));
        app.open(Screen::History);
        let rows = render_app(&app, 80, 24);
        assert!(contains(&rows, "0 sessions completed · 0 XP total"));
        assert!(contains(&rows, " Level 0 "));
        assert!(contains(&rows, "0 / 250 XP"));
        assert!(contains(&rows, "Nothing yet."));
    }

    #[test]
    fn recorded_sessions_listed() {
        let db = HistoryDb::in_memory().unwrap();
        db.record(&reward("box", 10, 3)).unwrap();
        for _ in 0..25 {
            db.record(&reward("478", 10, 4)).unwrap();
        }
        let mut app = App::new(&Config::default(), Some(db));
        app.open(Screen::History);
        let rows = render_app(&app, 100, 30);
        assert!(contains(&rows, "26 sessions completed · 260 XP total"));
        assert!(contains(&rows, " Level 1 "));
        assert!(contains(&rows, "260 / 500 XP"));
        assert!(contains(&rows, "2026-03-14 09:30"));
        assert!(contains(&rows, "478 (4 cycles)  +10 XP"));
    }
}
