use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Color,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use super::breathe::phase_color;
use super::{bold, dim, italic, menu_line};
use crate::app::App;
use crate::micro_session::MicroSnapshot;

pub fn render(app: &App, area: Rect, buf: &mut Buffer) {
    let snapshot = app.micro.snapshot();

    let (card_area, list_area) = match &snapshot {
        Some(_) => {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(8), Constraint::Min(1)])
                .split(area);
            (Some(chunks[0]), chunks[1])
        }
        None => (None, area),
    };

    if let (Some(snapshot), Some(card)) = (&snapshot, card_area) {
        render_card(snapshot, card, buf);
    }

    let heading = if snapshot.is_some() {
        "Switch Session"
    } else {
        "Choose a Session"
    };
    let mut lines = vec![
        Line::from(Span::styled(heading, bold().fg(Color::Magenta))),
        Line::from(""),
    ];
    for (i, session) in app.micro.sessions().iter().enumerate() {
        let minutes = session.duration_secs.div_ceil(60);
        lines.push(menu_line(
            format!("{} · {} min", session.title, minutes),
            i == app.micro_index,
        ));
        if i == app.micro_index {
            lines.push(Line::from(Span::styled(session.description, dim())));
        }
    }

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(list_area, buf);
}

fn render_card(snapshot: &MicroSnapshot, area: Rect, buf: &mut Buffer) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(format!(" {} ", snapshot.session.title), bold()));
    let inner = block.inner(area);
    block.render(area, buf);

    let mut lines = vec![Line::from(Span::styled(
        snapshot.time_left(),
        bold().fg(Color::White),
    ))];
    if let Some(breathing) = &snapshot.breathing {
        lines.push(Line::from(Span::styled(
            breathing.phase.instruction(),
            bold().fg(phase_color(breathing.phase)),
        )));
        lines.push(Line::from(Span::styled(
            format!("Cycle {} • {}", breathing.cycle_count, breathing.phase),
            dim(),
        )));
    }
    lines.push(Line::from(Span::styled(snapshot.session.instructions, italic())));
    if !snapshot.is_running {
        lines.push(Line::from(Span::styled("paused", italic().fg(Color::Gray))));
    }

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(inner, buf);
}

#[cfg(test)]
mod tests {
    use crate::app::{App, Screen};
    use crate::config::Config;
    use crate::ui::test_support::{contains, render_app};

    fn micro_app() -> App {
        let mut app = App::new(&Config::default(), None);
        app.open(Screen::Micro);
        app
    }

    #[test]
    fn list_shows_every_session() {
        let app = micro_app();
        let rows = render_app(&app, 100, 30);
        assert!(contains(&rows, "Choose a Session"));
        assert!(contains(&rows, "> 4-7-8 Breathing · 4 min"));
        assert!(contains(&rows, "Box Breathing · 5 min"));
        assert!(contains(&rows, "Quick Meditation · 3 min"));
        assert!(contains(&rows, "5-4-3-2-1 Grounding · 5 min"));
        assert!(contains(&rows, "Energy Reset · 2 min"));
        assert!(contains(&rows, "Calming breath technique for relaxation"));
    }

    #[test]
    fn active_breathing_card() {
        let mut app = micro_app();
        app.start_micro("box-breathing");
        for _ in 0..50 {
            app.on_tick();
        }
        app.status = None;
        let rows = render_app(&app, 100, 30);
        assert!(contains(&rows, "Switch Session"));
        assert!(contains(&rows, " Box Breathing "));
        assert!(contains(&rows, "4:55"));
        assert!(contains(&rows, "Cycle 0 • Hold"));
    }

    #[test]
    fn active_plain_card_has_no_cycle_line() {
        let mut app = micro_app();
        app.start_micro("quick-meditation");
        app.micro.toggle_pause();
        app.status = None;
        let rows = render_app(&app, 100, 30);
        assert!(contains(&rows, "3:00"));
        assert!(contains(&rows, "paused"));
        assert!(!contains(&rows, "Cycle"));
    }
}
