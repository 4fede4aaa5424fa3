use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Widget, Wrap},
};

use super::{bold, dim, italic, menu_line};
use crate::app::App;
use crate::controller::SessionSnapshot;
use crate::exercise::{ExerciseDefinition, Phase};

pub(crate) fn phase_color(phase: Phase) -> Color {
    match phase {
        Phase::Inhale => Color::Cyan,
        Phase::Hold => Color::Yellow,
        Phase::Exhale => Color::Green,
        Phase::Pause => Color::Blue,
    }
}

fn pattern(exercise: &ExerciseDefinition) -> String {
    Phase::ALL
        .iter()
        .map(|p| exercise.phase_durations.secs(*p))
        .filter(|s| *s > 0)
        .map(|s| format!("{s}s"))
        .collect::<Vec<_>>()
        .join(" / ")
}

pub fn render(app: &App, area: Rect, buf: &mut Buffer) {
    match app.breathe.snapshot() {
        Some(snapshot) => render_active(&snapshot, area, buf),
        None => render_picker(app, area, buf),
    }
}

fn render_picker(app: &App, area: Rect, buf: &mut Buffer) {
    let mut lines = vec![
        Line::from(Span::styled("Take a Moment to Breathe", bold().fg(Color::Magenta))),
        Line::from(Span::styled("pick an exercise and follow the cue", dim())),
        Line::from(""),
    ];
    for (i, exercise) in app.breathe.catalog().iter().enumerate() {
        lines.push(menu_line(
            format!("{} ({})", exercise.name, pattern(exercise)),
            i == app.exercise_index,
        ));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!(
            "Complete {} cycles to earn +{} XP",
            app.breathe.settings().completion_cycles,
            app.breathe.settings().reward_xp
        ),
        italic(),
    )));

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(area, buf);
}

pub(crate) fn render_active(snapshot: &SessionSnapshot, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // title + description
            Constraint::Min(1),    // phase cue
            Constraint::Length(3), // gauge
            Constraint::Length(1), // cycle counter
            Constraint::Length(1), // completion hint
        ])
        .split(area);

    Paragraph::new(vec![
        Line::from(Span::styled(snapshot.exercise_name, bold())),
        Line::from(Span::styled(snapshot.description, dim())),
    ])
    .alignment(Alignment::Center)
    .render(chunks[0], buf);

    let color = phase_color(snapshot.phase);
    let mut cue = vec![Line::from(Span::styled(
        snapshot.phase.instruction(),
        bold().fg(color),
    ))];
    if !snapshot.is_running {
        cue.push(Line::from(Span::styled("paused", italic().fg(Color::Gray))));
    }
    let cue_top = chunks[1].height.saturating_sub(cue.len() as u16) / 2;
    Paragraph::new(cue)
        .alignment(Alignment::Center)
        .render(
            Rect {
                y: chunks[1].y + cue_top,
                height: chunks[1].height.saturating_sub(cue_top),
                ..chunks[1]
            },
            buf,
        );

    Gauge::default()
        .block(Block::default().borders(Borders::ALL))
        .gauge_style(Style::default().fg(color))
        .ratio((snapshot.progress / 100.0).clamp(0.0, 1.0))
        .label(format!("{:.0}%", snapshot.progress))
        .render(chunks[2], buf);

    Paragraph::new(Span::styled(
        format!("Cycle {} • {}", snapshot.cycle_count, snapshot.phase),
        Style::default().fg(Color::Gray),
    ))
    .alignment(Alignment::Center)
    .render(chunks[3], buf);

    let hint = if snapshot.can_complete() {
        Span::styled(
            format!("Complete Session (+{} XP)  (c)", snapshot.reward_xp),
            bold().fg(Color::Green),
        )
    } else {
        let left = snapshot.completion_cycles - snapshot.cycle_count;
        Span::styled(
            format!(
                "{left} more cycle{} to complete",
                if left == 1 { "" } else { "s" }
            ),
            dim(),
        )
    };
    Paragraph::new(hint)
        .alignment(Alignment::Center)
        .render(chunks[4], buf);
}
