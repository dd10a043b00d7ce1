pub mod charting;
pub mod results_table;
pub mod screen;

use flinch::{
    challenge::Verdict,
    engine::{ChallengeView, Phase, SessionSnapshot},
    results::LogSummary,
    geometry::Rect as FieldRect,
    scheduler::ChallengeKind,
};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::App;

const HAZARD_COLOR: Color = Color::Rgb(110, 20, 20);
const HAZARD_OCCUPIED_COLOR: Color = Color::Rgb(200, 30, 30);
const ORANGE: Color = Color::Rgb(255, 165, 0);

pub fn kind_color(kind: ChallengeKind) -> Color {
    match kind {
        ChallengeKind::SingleClick => Color::LightGreen,
        ChallengeKind::DoubleClick => Color::LightBlue,
        ChallengeKind::HoldClick => ORANGE,
        ChallengeKind::NoClick => Color::LightRed,
        ChallengeKind::DodgeZone => Color::Red,
        ChallengeKind::DodgeClick => Color::Yellow,
    }
}

/// Caption shown on the target, reflecting in-progress state
fn target_caption(view: &ChallengeView) -> &'static str {
    if view.holding {
        "HOLDING"
    } else if view.kind == ChallengeKind::DoubleClick && view.clicks_seen == 1 {
        "AGAIN!"
    } else {
        view.kind.caption()
    }
}

/// Clip a playfield rectangle to the drawable area
pub fn to_cells(r: FieldRect, area: Rect) -> Option<Rect> {
    let x0 = r.x.max(i32::from(area.x));
    let y0 = r.y.max(i32::from(area.y));
    let x1 = r.right().min(i32::from(area.right()));
    let y1 = r.bottom().min(i32::from(area.bottom()));
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some(Rect::new(x0 as u16, y0 as u16, (x1 - x0) as u16, (y1 - y0) as u16))
}

fn lives_text(lives: u8) -> String {
    let full = "♥".repeat(usize::from(lives));
    let empty = "♡".repeat(usize::from(flinch::engine::MAX_LIVES.saturating_sub(lives)));
    format!("{full}{empty}")
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let snapshot = self.engine.snapshot();
        let header_rows = self.config.header_rows.min(area.height);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(header_rows), Constraint::Min(0)])
            .split(area);

        render_header(self, &snapshot, chunks[0], buf);

        if let Some(view) = &snapshot.challenge {
            render_challenge(self, view, area, buf);
        }

        let stats = self.engine.result_log().summary();
        if let Some((lines, color)) = overlay_lines(snapshot.phase, &stats) {
            render_overlay(&lines, color, chunks[1], buf);
        }
    }
}

/// Message box shown over the playfield outside a running session
fn overlay_lines(phase: Phase, stats: &LogSummary) -> Option<(Vec<String>, Color)> {
    let lines = match phase {
        Phase::Running => return None,
        Phase::Idle => (
            vec![
                "FLINCH".to_string(),
                String::new(),
                "Click the targets, skip the NO CLICK ones,".to_string(),
                "and keep the pointer out of the red zones.".to_string(),
                String::new(),
                "(space) start / (esc)ape".to_string(),
            ],
            Color::Cyan,
        ),
        Phase::Stopped => (
            vec![
                "STOPPED".to_string(),
                String::new(),
                "(space) new run / (e)xport / (r)esults / (esc)ape".to_string(),
            ],
            Color::Yellow,
        ),
        Phase::GameOver(summary) => {
            let mean = stats
                .mean_reaction_ms
                .map_or("-".to_string(), |m| format!("{m:.0} ms"));
            let best = stats
                .best_reaction_ms
                .map_or("-".to_string(), |b| format!("{b:.0} ms"));
            (
                vec![
                    "GAME OVER".to_string(),
                    String::new(),
                    format!("final score {}", summary.final_score),
                    format!("{} hits / {} fails", stats.successes, summary.fail_count),
                    format!("mean reaction {mean}   best {best}"),
                    String::new(),
                    "(space) play again / (e)xport / (r)esults / (esc)ape".to_string(),
                ],
                Color::LightRed,
            )
        }
    };
    Some(lines)
}

fn render_header(app: &App, snapshot: &SessionSnapshot, area: Rect, buf: &mut Buffer) {
    if area.height == 0 {
        return;
    }
    let bold_style = Style::default().add_modifier(Modifier::BOLD);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Min(0)])
        .split(area);

    let mut spans = vec![
        Span::styled(format!("Score: {}", snapshot.score), bold_style),
        Span::raw("   "),
        Span::styled(lives_text(snapshot.lives), Style::default().fg(Color::Red)),
    ];
    if snapshot.running() && matches!(snapshot.last_verdict, Some(Verdict::Failure(_))) {
        spans.push(Span::styled(
            "  (Fail!)",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
    }
    if let Some(status) = &app.status {
        spans.push(Span::raw("   "));
        spans.push(Span::styled(
            status.clone(),
            Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
        ));
    }
    Paragraph::new(Line::from(spans)).render(rows[0], buf);

    if snapshot.running() && rows[1].height > 0 {
        let kind = snapshot.challenge.as_ref().map(|c| c.kind);
        let label = kind.map_or(String::new(), |k| format!("{k}  {}%", snapshot.percent_remaining));
        Gauge::default()
            .gauge_style(Style::default().fg(kind.map_or(Color::Gray, kind_color)))
            .percent(u16::from(snapshot.percent_remaining))
            .label(label)
            .render(rows[1], buf);
    }
}

fn render_challenge(app: &App, view: &ChallengeView, area: Rect, buf: &mut Buffer) {
    let occupied = view.hazards.iter().any(|h| h.contains(app.pointer));
    let hazard_style = Style::default().bg(if occupied {
        HAZARD_OCCUPIED_COLOR
    } else {
        HAZARD_COLOR
    });
    for hazard in &view.hazards {
        if let Some(cells) = to_cells(*hazard, area) {
            buf.set_style(cells, hazard_style);
        }
    }

    if let Some(cells) = view.target.and_then(|t| to_cells(t, area)) {
        let color = kind_color(view.kind);
        let style = Style::default()
            .fg(Color::Black)
            .bg(color)
            .add_modifier(Modifier::BOLD);
        Paragraph::new(target_caption(view))
            .alignment(Alignment::Center)
            .style(style)
            .block(Block::default().borders(Borders::ALL).border_style(style))
            .render(cells, buf);
    }
}

/// Centered message box over the playfield
fn render_overlay(lines: &[String], color: Color, area: Rect, buf: &mut Buffer) {
    let width = lines.iter().map(|l| l.width()).max().unwrap_or(0) as u16 + 4;
    let height = lines.len() as u16 + 2;
    let width = width.min(area.width);
    let height = height.min(area.height);
    let popup = Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    );

    Clear.render(popup, buf);
    let text: Vec<Line> = lines
        .iter()
        .enumerate()
        .map(|(i, l)| {
            if i == 0 {
                Line::styled(
                    l.clone(),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                )
            } else {
                Line::raw(l.clone())
            }
        })
        .collect();
    Paragraph::new(text)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color)),
        )
        .render(popup, buf);
}
