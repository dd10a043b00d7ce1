use flinch::results::{LogSummary, ResultEntry};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::Span,
    widgets::{Axis, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::ui::charting::{compute_chart_params, format_ms, reaction_points};
use crate::App;

/// Pure presenter for one log entry
pub fn present_row(index: usize, entry: &ResultEntry) -> Row<'static> {
    let label_style = if entry.success {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::Red)
    };

    let reaction_ms = entry.reaction_ms();
    let reaction_style = if !entry.success {
        Style::default().fg(Color::DarkGray)
    } else if reaction_ms < 400.0 {
        Style::default().fg(Color::Green)
    } else if reaction_ms < 800.0 {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::Red)
    };

    Row::new(vec![
        Cell::from((index + 1).to_string()),
        Cell::from(entry.score_after.to_string()).style(Style::default().add_modifier(Modifier::BOLD)),
        Cell::from(entry.label.clone()).style(label_style),
        Cell::from(format!("{reaction_ms:.2}")).style(reaction_style),
        Cell::from(entry.timestamp.format("%H:%M:%S%.3f").to_string()),
    ])
}

pub fn summary_line(summary: &LogSummary) -> String {
    let ms = |v: Option<f64>| v.map_or("-".to_string(), format_ms);
    format!(
        "{} hits   {} fails   mean {}   sd {}   best {}",
        summary.successes,
        summary.failures,
        ms(summary.mean_reaction_ms),
        ms(summary.std_dev_reaction_ms),
        ms(summary.best_reaction_ms),
    )
}

/// Render the session results screen
pub fn render_results_table(app: &mut App, f: &mut Frame) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),  // Title
            Constraint::Min(0),     // Table
            Constraint::Length(10), // Reaction chart
            Constraint::Length(2),  // Instructions
        ])
        .split(area);

    let log = app.engine.result_log();
    let title = Paragraph::new(summary_line(&log.summary()))
        .block(Block::default().borders(Borders::ALL).title("Results"))
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    if log.is_empty() {
        let no_data = Paragraph::new("Nothing recorded yet. Press (space) to play a round.")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Gray));
        f.render_widget(no_data, chunks[1]);
    } else {
        let table_height = chunks[1].height.saturating_sub(3) as usize; // borders + header
        let max_scroll = log.len().saturating_sub(table_height);
        if app.results_scroll > max_scroll {
            app.results_scroll = max_scroll;
        }

        let header = Row::new(vec!["#", "Score", "Action", "Reaction (ms)", "Time"]).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

        let rows: Vec<Row> = log
            .entries()
            .iter()
            .enumerate()
            .skip(app.results_scroll)
            .take(table_height)
            .map(|(i, e)| present_row(i, e))
            .collect();

        let widths = [
            Constraint::Length(4),
            Constraint::Length(6),
            Constraint::Length(30),
            Constraint::Length(14),
            Constraint::Min(12),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title("Log"))
            .column_spacing(2);
        f.render_widget(table, chunks[1]);

        let points = reaction_points(log.entries());
        let (last_attempt, ceiling) = compute_chart_params(&points);
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let datasets = vec![Dataset::default()
            .marker(Marker::Braille)
            .style(Style::default().fg(Color::Magenta))
            .graph_type(GraphType::Line)
            .data(&points)];
        let chart = Chart::new(datasets)
            .x_axis(
                Axis::default()
                    .title("attempt")
                    .bounds([1.0, last_attempt])
                    .labels(vec![
                        Span::styled("1", bold_style),
                        Span::styled(format!("{last_attempt:.0}"), bold_style),
                    ]),
            )
            .y_axis(
                Axis::default()
                    .title("reaction")
                    .bounds([0.0, ceiling])
                    .labels(vec![
                        Span::styled("0", bold_style),
                        Span::styled(format_ms(ceiling), bold_style),
                    ]),
            );
        f.render_widget(chart, chunks[2]);
    }

    let instructions = Paragraph::new("(↑/↓) scroll  (Home) top  (e)xport  (r/backspace) back  (esc)ape")
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(instructions, chunks[3]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use std::time::Duration;

    #[test]
    fn summary_line_formats_reactions() {
        let summary = LogSummary {
            successes: 2,
            failures: 1,
            mean_reaction_ms: Some(300.0),
            std_dev_reaction_ms: Some(100.0),
            best_reaction_ms: Some(200.0),
        };
        assert_eq!(
            summary_line(&summary),
            "2 hits   1 fails   mean 300ms   sd 100ms   best 200ms"
        );
        assert_eq!(
            summary_line(&LogSummary::default()),
            "0 hits   0 fails   mean -   sd -   best -"
        );
    }

    #[test]
    fn present_row_builds_a_row() {
        let entry = ResultEntry {
            score_after: 4,
            label: "Hold Click (1s)".to_string(),
            success: true,
            reaction_time: Duration::from_millis(250),
            timestamp: Local::now(),
        };
        let _row = present_row(0, &entry);
    }
}
