// src/ui/render.rs

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};

use crate::ui::app::App;

const ACCENT: Color = Color::Green;
const START: Color = Color::Blue;
const STOP: Color = Color::Red;

pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(frame.area());

    draw_script_list(frame, app, chunks[0]);
    draw_output(frame, app, chunks[1]);
    draw_controls(frame, app, chunks[2]);

    if let Some(prompt) = app.prompt() {
        let area = centered(frame.area(), 60, 5);
        let text = vec![
            Line::from(Span::styled(
                prompt.step.label(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(format!("> {}_", prompt.input)),
            Line::from(Span::styled(
                "Enter: next   Esc: cancel",
                Style::default().fg(Color::DarkGray),
            )),
        ];
        frame.render_widget(Clear, area);
        frame.render_widget(
            Paragraph::new(text).block(Block::default().borders(Borders::ALL).title("Add Script")),
            area,
        );
    }

    if let Some(notice) = app.notice() {
        let height = notice_height(notice);
        let area = centered(frame.area(), 60, height);
        let mut text: Vec<Line> = notice.lines().map(|l| Line::from(l.to_string())).collect();
        text.push(Line::from(Span::styled(
            "Enter: dismiss",
            Style::default().fg(Color::DarkGray),
        )));
        frame.render_widget(Clear, area);
        frame.render_widget(
            Paragraph::new(text)
                .wrap(Wrap { trim: false })
                .block(Block::default().borders(Borders::ALL).title("Info")),
            area,
        );
    }
}

fn draw_script_list(frame: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .scripts()
        .iter()
        .map(|script| {
            let mark = if app.is_selected(script.id) { "[x]" } else { "[ ]" };
            let mut spans = vec![Span::raw(format!("{mark} {}", script.list_label()))];
            if app.is_running(script) {
                spans.push(Span::styled("  running", Style::default().fg(ACCENT)));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Scripts"))
        .highlight_style(Style::default().bg(ACCENT).fg(Color::Black));

    let mut state = ListState::default();
    if !app.scripts().is_empty() {
        state.select(Some(app.cursor()));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_output(frame: &mut Frame, app: &App, area: Rect) {
    let visible = area.height.saturating_sub(2) as usize;
    let skip = app.log.len().saturating_sub(visible);
    let lines: Vec<Line> = app
        .log
        .lines()
        .skip(skip)
        .map(|l| Line::from(l.to_string()))
        .collect();

    frame.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Output")),
        area,
    );
}

fn draw_controls(frame: &mut Frame, app: &App, area: Rect) {
    let button = |label: &'static str, color: Color| {
        if app.controls_enabled() {
            Span::styled(label, Style::default().fg(Color::White).bg(color))
        } else {
            Span::styled(label, Style::default().fg(Color::DarkGray))
        }
    };

    let line = Line::from(vec![
        Span::styled(" a ", Style::default().fg(Color::White).bg(ACCENT)),
        Span::raw(" Add Script  "),
        button(" s ", START),
        Span::raw(" Start Script(s)  "),
        button(" x ", STOP),
        Span::raw(" Stop Script(s)  "),
        Span::styled("space", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" select  "),
        Span::styled("q", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" quit"),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Text lines plus the borders and the dismiss hint.
fn notice_height(notice: &str) -> u16 {
    u16::try_from(notice.lines().count())
        .unwrap_or(u16::MAX)
        .saturating_add(3)
}

fn centered(area: Rect, width_percent: u16, height: u16) -> Rect {
    let width = (u32::from(area.width) * u32::from(width_percent) / 100) as u16;
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use super::*;
    use crate::catalog::ScriptRecord;
    use crate::types::{ScriptId, Timestamp};

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn draws_list_labels_and_log_lines() {
        let mut app = App::new(50);
        app.set_scripts(vec![ScriptRecord {
            id: ScriptId(1),
            title: "Ping".into(),
            description: "sleeps".into(),
            path: PathBuf::from("/tmp/sleep.py"),
            date_added: Timestamp::parse("2024-01-01 00:00:00").unwrap(),
        }]);
        app.log.push("Started script: Ping");

        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal.draw(|f| draw(f, &app)).unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains("[ ] 1: Ping"));
        assert!(text.contains("Started script: Ping"));
        assert!(text.contains("Start Script(s)"));
    }

    #[test]
    fn notice_popup_is_drawn_over_everything() {
        let mut app = App::new(50);
        app.show_notice("Script 'Ping' is already running.");

        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal.draw(|f| draw(f, &app)).unwrap();

        assert!(buffer_text(&terminal).contains("already running"));
    }

    #[test]
    fn notice_height_saturates_for_huge_notices() {
        assert_eq!(notice_height("one line"), 4);
        let many = "Script 7 no longer exists.\n".repeat(70_000);
        assert_eq!(notice_height(&many), u16::MAX);
    }

    #[test]
    fn oversized_notice_is_clipped_to_the_screen() {
        let mut app = App::new(50);
        app.show_notice("Script 7 no longer exists.\n".repeat(70_000));

        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal.draw(|f| draw(f, &app)).unwrap();

        assert!(buffer_text(&terminal).contains("no longer exists"));
    }
}
