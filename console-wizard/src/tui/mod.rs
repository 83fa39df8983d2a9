// Terminal rendering of the wizard frame
//
// Draws one `WizardFrame`: the step list on the left, the active step's form on the right and
// the button row below. `smoke` renders into an in-memory backend so it runs without a terminal.

use crate::executor::LoopbackExecutor;
use crate::models::descriptor::ConnectorDescriptor;
use crate::models::kind::ConnectorKind;
use crate::wizard::controller::StepSummary;
use crate::wizard::{WizardController, WizardFrame};
use anyhow::Result;
use log::info;
use ratatui::backend::TestBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Terminal;
use std::sync::Arc;

pub const SMOKE_WIDTH: u16 = 100;
pub const SMOKE_HEIGHT: u16 = 30;

fn step_marker(step: &StepSummary, active: bool) -> &'static str {
    if active {
        ">"
    } else if step.locked {
        "#"
    } else if step.done {
        "x"
    } else {
        " "
    }
}

fn step_list(frame: &WizardFrame) -> Text<'static> {
    let lines: Vec<Line> = frame
        .steps
        .iter()
        .enumerate()
        .map(|(i, step)| {
            let active = i == frame.active_index;
            let text = format!("[{}] {}", step_marker(step, active), step.label);
            if active {
                Line::from(Span::styled(
                    text,
                    Style::default().add_modifier(Modifier::BOLD),
                ))
            } else {
                Line::from(text)
            }
        })
        .collect();
    Text::from(lines)
}

fn form_body(frame: &WizardFrame) -> Text<'static> {
    let mut lines = Vec::new();
    if !frame.help.is_empty() {
        lines.push(Line::from(frame.help));
        lines.push(Line::from(""));
    }
    match (&frame.form, frame.locked_reason) {
        (_, Some(reason)) => lines.push(Line::from(reason)),
        (Some(form), None) if form.fields.is_empty() => {
            lines.push(Line::from("Nothing to fill in. Press Next to continue."))
        }
        (Some(form), None) => {
            for field in &form.fields {
                let marker = if field.required { "*" } else { " " };
                lines.push(Line::from(format!(
                    "{}{}: {}",
                    marker,
                    field.label,
                    field.display()
                )));
                if let Some(err) = field.value.as_ref().and_then(|_| field.error()) {
                    lines.push(Line::from(format!("   ! {}", err)));
                }
            }
        }
        (None, None) => {}
    }
    Text::from(lines)
}

fn buttons(frame: &WizardFrame) -> String {
    let active = frame.steps.get(frame.active_index);
    let mut parts = Vec::new();
    if frame.active_index > 0 {
        parts.push("[Back]");
    }
    if active.map(|s| s.skippable).unwrap_or(false) {
        parts.push("[Skip]");
    }
    if !active.map(|s| s.terminal).unwrap_or(false) {
        parts.push("[Next]");
    }
    if !frame.hides_finish {
        parts.push("[Close]");
    }
    parts.join("  ")
}

pub fn draw(area: Rect, f: &mut ratatui::Frame<'_>, kind: ConnectorKind, frame: &WizardFrame) {
    let outer = Block::default()
        .borders(Borders::ALL)
        .title(format!("New system: {}", kind.short_name()));
    f.render_widget(outer, area);

    let inner = area.inner(&ratatui::layout::Margin {
        vertical: 1,
        horizontal: 1,
    });
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)].as_ref())
        .split(inner);
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(30), Constraint::Min(0)].as_ref())
        .split(rows[0]);

    let steps = Paragraph::new(step_list(frame))
        .block(Block::default().borders(Borders::ALL).title("Steps"));
    f.render_widget(steps, cols[0]);

    let title = frame
        .steps
        .get(frame.active_index)
        .map(|s| s.label)
        .unwrap_or_default();
    let body = Paragraph::new(form_body(frame))
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false });
    f.render_widget(body, cols[1]);

    let row = Paragraph::new(buttons(frame)).alignment(Alignment::Right);
    f.render_widget(row, rows[1]);
}

/// Render `frame` into an in-memory terminal and return its rows.
pub fn render_lines(kind: ConnectorKind, frame: &WizardFrame) -> Result<Vec<String>> {
    let backend = TestBackend::new(SMOKE_WIDTH, SMOKE_HEIGHT);
    let mut terminal = Terminal::new(backend)?;
    terminal.draw(|f| draw(f.size(), f, kind, frame))?;

    let buffer = terminal.backend().buffer();
    let width = usize::from(buffer.area.width);
    Ok(buffer
        .content
        .chunks(width)
        .map(|row| {
            row.iter()
                .map(|cell| cell.symbol())
                .collect::<String>()
                .trim_end()
                .to_string()
        })
        .collect())
}

/// Render the opening frame of a fresh wizard for `kind` and log it.
pub async fn smoke(kind: ConnectorKind) -> Result<Vec<String>> {
    info!(
        "[PHASE: tui] [STEP: smoke] Rendering single-frame wizard smoke kind={}",
        kind
    );
    let controller = WizardController::new(
        kind,
        ConnectorDescriptor::new(kind.as_str()),
        Arc::new(LoopbackExecutor::new()),
    );
    let frame = controller
        .render()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to build wizard frame: {}", e))?;
    let lines = render_lines(kind, &frame)?;
    for line in &lines {
        info!("[PHASE: tui] [STEP: frame] {}", line);
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn smoke_frame_lists_steps_and_form() {
        let lines = smoke(ConnectorKind::Ldap).await.unwrap();
        let screen = lines.join("\n");
        assert_eq!(lines.len(), usize::from(SMOKE_HEIGHT));
        assert!(screen.contains("New system: ldap"));
        assert!(screen.contains("[>] Connection"));
        assert!(screen.contains("[#] Certificate"));
        assert!(screen.contains("*Host:"));
        assert!(screen.contains("[Next]"));
        assert!(!screen.contains("[Back]"));
    }

    #[tokio::test]
    async fn secrets_are_never_drawn() {
        let controller = WizardController::new(
            ConnectorKind::Postgresql,
            ConnectorDescriptor::new(ConnectorKind::Postgresql.as_str()),
            Arc::new(LoopbackExecutor::new()),
        );
        let mut frame = controller.render().await.unwrap();
        if let Some(form) = frame.form.as_mut() {
            form.set("password", "hunter2");
        }
        let screen = render_lines(ConnectorKind::Postgresql, &frame)
            .unwrap()
            .join("\n");
        assert!(screen.contains("*Password: *******"));
        assert!(!screen.contains("hunter2"));
    }
}
