//! Overlay widgets: one render function per `OverlayChoice`.

use super::{centered_rect, COLOR_BORDER, COLOR_DIM, COLOR_ERROR, COLOR_INPUT, COLOR_SELECTED, COLOR_TITLE, COLOR_WARNING};
use crate::app::{App, LicensingField};
use crate::models::LicensingInfo;
use crate::overlay::Modal;
use ratatui::layout::Alignment;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

fn dialog(frame: &mut Frame, title: &str, border: ratatui::style::Color, width: u16, height: u16) -> ratatui::layout::Rect {
    let area = centered_rect(frame.area(), width, height);
    frame.render_widget(Clear, area);
    frame.render_widget(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::new().fg(border))
            .title(Span::styled(format!(" {title} "), Style::new().fg(COLOR_TITLE).add_modifier(Modifier::BOLD))),
        area,
    );
    area.inner(ratatui::layout::Margin::new(2, 1))
}

pub(super) fn render_terminate_warning(frame: &mut Frame, app: &App) {
    let inner = dialog(frame, "Warning", COLOR_WARNING, 60, 8);
    let secs = app.sequencer.buffer_timeout().as_secs();
    let lines = vec![
        Line::from(format!("The session will self-terminate in {secs} seconds")),
        Line::from(""),
        Line::from(vec![
            Span::styled("r", Style::new().add_modifier(Modifier::BOLD)),
            Span::raw(" resume session    "),
            Span::styled("t", Style::new().add_modifier(Modifier::BOLD)),
            Span::raw(" terminate now"),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

pub(super) fn render_error(frame: &mut Frame, app: &App) {
    let inner = dialog(frame, "Error", COLOR_ERROR, 70, 12);
    let mut lines = Vec::new();
    if app.state.is_connection_error() {
        lines.push(Line::from(
            "Either this integration terminated or the session ended.",
        ));
        lines.push(Line::from(""));
        lines.push(Line::from("Return to a parent app to continue.").style(Style::new().fg(COLOR_DIM)));
    } else if let Some(error) = &app.state.error {
        lines.push(Line::from(error.message.clone()));
        if let Some(logs) = &error.logs {
            lines.push(Line::from(""));
            for log in logs.iter().take(5) {
                lines.push(Line::from(log.clone()).style(Style::new().fg(COLOR_DIM)));
            }
        }
    }
    lines.push(Line::from(""));
    lines.push(Line::from("q quit").style(Style::new().fg(COLOR_DIM)));
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
}

pub(super) fn render_confirmation(frame: &mut Frame, app: &App) {
    let Some(Modal::Confirmation(action)) = app.modal else {
        return;
    };
    let inner = dialog(frame, "Confirm", COLOR_BORDER, 56, 7);
    let lines = vec![
        Line::from(action.prompt()),
        Line::from(""),
        Line::from(vec![
            Span::styled("y", Style::new().add_modifier(Modifier::BOLD)),
            Span::raw(" confirm    "),
            Span::styled("n", Style::new().add_modifier(Modifier::BOLD)),
            Span::raw(" cancel"),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

pub(super) fn render_help(frame: &mut Frame) {
    let inner = dialog(frame, "Help", COLOR_BORDER, 60, 12);
    let lines = vec![
        Line::from("s  start the session"),
        Line::from("x  stop the session"),
        Line::from("t  terminate session and proxy"),
        Line::from("l  discard licensing"),
        Line::from("Esc  hide the control panel"),
        Line::from("q  quit the console (session keeps running)"),
        Line::from(""),
        Line::from("Esc closes this help").style(Style::new().fg(COLOR_DIM)),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}

pub(super) fn render_licensing_gatherer(frame: &mut Frame, app: &App) {
    let inner = dialog(frame, "Licensing", COLOR_BORDER, 64, 10);
    let existing_marker = marker(app.licensing_form.field == LicensingField::ExistingLicense);
    let nlm_marker = marker(app.licensing_form.field == LicensingField::NetworkLicenseManager);

    // Truncate the left edge so the cursor end of a long address stays
    // visible in the fixed-width field.
    let field_width = inner.width.saturating_sub(20) as usize;
    let mut shown = app.licensing_form.conn_str.as_str();
    while shown.width() > field_width && !shown.is_empty() {
        let mut chars = shown.chars();
        chars.next();
        shown = chars.as_str();
    }

    let lines = vec![
        Line::from("Choose how the session is licensed:"),
        Line::from(""),
        Line::from(format!("{existing_marker} Use an existing installation license")),
        Line::from(vec![
            Span::raw(format!("{nlm_marker} Network license manager: ")),
            Span::styled(shown.to_string(), Style::new().fg(COLOR_INPUT)),
            Span::styled("_", Style::new().fg(COLOR_INPUT).add_modifier(Modifier::SLOW_BLINK)),
        ]),
        Line::from(""),
        Line::from("Tab switch    Enter submit").style(Style::new().fg(COLOR_DIM)),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}

pub(super) fn render_entitlement_selector(frame: &mut Frame, app: &App) {
    let Some(LicensingInfo::Online {
        email_address,
        entitlements,
        ..
    }) = &app.state.licensing
    else {
        return;
    };
    let height = (entitlements.len() as u16 + 7).min(frame.area().height);
    let inner = dialog(frame, "Select a license", COLOR_BORDER, 64, height);

    let mut lines = vec![
        Line::from(format!("Entitlements for {email_address}:")),
        Line::from(""),
    ];
    for (idx, entitlement) in entitlements.iter().enumerate() {
        let selected = idx == app.entitlement_cursor;
        let label = match &entitlement.license_number {
            Some(number) => format!("{} ({number})", entitlement.label),
            None => entitlement.label.clone(),
        };
        let line = Line::from(format!("{} {label}", marker(selected)));
        lines.push(if selected {
            line.style(Style::new().fg(COLOR_SELECTED).add_modifier(Modifier::BOLD))
        } else {
            line
        });
    }
    lines.push(Line::from(""));
    lines.push(Line::from("Up/Down choose    Enter select").style(Style::new().fg(COLOR_DIM)));
    frame.render_widget(Paragraph::new(lines), inner);
}

pub(super) fn render_information(frame: &mut Frame, app: &App) {
    let inner = dialog(frame, "Status", COLOR_BORDER, 64, 14);
    let mut lines = vec![super::status_line(app), Line::from("")];

    match &app.state.licensing {
        Some(LicensingInfo::Online { email_address, .. }) => {
            lines.push(Line::from(format!("licensed online as {email_address}")));
        }
        Some(LicensingInfo::NetworkLicenseManager { conn_str }) => {
            lines.push(Line::from(format!("license server: {conn_str}")));
        }
        Some(LicensingInfo::ExistingLicense) => {
            lines.push(Line::from("using the existing installation license"));
        }
        None => lines.push(Line::from("licensing not configured").style(Style::new().fg(COLOR_DIM))),
    }

    if let Some(error) = &app.state.error {
        lines.push(Line::from(""));
        lines.push(Line::from(error.message.clone()).style(Style::new().fg(COLOR_ERROR)));
    }

    if app.state.is_submitting {
        lines.push(Line::from(""));
        lines.push(Line::from("working...").style(Style::new().fg(COLOR_DIM)));
    }

    lines.push(Line::from(""));
    lines.push(
        Line::from("s start  x stop  t terminate  l unlicense  h help  Esc hide")
            .style(Style::new().fg(COLOR_DIM)),
    );
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
}

fn marker(selected: bool) -> &'static str {
    if selected {
        "(*)"
    } else {
        "( )"
    }
}
