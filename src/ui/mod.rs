//! UI rendering.
//!
//! The renderer is a pure function of the app: the session panel always
//! draws in the background, and whatever [`crate::overlay::select_overlay`]
//! picked draws centered above it. No rendering code mutates state.

mod overlays;
mod theme;

pub use theme::*;

use crate::app::App;
use crate::models::{AppStatus, BusyStatus};
use crate::overlay::OverlayChoice;
use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

/// Render one frame.
pub fn render(frame: &mut Frame, app: &App) {
    render_session_panel(frame, app, frame.area());

    match app.overlay() {
        OverlayChoice::None => {}
        OverlayChoice::TerminateWarning => overlays::render_terminate_warning(frame, app),
        OverlayChoice::Error => overlays::render_error(frame, app),
        OverlayChoice::Confirmation => overlays::render_confirmation(frame, app),
        OverlayChoice::Help => overlays::render_help(frame),
        OverlayChoice::LicensingGatherer => overlays::render_licensing_gatherer(frame, app),
        OverlayChoice::EntitlementSelector => overlays::render_entitlement_selector(frame, app),
        OverlayChoice::Information => overlays::render_information(frame, app),
    }
}

/// A centered rect of at most `width` x `height` inside `area`.
pub(crate) fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let [area] = Layout::horizontal([Constraint::Length(width.min(area.width))])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::vertical([Constraint::Length(height.min(area.height))])
        .flex(Flex::Center)
        .areas(area);
    area
}

fn status_line(app: &App) -> Line<'static> {
    let (label, color) = match app.state.app_status {
        AppStatus::Up => ("up", COLOR_OK),
        AppStatus::Starting => ("starting", COLOR_BUSY),
        AppStatus::Stopping => ("stopping", COLOR_BUSY),
        AppStatus::Down => ("down", COLOR_DIM),
    };
    let busy = match app.state.busy_status {
        BusyStatus::Busy => Span::styled("  busy", Style::new().fg(COLOR_BUSY)),
        BusyStatus::Idle => Span::styled("  idle", Style::new().fg(COLOR_DIM)),
        BusyStatus::Na => Span::raw(""),
    };
    Line::from(vec![
        Span::raw("session: "),
        Span::styled(label, Style::new().fg(color).add_modifier(Modifier::BOLD)),
        busy,
    ])
}

/// The always-present background panel: session status plus, once the
/// session is up and auth is satisfied, the embed URL the session is served
/// from (the iframe stand-in).
fn render_session_panel(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![status_line(app)];

    if let Some(version) = &app.state.session_version {
        lines.push(Line::from(format!("version: {version}")).style(Style::new().fg(COLOR_DIM)));
    }

    if app.state.session_up() && app.state.auth_satisfied() {
        if let Some(config) = &app.state.env_config {
            let origin = app.client_origin();
            lines.push(Line::from(format!("embed: {}", config.embed_url(&origin))));
        }
    } else if app.state.session_up() {
        lines.push(
            Line::from("session hidden until the auth token is accepted")
                .style(Style::new().fg(COLOR_DIM)),
        );
    }

    if !app.state.overlay_visible {
        lines.push(Line::from(""));
        lines.push(Line::from("Esc opens the control panel").style(Style::new().fg(COLOR_DIM)));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::new().fg(COLOR_BORDER))
        .title(Span::styled(" proxydeck ", Style::new().fg(COLOR_TITLE)));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}
