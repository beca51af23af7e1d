//! Keyboard and mouse handling.
//!
//! Every key press, mouse click and mouse move counts as a qualifying
//! interaction for the idle sequencer (which ignores them on its own while
//! the warning is shown). The rest of the handling depends on which overlay
//! is in front.

use super::App;
use crate::overlay::{ConfirmAction, Modal, OverlayChoice};
use crate::state::{reduce, Event};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

impl App {
    /// Handle one key event.
    pub fn handle_key(&mut self, key: KeyEvent) {
        self.sequencer.note_interaction();

        // Ctrl+C always exits the console (not the session).
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        match self.overlay() {
            OverlayChoice::TerminateWarning => self.handle_warning_key(key),
            OverlayChoice::Confirmation => self.handle_confirmation_key(key),
            OverlayChoice::Help => {
                // Any dismissal key closes help.
                if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
                    self.modal = None;
                }
            }
            OverlayChoice::Error => self.handle_error_key(key),
            OverlayChoice::LicensingGatherer => self.handle_licensing_key(key),
            OverlayChoice::EntitlementSelector => self.handle_entitlement_key(key),
            OverlayChoice::Information => self.handle_information_key(key),
            OverlayChoice::None => {
                // Session view in front; Esc brings the overlay back.
                if key.code == KeyCode::Esc {
                    reduce(&mut self.state, Event::OverlayVisibilitySet(true));
                }
            }
        }
    }

    /// Handle one mouse event. Clicks and movement only feed the idle timer.
    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::Down(_) | MouseEventKind::Moved => {
                self.sequencer.note_interaction();
            }
            _ => {}
        }
    }

    fn handle_warning_key(&mut self, key: KeyEvent) {
        match key.code {
            // Resume: cancel the buffer countdown, restart the idle timer
            // and put the session back in front.
            KeyCode::Char('r') | KeyCode::Enter => {
                self.sequencer.resume();
                reduce(&mut self.state, Event::OverlayVisibilitySet(false));
            }
            KeyCode::Char('t') => self.submit_terminate(),
            _ => {}
        }
    }

    fn handle_confirmation_key(&mut self, key: KeyEvent) {
        let Some(Modal::Confirmation(action)) = self.modal else {
            return;
        };
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                self.modal = None;
                self.run_confirmed(action);
            }
            KeyCode::Char('n') | KeyCode::Esc => {
                self.modal = None;
            }
            _ => {}
        }
    }

    fn handle_error_key(&mut self, key: KeyEvent) {
        // Terminal condition: nothing to recover, only leave.
        if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
            self.should_quit = true;
        }
    }

    fn handle_licensing_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Tab => self.licensing_form.toggle_field(),
            KeyCode::Enter => {
                if let Some(request) = self.licensing_form.to_request() {
                    self.submit_licensing(request);
                }
            }
            KeyCode::Backspace => {
                self.licensing_form.conn_str.pop();
            }
            KeyCode::Char(c) => {
                if self.licensing_form.field == super::LicensingField::NetworkLicenseManager {
                    self.licensing_form.conn_str.push(c);
                }
            }
            _ => {}
        }
    }

    fn handle_entitlement_key(&mut self, key: KeyEvent) {
        let count = match &self.state.licensing {
            Some(crate::models::LicensingInfo::Online { entitlements, .. }) => entitlements.len(),
            _ => 0,
        };
        if count == 0 {
            return;
        }
        // A poll may have replaced the entitlement list since the cursor
        // last moved; clamp before indexing.
        self.entitlement_cursor = self.entitlement_cursor.min(count - 1);
        match key.code {
            KeyCode::Up => {
                self.entitlement_cursor = self.entitlement_cursor.saturating_sub(1);
            }
            KeyCode::Down => {
                self.entitlement_cursor = (self.entitlement_cursor + 1).min(count - 1);
            }
            KeyCode::Enter => {
                if let Some(crate::models::LicensingInfo::Online { entitlements, .. }) =
                    &self.state.licensing
                {
                    let id = entitlements[self.entitlement_cursor].id.clone();
                    self.submit_entitlement(id);
                }
            }
            _ => {}
        }
    }

    fn handle_information_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                reduce(&mut self.state, Event::OverlayVisibilitySet(false));
            }
            KeyCode::Char('s') => {
                self.modal = Some(Modal::Confirmation(ConfirmAction::StartSession));
            }
            KeyCode::Char('x') => {
                self.modal = Some(Modal::Confirmation(ConfirmAction::StopSession));
            }
            KeyCode::Char('t') => {
                self.modal = Some(Modal::Confirmation(ConfirmAction::Terminate));
            }
            KeyCode::Char('l') => {
                self.modal = Some(Modal::Confirmation(ConfirmAction::UnsetLicensing));
            }
            KeyCode::Char('h') => {
                self.modal = Some(Modal::Help);
            }
            KeyCode::Char('q') => {
                self.should_quit = true;
            }
            _ => {}
        }
    }
}
