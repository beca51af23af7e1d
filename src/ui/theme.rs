//! Color constants for the console UI.

use ratatui::style::Color;

pub const COLOR_BORDER: Color = Color::DarkGray;
pub const COLOR_TITLE: Color = Color::Cyan;
pub const COLOR_DIM: Color = Color::Gray;
pub const COLOR_OK: Color = Color::Green;
pub const COLOR_BUSY: Color = Color::Yellow;
pub const COLOR_WARNING: Color = Color::Yellow;
pub const COLOR_ERROR: Color = Color::Red;
pub const COLOR_INPUT: Color = Color::White;
pub const COLOR_SELECTED: Color = Color::Cyan;
