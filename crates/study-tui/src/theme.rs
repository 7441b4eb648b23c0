use ratatui::style::Color;
use ratatui::widgets::block::BorderType;

// Panel colors
pub const FOCUSED: Color = Color::Green;
pub const SELECTED_BG: Color = Color::DarkGray;

// Border style
pub const BORDER_TYPE: BorderType = BorderType::Rounded;

// Content colors
pub const HEADING: Color = Color::Cyan;
pub const CAPTION: Color = Color::DarkGray;
pub const PLACEHOLDER: Color = Color::DarkGray;
pub const IMAGE: Color = Color::Magenta;

// Status colors
pub const HINT: Color = Color::Blue;
pub const WARNING: Color = Color::Yellow;
pub const ERROR: Color = Color::Red;
