//! Theme configuration for the TUI.
//!
//! Supports light and dark themes with automatic terminal detection.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

use crate::data::{OperatingMode, SignalPhase};

/// Color and style theme for the TUI.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent color for highlights and active elements.
    pub highlight: Color,
    /// Green signal / green zone.
    pub green: Color,
    /// Yellow signal / yellow zone.
    pub yellow: Color,
    /// Red signal / red zone.
    pub red: Color,
    /// Color for borders and separators.
    pub border: Color,
    /// Color for the total-vehicles series.
    pub total: Color,
    /// Style for section titles.
    pub header: Style,
    /// Style for the active tab.
    pub tab_active: Style,
    /// Style for inactive tabs.
    pub tab_inactive: Style,
    /// Border style (rounded, plain, etc.).
    pub border_type: BorderType,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            green: Color::Green,
            yellow: Color::Yellow,
            red: Color::Red,
            border: Color::Gray,
            total: Color::White,
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            tab_active: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::Gray),
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            green: Color::Green,
            yellow: Color::Rgb(184, 134, 11),
            red: Color::Red,
            border: Color::DarkGray,
            total: Color::Black,
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            tab_active: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::DarkGray),
            border_type: BorderType::Rounded,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        // Use terminal-light crate to detect background luminance
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    pub fn phase_color(&self, phase: SignalPhase) -> Color {
        match phase {
            SignalPhase::Green => self.green,
            SignalPhase::Yellow => self.yellow,
            SignalPhase::Red => self.red,
        }
    }

    /// Bold style for a signal phase.
    pub fn phase_style(&self, phase: SignalPhase) -> Style {
        Style::default().fg(self.phase_color(phase)).add_modifier(Modifier::BOLD)
    }

    /// Style for an on/off indicator; `None` means not yet known.
    pub fn indicator_style(&self, active: Option<bool>) -> Style {
        match active {
            Some(true) => Style::default().fg(self.green),
            Some(false) => Style::default().fg(self.red).add_modifier(Modifier::BOLD),
            None => Style::default().add_modifier(Modifier::DIM),
        }
    }

    pub fn mode_style(&self, mode: OperatingMode) -> Style {
        match mode {
            OperatingMode::Live => Style::default().fg(self.green).add_modifier(Modifier::BOLD),
            OperatingMode::Simulated => {
                Style::default().fg(self.yellow).add_modifier(Modifier::BOLD | Modifier::REVERSED)
            }
        }
    }
}
