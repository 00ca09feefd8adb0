//! Color theme system for labelbar.
//!
//! A `Theme` holds named `ratatui::style::Color` fields covering every surface
//! the review bar renders. Two built-in themes are provided:
//!
//! - `dark`: ANSI 16 colors, works on any terminal including plain SSH sessions.
//! - `catppuccin_mocha`: Catppuccin Mocha palette in RGB; requires truecolor.

use ratatui::style::Color;

#[derive(Debug, Clone)]
pub struct Theme {
    // Panel borders
    pub border_active: Color,
    pub border_inactive: Color,

    // Bottom-bar buttons
    /// Primary look (accept, submit, update, cancel skip).
    pub button_primary: Color,
    /// Default look (reject, skip) and toolbar items.
    pub button_default: Color,
    /// Disabled buttons of any look.
    pub button_disabled: Color,
    /// Background of the button under the bar cursor.
    pub button_focus_bg: Color,
    /// The "was skipped" marker.
    pub skipped_notice: Color,

    // Entity panel
    pub star_active: Color,
    pub star_inactive: Color,
    pub region_label: Color,
    pub muted: Color,

    // Comments panel
    /// Advisory message shown when a required comment is missing.
    pub comment_tooltip: Color,
    pub comment_draft: Color,

    // Status bar
    pub status_bar_bg: Color,
    pub status_bar_fg: Color,
    pub status_mode_normal: Color,
    pub status_mode_insert: Color,
    pub status_error: Color,
}

impl Theme {
    /// Returns the built-in dark theme using ANSI 16 colors.
    pub fn dark() -> Self {
        Self {
            border_active: Color::Cyan,
            border_inactive: Color::DarkGray,

            button_primary: Color::Cyan,
            button_default: Color::White,
            button_disabled: Color::DarkGray,
            button_focus_bg: Color::DarkGray,
            skipped_notice: Color::Red,

            star_active: Color::Yellow,
            star_inactive: Color::DarkGray,
            region_label: Color::Reset,
            muted: Color::DarkGray,

            comment_tooltip: Color::Yellow,
            comment_draft: Color::Green,

            status_bar_bg: Color::DarkGray,
            status_bar_fg: Color::White,
            status_mode_normal: Color::Cyan,
            status_mode_insert: Color::Green,
            status_error: Color::Red,
        }
    }

    /// Returns the Catppuccin Mocha theme using RGB truecolor values.
    ///
    /// Palette source: <https://github.com/catppuccin/catppuccin> Mocha variant.
    pub fn catppuccin_mocha() -> Self {
        let green = Color::Rgb(166, 227, 161);    // #a6e3a1
        let red = Color::Rgb(243, 139, 168);      // #f38ba8
        let yellow = Color::Rgb(249, 226, 175);   // #f9e2af
        let blue = Color::Rgb(137, 180, 250);     // #89b4fa
        let lavender = Color::Rgb(180, 190, 254); // #b4befe
        let overlay1 = Color::Rgb(127, 132, 156); // #7f849c
        let surface1 = Color::Rgb(69, 71, 90);    // #45475a
        let text = Color::Rgb(205, 214, 244);     // #cdd6f4
        let peach = Color::Rgb(250, 179, 135);    // #fab387

        Self {
            border_active: lavender,
            border_inactive: overlay1,

            button_primary: blue,
            button_default: text,
            button_disabled: overlay1,
            button_focus_bg: surface1,
            skipped_notice: red,

            star_active: yellow,
            star_inactive: overlay1,
            region_label: text,
            muted: overlay1,

            comment_tooltip: peach,
            comment_draft: green,

            status_bar_bg: surface1,
            status_bar_fg: text,
            status_mode_normal: lavender,
            status_mode_insert: green,
            status_error: red,
        }
    }

    /// Resolves a theme name from config to a built-in theme.
    ///
    /// Unknown names fall back to `dark()` so a typo in config never prevents
    /// startup.
    pub fn from_name(name: &str) -> Self {
        match name {
            "catppuccin-mocha" | "catppuccin_mocha" => Self::catppuccin_mocha(),
            "dark" => Self::dark(),
            other => {
                tracing::warn!(theme = other, "unknown theme, falling back to 'dark'");
                Self::dark()
            }
        }
    }
}
