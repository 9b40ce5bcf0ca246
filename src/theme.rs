//! Cosmetic presets. Themes only affect rendering; variants bundle a theme
//! rotation with the auto-start policy of the widget they reproduce.

use colored::Color;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::Error;
use crate::session::AutoStart;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Synthwave,
    Cafe,
    Cosmic,
    Minimal,
    Lofi,
    Forest,
    Sunset,
    Midnight,
    Ocean,
    NightCity,
    Vintage,
    Pastel,
}

/// Terminal colours for one theme.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub foreground: Color,
    pub accent: Color,
}

impl Theme {
    pub fn name(&self) -> &'static str {
        match self {
            Theme::Synthwave => "Synthwave",
            Theme::Cafe => "Cafe",
            Theme::Cosmic => "Cosmic",
            Theme::Minimal => "Minimal",
            Theme::Lofi => "Lofi",
            Theme::Forest => "Forest",
            Theme::Sunset => "Sunset",
            Theme::Midnight => "Midnight",
            Theme::Ocean => "Ocean",
            Theme::NightCity => "Night City",
            Theme::Vintage => "Vintage",
            Theme::Pastel => "Pastel",
        }
    }

    pub fn tagline(&self) -> &'static str {
        match self {
            Theme::Minimal => "Simple, clean, distraction-free.",
            Theme::NightCity => "Focus in the glow of neon lights.",
            Theme::Vintage => "Old-school warmth for your workflow.",
            Theme::Pastel => "Soft colors for a gentle vibe.",
            Theme::Synthwave => "Retro neon for late-night sessions.",
            Theme::Cafe => "Coffee-shop warmth.",
            Theme::Cosmic => "Deep-space calm.",
            Theme::Lofi => "Muted tones, steady beats.",
            Theme::Forest => "Green and quiet.",
            Theme::Sunset => "Golden-hour glow.",
            Theme::Midnight => "Dark and still.",
            Theme::Ocean => "Cool blue waves.",
        }
    }

    pub fn palette(&self) -> Palette {
        let (foreground, accent) = match self {
            Theme::Synthwave => (Color::BrightMagenta, Color::Magenta),
            Theme::Cafe => (Color::Yellow, Color::TrueColor { r: 180, g: 83, b: 9 }),
            Theme::Cosmic => (Color::BrightCyan, Color::Blue),
            Theme::Minimal => (Color::White, Color::BrightBlack),
            Theme::Lofi => (Color::BrightWhite, Color::TrueColor { r: 100, g: 116, b: 139 }),
            Theme::Forest => (Color::BrightGreen, Color::Green),
            Theme::Sunset => (Color::BrightYellow, Color::Red),
            Theme::Midnight => (Color::BrightBlue, Color::Blue),
            Theme::Ocean => (Color::Cyan, Color::BrightBlue),
            Theme::NightCity => (Color::BrightMagenta, Color::TrueColor { r: 49, g: 46, b: 129 }),
            Theme::Vintage => (Color::TrueColor { r: 120, g: 53, b: 15 }, Color::Yellow),
            Theme::Pastel => (Color::TrueColor { r: 88, g: 28, b: 135 }, Color::BrightMagenta),
        };
        Palette { foreground, accent }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Timer widget preset: a theme rotation plus an auto-start policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    #[default]
    Flow,
    Lofi,
    LofiMinimal,
}

const FLOW_THEMES: [Theme; 6] = [
    Theme::Synthwave,
    Theme::Cafe,
    Theme::Cosmic,
    Theme::Minimal,
    Theme::Lofi,
    Theme::Forest,
];
const LOFI_THEMES: [Theme; 4] = [Theme::Sunset, Theme::Midnight, Theme::Forest, Theme::Ocean];
const LOFI_MINIMAL_THEMES: [Theme; 4] = [
    Theme::Minimal,
    Theme::NightCity,
    Theme::Vintage,
    Theme::Pastel,
];

const FLOW_AUTO_START_DELAY: Duration = Duration::from_millis(300);

impl Variant {
    pub fn title(&self) -> &'static str {
        match self {
            Variant::Flow => "Pomodoro Flow",
            Variant::Lofi | Variant::LofiMinimal => "Lofi Pomodoro",
        }
    }

    pub fn themes(&self) -> &'static [Theme] {
        match self {
            Variant::Flow => &FLOW_THEMES,
            Variant::Lofi => &LOFI_THEMES,
            Variant::LofiMinimal => &LOFI_MINIMAL_THEMES,
        }
    }

    pub fn default_theme(&self) -> Theme {
        match self {
            Variant::Flow | Variant::LofiMinimal => Theme::Minimal,
            Variant::Lofi => Theme::Sunset,
        }
    }

    /// Next theme in this variant's rotation, wrapping at the end.
    pub fn next_theme(&self, current: Theme) -> Theme {
        let themes = self.themes();
        match themes.iter().position(|t| *t == current) {
            Some(i) => themes[(i + 1) % themes.len()],
            None => themes[0],
        }
    }

    pub fn auto_start(&self) -> AutoStart {
        match self {
            Variant::Flow => AutoStart::After(FLOW_AUTO_START_DELAY),
            Variant::Lofi | Variant::LofiMinimal => AutoStart::Disabled,
        }
    }
}

impl FromStr for Variant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "flow" => Ok(Variant::Flow),
            "lofi" => Ok(Variant::Lofi),
            "lofi_minimal" | "lofi2" => Ok(Variant::LofiMinimal),
            other => Err(Error::UnknownVariant(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_wraps() {
        let variant = Variant::Lofi;
        let mut theme = variant.default_theme();
        let mut seen = Vec::new();
        for _ in 0..variant.themes().len() {
            seen.push(theme);
            theme = variant.next_theme(theme);
        }
        assert_eq!(theme, variant.default_theme());
        assert_eq!(seen, LOFI_THEMES.to_vec());
    }

    #[test]
    fn test_foreign_theme_restarts_rotation() {
        assert_eq!(Variant::Flow.next_theme(Theme::Pastel), Theme::Synthwave);
        assert_eq!(Variant::Flow.next_theme(Theme::Minimal), Theme::Lofi);
    }

    #[test]
    fn test_default_theme_is_in_rotation() {
        for variant in [Variant::Flow, Variant::Lofi, Variant::LofiMinimal] {
            assert!(variant.themes().contains(&variant.default_theme()));
        }
    }

    #[test]
    fn test_only_flow_auto_starts() {
        assert_eq!(
            Variant::Flow.auto_start(),
            AutoStart::After(Duration::from_millis(300))
        );
        assert_eq!(Variant::Lofi.auto_start(), AutoStart::Disabled);
        assert_eq!("lofi-minimal".parse::<Variant>().unwrap(), Variant::LofiMinimal);
        assert!("retro".parse::<Variant>().is_err());
    }
}
