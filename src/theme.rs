use ratatui::style::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeKind {
    Dark,
    Light,
}

/// Color palette for the chat view, toggled at runtime with 't'.
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub kind: ThemeKind,
    /// "You:" labels
    pub user: Color,
    /// Assistant labels
    pub bot: Color,
    /// Focused borders, highlights
    pub accent: Color,
    /// Hints, placeholders, typing indicator
    pub dim: Color,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            kind: ThemeKind::Dark,
            user: Color::Cyan,
            bot: Color::Magenta,
            accent: Color::LightMagenta,
            dim: Color::DarkGray,
        }
    }

    pub fn light() -> Self {
        Self {
            kind: ThemeKind::Light,
            user: Color::Blue,
            bot: Color::Magenta,
            accent: Color::Blue,
            dim: Color::Gray,
        }
    }

    pub fn toggled(self) -> Self {
        match self.kind {
            ThemeKind::Dark => Self::light(),
            ThemeKind::Light => Self::dark(),
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "dark" => Some(Self::dark()),
            "light" => Some(Self::light()),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self.kind {
            ThemeKind::Dark => "dark",
            ThemeKind::Light => "light",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_flips_kind() {
        assert_eq!(Theme::dark().toggled().kind, ThemeKind::Light);
        assert_eq!(Theme::light().toggled().kind, ThemeKind::Dark);
    }

    #[test]
    fn test_name_round_trip() {
        for theme in [Theme::dark(), Theme::light()] {
            let restored = Theme::from_name(theme.name()).expect("known name");
            assert_eq!(restored.kind, theme.kind);
        }
        assert!(Theme::from_name("solarized").is_none());
    }
}
