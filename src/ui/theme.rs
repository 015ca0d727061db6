use owo_colors::Style;
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

#[derive(Debug, Clone)]
pub struct Theme {
    pub header: Style,
    pub success: Style,
    pub error: Style,
    pub warn: Style,
    pub info: Style,
    pub dim: Style,
    pub muted: Style,
    /// Verse references ("BG 2.47")
    pub reference: Style,
    /// Devanagari and transliterated verse text
    pub sanskrit: Style,
}

impl Theme {
    /// Plain output when stdout is not a terminal or NO_COLOR is set.
    pub fn detect() -> Self {
        let no_color = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
        if no_color || !console::Term::stdout().is_term() {
            return Self::plain();
        }
        Self::colored()
    }

    pub fn colored() -> Self {
        Self {
            header: Style::new().cyan().bold(),
            success: Style::new().green().bold(),
            error: Style::new().red().bold(),
            warn: Style::new().yellow().bold(),
            info: Style::new().magenta(),
            dim: Style::new().white().dimmed(),
            muted: Style::new().bright_black(),
            reference: Style::new().blue().bold(),
            sanskrit: Style::new().yellow().italic(),
        }
    }

    pub fn plain() -> Self {
        Self {
            header: Style::new(),
            success: Style::new(),
            error: Style::new(),
            warn: Style::new(),
            info: Style::new(),
            dim: Style::new(),
            muted: Style::new(),
            reference: Style::new(),
            sanskrit: Style::new(),
        }
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}

#[cfg(test)]
mod tests {
    use super::*;
    use owo_colors::OwoColorize;

    #[test]
    fn test_plain_theme_adds_no_escapes() {
        let plain = Theme::plain();
        assert_eq!("BG 2.47".style(plain.reference).to_string(), "BG 2.47");
        assert_eq!("karma".style(plain.sanskrit).to_string(), "karma");
    }

    #[test]
    fn test_colored_theme_styles_references() {
        let colored = Theme::colored();
        assert_ne!("BG 2.47".style(colored.reference).to_string(), "BG 2.47");
    }
}
