use owo_colors::Style;
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

/// Styles for each kind of terminal output
#[derive(Debug, Clone)]
pub struct Theme {
    pub heading: Style,
    pub ok: Style,
    pub warn: Style,
    pub note: Style,
    /// Left-hand labels of status lines
    pub label: Style,
    /// Counts, paths and amounts
    pub amount: Style,
}

impl Theme {
    pub fn detect() -> Self {
        let no_color = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
        Self::new(wants_color(console::Term::stdout().is_term(), no_color))
    }

    pub fn new(colored: bool) -> Self {
        let pick = |style: Style| if colored { style } else { Style::new() };
        Self {
            heading: pick(Style::new().cyan().bold()),
            ok: pick(Style::new().green().bold()),
            warn: pick(Style::new().yellow().bold()),
            note: pick(Style::new().magenta()),
            label: pick(Style::new().white().dimmed()),
            amount: pick(Style::new().bright_white().bold()),
        }
    }
}

/// Color only on a terminal, and never when `NO_COLOR` is set
fn wants_color(is_term: bool, no_color: bool) -> bool {
    is_term && !no_color
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wants_color() {
        assert!(wants_color(true, false));
        assert!(!wants_color(true, true));
        assert!(!wants_color(false, false));
    }
}
