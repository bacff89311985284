//! Presentation table for alert levels.
//!
//! Maps the ordinal 1..4 scale onto a badge and a reference link for the
//! composed message. Levels outside the table are a loud
//! [`DispatchError::UnknownLevel`], never a silent fallback: the ledger
//! stores whatever the feed published, and this is where an unexpected
//! value must surface.

use crate::error::DispatchError;

/// Badge and reference link for one alert level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelStyle {
    /// Traffic-light badge shown in messages.
    pub badge: &'static str,
    /// Reference link keyed by the level.
    pub link: &'static str,
}

/// Look up the presentation entry for an alert level.
pub fn level_style(level: i64) -> Result<LevelStyle, DispatchError> {
    match level {
        1 => Ok(LevelStyle {
            badge: "🟢",
            link: "https://corona-ampel.gv.at/aktuelle-massnahmen/stufe-gruen/",
        }),
        2 => Ok(LevelStyle {
            badge: "🟡",
            link: "https://corona-ampel.gv.at/aktuelle-massnahmen/stufe-gelb/",
        }),
        3 => Ok(LevelStyle {
            badge: "🟠",
            link: "https://corona-ampel.gv.at/aktuelle-massnahmen/stufe-orange/",
        }),
        4 => Ok(LevelStyle {
            badge: "🔴",
            link: "https://corona-ampel.gv.at/aktuelle-massnahmen/stufe-rot/",
        }),
        level => Err(DispatchError::UnknownLevel { level }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_levels_have_styles() {
        for level in 1..=4 {
            let style = level_style(level).unwrap();
            assert!(!style.badge.is_empty());
            assert!(style.link.starts_with("https://"));
        }
    }

    #[test]
    fn unknown_level_fails_loudly() {
        assert!(matches!(
            level_style(9),
            Err(DispatchError::UnknownLevel { level: 9 })
        ));
        assert!(matches!(level_style(0), Err(DispatchError::UnknownLevel { .. })));
    }
}
