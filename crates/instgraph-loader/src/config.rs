//! Loader and annotation settings.

use instgraph_core::{BeamState, PutKind, PutState};

use crate::error::{LoadError, Result};

/// Settings shared by the TOML and drawio front-ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Kind given to TOML puts that do not name one
    pub default_kind: PutKind,

    /// Run `Graph::finalize` once the description is applied
    pub finalize: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            default_kind: PutKind::Light,
            finalize: true,
        }
    }
}

impl LoaderConfig {
    #[must_use]
    pub fn with_default_kind(mut self, kind: PutKind) -> Self {
        self.default_kind = kind;
        self
    }

    /// Leave the graph unfinalized so the caller can keep adding to it.
    #[must_use]
    pub fn without_finalize(mut self) -> Self {
        self.finalize = false;
        self
    }
}

/// RGB colors written into diagram styles, as six hex digits without `#`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    off: String,
    on: String,
    intermediate: String,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            off: "FF0000".to_string(),
            on: "00FF00".to_string(),
            intermediate: "FFFF00".to_string(),
        }
    }
}

impl Palette {
    /// Build a palette, accepting colors with or without a leading `#`.
    pub fn new(off: &str, on: &str, intermediate: &str) -> Result<Self> {
        Ok(Self {
            off: normalize(off)?,
            on: normalize(on)?,
            intermediate: normalize(intermediate)?,
        })
    }

    pub fn off(&self) -> &str {
        &self.off
    }

    pub fn on(&self) -> &str {
        &self.on
    }

    /// Color for waiting puts and intermediate beams.
    pub fn intermediate(&self) -> &str {
        &self.intermediate
    }

    pub fn put_color(&self, state: PutState) -> &str {
        match state {
            PutState::Off => &self.off,
            PutState::Waiting => &self.intermediate,
            PutState::On => &self.on,
        }
    }

    pub fn beam_color(&self, state: BeamState) -> &str {
        match state {
            BeamState::Off => &self.off,
            BeamState::Intermediate => &self.intermediate,
            BeamState::On => &self.on,
        }
    }
}

fn normalize(color: &str) -> Result<String> {
    let hex = color.strip_prefix('#').unwrap_or(color);
    if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(hex.to_ascii_uppercase())
    } else {
        Err(LoadError::InvalidColor(color.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_palette() {
        let palette = Palette::default();
        assert_eq!(palette.put_color(PutState::Off), "FF0000");
        assert_eq!(palette.put_color(PutState::On), "00FF00");
        assert_eq!(palette.put_color(PutState::Waiting), "FFFF00");
        assert_eq!(palette.beam_color(BeamState::Intermediate), "FFFF00");
    }

    #[test]
    fn palette_normalizes_colors() {
        let palette = Palette::new("#ff8800", "00ff00", "AbCdEf").unwrap();
        assert_eq!(palette.off(), "FF8800");
        assert_eq!(palette.intermediate(), "ABCDEF");
    }

    #[test]
    fn palette_rejects_bad_colors() {
        assert!(matches!(
            Palette::new("red", "00FF00", "FFFF00"),
            Err(LoadError::InvalidColor(c)) if c == "red"
        ));
        assert!(Palette::new("FF00000", "00FF00", "FFFF00").is_err());
    }

    #[test]
    fn config_builders() {
        let config = LoaderConfig::default()
            .with_default_kind(PutKind::Power)
            .without_finalize();
        assert_eq!(config.default_kind, PutKind::Power);
        assert!(!config.finalize);
        assert!(LoaderConfig::default().finalize);
    }
}
