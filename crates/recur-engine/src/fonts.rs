//! Font loading seam.
//!
//! The host requires a text node's font to be loaded before its
//! font-dependent properties may be read or written.

use recur_core::FontName;
use std::collections::HashSet;

pub trait FontLoader {
    /// Load `font`, or explain why it is unavailable.
    fn load_font(&mut self, font: &FontName) -> Result<(), String>;
}

/// In-memory loader that remembers which fonts were requested.
///
/// Fonts listed in `missing` fail to load.
#[derive(Debug, Clone, Default)]
pub struct FontCache {
    loaded: Vec<FontName>,
    missing: HashSet<FontName>,
}

impl FontCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `font` fail on load.
    pub fn with_missing(mut self, font: FontName) -> Self {
        self.missing.insert(font);
        self
    }

    /// Fonts loaded so far, in request order.
    pub fn loaded(&self) -> &[FontName] {
        &self.loaded
    }
}

impl FontLoader for FontCache {
    fn load_font(&mut self, font: &FontName) -> Result<(), String> {
        if self.missing.contains(font) {
            return Err("font is not installed".into());
        }
        if !self.loaded.contains(font) {
            log::debug!("loading font {} {}", font.family, font.style);
            self.loaded.push(font.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_each_font_once() {
        let mut cache = FontCache::new();
        let inter = FontName::default();
        cache.load_font(&inter).unwrap();
        cache.load_font(&inter).unwrap();
        assert_eq!(cache.loaded(), &[inter]);
    }

    #[test]
    fn missing_fonts_fail() {
        let serif = FontName {
            family: "Serif".into(),
            style: "Italic".into(),
        };
        let mut cache = FontCache::new().with_missing(serif.clone());
        assert!(cache.load_font(&serif).is_err());
        assert!(cache.loaded().is_empty());
    }
}
