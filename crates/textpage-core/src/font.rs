//! Per-page font registry.
//!
//! Words reference fonts by [`FontId`]. The registry is owned by the page
//! arena and outlives every word that refers into it, so no reference
//! counting is needed.

/// Index into a page's [`FontRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FontId(pub u32);

/// Identity of one font as seen by the loader.
#[derive(Debug, Clone, PartialEq)]
pub struct FontInfo {
    /// Resource key or base font name, unique per distinct font object.
    pub name: String,
}

/// Interning registry of the fonts used on one page.
#[derive(Debug, Default)]
pub struct FontRegistry {
    fonts: Vec<FontInfo>,
}

impl FontRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a font by its unique key, returning its id.
    pub fn register(&mut self, name: &str) -> FontId {
        if let Some(pos) = self.fonts.iter().position(|f| f.name == name) {
            return FontId(pos as u32);
        }
        self.fonts.push(FontInfo {
            name: name.to_string(),
        });
        FontId((self.fonts.len() - 1) as u32)
    }

    pub fn get(&self, id: FontId) -> &FontInfo {
        &self.fonts[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }
}
