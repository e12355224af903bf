use std::fmt;

use crate::coords::Vec2;

use super::{FontStyle, FontWeight};

/// Error returned by [`FontSystem::load_font`].
#[derive(Debug, Clone)]
pub struct FontLoadError(pub String);

impl fmt::Display for FontLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "font load error: {}", self.0)
    }
}

impl std::error::Error for FontLoadError {}

/// Opaque handle to a face loaded into a [`FontSystem`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct FontId(pub(crate) usize);

struct Face {
    family: String,
    weight: FontWeight,
    style: FontStyle,
    font: fontdue::Font,
}

/// Font faces registered under family names.
///
/// Text formats name a family, weight and style; [`resolve`](Self::resolve)
/// picks the closest registered face. Faces are immutable after loading.
#[derive(Default)]
pub struct FontSystem {
    faces: Vec<Face>,
}

impl FontSystem {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Parses a TrueType or OpenType face and registers it under `family`.
    pub fn load_font(
        &mut self,
        family: &str,
        weight: FontWeight,
        style: FontStyle,
        bytes: &[u8],
    ) -> Result<FontId, FontLoadError> {
        let font = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(|e| FontLoadError(e.to_string()))?;
        let id = FontId(self.faces.len());
        self.faces.push(Face {
            family: family.to_string(),
            weight,
            style,
            font,
        });
        log::debug!("registered font face {family} ({}, {style:?})", weight.0);
        Ok(id)
    }

    /// Best face for the request.
    ///
    /// Family matches case-insensitively; within the family the style must
    /// match when possible and the nearest weight wins. An unknown family
    /// falls back to the first registered face.
    pub fn resolve(&self, family: &str, weight: FontWeight, style: FontStyle) -> Option<FontId> {
        let score = |f: &Face| {
            let style_penalty = if f.style == style { 0 } else { 1000 };
            style_penalty + (i32::from(f.weight.0) - i32::from(weight.0)).unsigned_abs()
        };
        self.faces
            .iter()
            .enumerate()
            .filter(|(_, f)| f.family.eq_ignore_ascii_case(family))
            .min_by_key(|(_, f)| score(f))
            .map(|(i, _)| FontId(i))
            .or_else(|| (!self.faces.is_empty()).then_some(FontId(0)))
    }

    pub(crate) fn get(&self, id: FontId) -> Option<&fontdue::Font> {
        self.faces.get(id.0).map(|f| &f.font)
    }

    /// Bounding size of laid-out text in pixels.
    ///
    /// Width uses the pen position after each glyph rather than the bitmap
    /// edge, so feeding the result back as `max_width` never wraps.
    #[must_use]
    pub fn measure_text(&self, text: &str, id: FontId, size: f32, max_width: Option<f32>) -> Vec2 {
        use fontdue::layout::{CoordinateSystem, Layout, LayoutSettings, TextStyle};

        let Some(font) = self.get(id) else {
            return Vec2::new(0.0, size * 1.2);
        };

        let mut layout: Layout<()> = Layout::new(CoordinateSystem::PositiveYDown);
        layout.reset(&LayoutSettings { max_width, ..LayoutSettings::default() });
        layout.append(&[font], &TextStyle::new(text, size, 0));

        let glyphs = layout.glyphs();
        if glyphs.is_empty() {
            return Vec2::new(0.0, size * 1.2);
        }

        let w = glyphs
            .iter()
            .map(|g| {
                let m = font.metrics_indexed(g.key.glyph_index, size);
                (g.x - m.xmin as f32 + m.advance_width).max(0.0)
            })
            .fold(0.0f32, f32::max);
        let h = glyphs.iter().map(|g| g.y + g.height as f32).fold(size, f32::max);
        Vec2::new(w, h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_system_resolves_nothing() {
        let fonts = FontSystem::new();
        assert!(fonts.is_empty());
        assert_eq!(fonts.resolve("Sans", FontWeight::NORMAL, FontStyle::Normal), None);
    }

    #[test]
    fn garbage_bytes_fail_to_load() {
        let mut fonts = FontSystem::new();
        let err = fonts.load_font("Sans", FontWeight::NORMAL, FontStyle::Normal, b"not a font");
        assert!(err.is_err());
        assert!(fonts.is_empty());
    }

    #[test]
    fn unknown_id_measures_as_empty_line() {
        let fonts = FontSystem::new();
        let size = fonts.measure_text("hello", FontId(3), 10.0, None);
        assert_eq!(size, Vec2::new(0.0, 12.0));
    }
}
