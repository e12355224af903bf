use std::hash::{DefaultHasher, Hash, Hasher};

use crate::paint::Color;

/// CSS-style numeric weight (100–900).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct FontWeight(pub u16);

impl FontWeight {
    pub const THIN: FontWeight = FontWeight(100);
    pub const LIGHT: FontWeight = FontWeight(300);
    pub const NORMAL: FontWeight = FontWeight(400);
    pub const MEDIUM: FontWeight = FontWeight(500);
    pub const SEMI_BOLD: FontWeight = FontWeight(600);
    pub const BOLD: FontWeight = FontWeight(700);
    pub const BLACK: FontWeight = FontWeight(900);
}

impl Default for FontWeight {
    fn default() -> Self {
        Self::NORMAL
    }
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
    Oblique,
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum FontStretch {
    Condensed,
    #[default]
    Normal,
    Expanded,
}

/// Horizontal placement of text inside its layout rectangle.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum TextAlignment {
    #[default]
    Leading,
    Center,
    Trailing,
}

/// What a surface needs to build a text format object.
#[derive(Debug, Clone, PartialEq)]
pub struct TextFormatDesc {
    pub family: String,
    pub size: f32,
    pub weight: FontWeight,
    pub style: FontStyle,
    pub stretch: FontStretch,
    pub alignment: TextAlignment,
}

impl TextFormatDesc {
    /// Cache key over (family, size, weight, style, stretch, alignment).
    pub fn cache_key(&self) -> u64 {
        let mut h = DefaultHasher::new();
        self.family.hash(&mut h);
        self.size.to_bits().hash(&mut h);
        self.weight.hash(&mut h);
        self.style.hash(&mut h);
        self.stretch.hash(&mut h);
        self.alignment.hash(&mut h);
        h.finish()
    }
}

/// Outline drawn beneath the text in a separate color.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TextOutline {
    pub color: Color,
    pub width: f32,
}

/// Caller-facing text descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub family: String,
    pub size: f32,
    pub weight: FontWeight,
    pub style: FontStyle,
    pub stretch: FontStretch,
    pub alignment: TextAlignment,
    pub color: Color,
    pub outline: Option<TextOutline>,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            family: String::from("sans-serif"),
            size: 14.0,
            weight: FontWeight::NORMAL,
            style: FontStyle::Normal,
            stretch: FontStretch::Normal,
            alignment: TextAlignment::Leading,
            color: Color::WHITE,
            outline: None,
        }
    }
}

impl TextStyle {
    pub fn new(family: impl Into<String>, size: f32) -> Self {
        Self {
            family: family.into(),
            size,
            ..Self::default()
        }
    }

    pub fn with_weight(mut self, weight: FontWeight) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_style(mut self, style: FontStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_alignment(mut self, alignment: TextAlignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_outline(mut self, color: Color, width: f32) -> Self {
        self.outline = Some(TextOutline { color, width });
        self
    }

    pub fn format_desc(&self) -> TextFormatDesc {
        TextFormatDesc {
            family: self.family.clone(),
            size: self.size,
            weight: self.weight,
            style: self.style,
            stretch: self.stretch,
            alignment: self.alignment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_and_outline_do_not_affect_format_key() {
        let a = TextStyle::new("Mono", 12.0);
        let b = a.clone().with_color(Color::BLACK).with_outline(Color::WHITE, 2.0);
        assert_eq!(a.format_desc().cache_key(), b.format_desc().cache_key());
    }

    #[test]
    fn each_format_field_changes_the_key() {
        let base = TextStyle::new("Mono", 12.0);
        let variants = [
            base.clone(),
            TextStyle::new("Sans", 12.0),
            TextStyle::new("Mono", 13.0),
            base.clone().with_weight(FontWeight::BOLD),
            base.clone().with_style(FontStyle::Italic),
            base.clone().with_alignment(TextAlignment::Center),
            TextStyle { stretch: FontStretch::Condensed, ..base.clone() },
        ];
        let keys: Vec<u64> = variants.iter().map(|s| s.format_desc().cache_key()).collect();
        for (i, a) in keys.iter().enumerate() {
            for b in &keys[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
