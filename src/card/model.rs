//! Card design types.
//!
//! All types derive `Serialize + Deserialize` so the same types work for
//! Rust API construction, design files on disk and the HTTP API.
//!
//! Coordinates are in the virtual canvas: a fixed 350×200 unit space that
//! every design is authored and rendered in before being scaled to print.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use super::color::Color;
use super::role::ElementRole;
use crate::error::CarnetError;

/// Virtual canvas width in design units.
pub const CANVAS_WIDTH: f32 = 350.0;

/// Virtual canvas height in design units.
pub const CANVAS_HEIGHT: f32 = 200.0;

/// Largest font size a text element may use.
pub const MAX_FONT_SIZE: f32 = 72.0;

// ============================================================================
// TEXT STYLE
// ============================================================================

/// CSS font weight as offered by the style panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FontWeight {
    #[default]
    #[serde(rename = "normal")]
    Normal,
    #[serde(rename = "bold")]
    Bold,
    #[serde(rename = "100")]
    W100,
    #[serde(rename = "200")]
    W200,
    #[serde(rename = "300")]
    W300,
    #[serde(rename = "400")]
    W400,
    #[serde(rename = "500")]
    W500,
    #[serde(rename = "600")]
    W600,
    #[serde(rename = "700")]
    W700,
    #[serde(rename = "800")]
    W800,
    #[serde(rename = "900")]
    W900,
}

impl FontWeight {
    /// Whether glyphs should be drawn from a bold face.
    pub fn is_bold(self) -> bool {
        matches!(
            self,
            FontWeight::Bold
                | FontWeight::W600
                | FontWeight::W700
                | FontWeight::W800
                | FontWeight::W900
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextDecoration {
    #[default]
    None,
    Underline,
    Overline,
    LineThrough,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextTransform {
    #[default]
    None,
    Uppercase,
    Lowercase,
    Capitalize,
}

impl TextTransform {
    /// Apply the transform with CSS semantics (`capitalize` upper-cases the
    /// first letter of every word and leaves the rest untouched).
    pub fn apply(self, text: &str) -> String {
        match self {
            TextTransform::None => text.to_string(),
            TextTransform::Uppercase => text.to_uppercase(),
            TextTransform::Lowercase => text.to_lowercase(),
            TextTransform::Capitalize => {
                let mut out = String::with_capacity(text.len());
                let mut at_word_start = true;
                for ch in text.chars() {
                    if at_word_start && ch.is_alphabetic() {
                        out.extend(ch.to_uppercase());
                    } else {
                        out.push(ch);
                    }
                    at_word_start = ch.is_whitespace();
                }
                out
            }
        }
    }
}

/// Styling for a text element.
///
/// Every field has a default, so a partially specified style in JSON
/// falls back field by field instead of failing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStyle {
    pub color: Color,
    pub font_size: f32,
    pub font_weight: FontWeight,
    pub font_style: FontStyle,
    pub text_decoration: TextDecoration,
    pub text_transform: TextTransform,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            font_size: 14.0,
            font_weight: FontWeight::Normal,
            font_style: FontStyle::Normal,
            text_decoration: TextDecoration::None,
            text_transform: TextTransform::None,
        }
    }
}

impl TextStyle {
    /// Overlay the set fields of `patch`; unset fields keep their value.
    pub fn merge(&self, patch: &TextStylePatch) -> TextStyle {
        TextStyle {
            color: patch.color.unwrap_or(self.color),
            font_size: patch.font_size.unwrap_or(self.font_size),
            font_weight: patch.font_weight.unwrap_or(self.font_weight),
            font_style: patch.font_style.unwrap_or(self.font_style),
            text_decoration: patch.text_decoration.unwrap_or(self.text_decoration),
            text_transform: patch.text_transform.unwrap_or(self.text_transform),
        }
    }
}

/// A partial [`TextStyle`] as sent by a style panel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStylePatch {
    pub color: Option<Color>,
    pub font_size: Option<f32>,
    pub font_weight: Option<FontWeight>,
    pub font_style: Option<FontStyle>,
    pub text_decoration: Option<TextDecoration>,
    pub text_transform: Option<TextTransform>,
}

// ============================================================================
// ELEMENTS
// ============================================================================

/// Kind-specific payload of a card element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElementKind {
    Logo,
    Text {
        #[serde(default)]
        content: Option<String>,
        #[serde(default)]
        style: TextStyle,
    },
    Qr,
}

/// One positioned visual item on the card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardElement {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(flatten)]
    pub kind: ElementKind,
}

impl CardElement {
    pub fn logo(id: &str, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            id: id.to_string(),
            x,
            y,
            width,
            height,
            kind: ElementKind::Logo,
        }
    }

    pub fn text(id: &str, x: f32, y: f32, width: f32, height: f32, content: &str) -> Self {
        Self {
            id: id.to_string(),
            x,
            y,
            width,
            height,
            kind: ElementKind::Text {
                content: Some(content.to_string()),
                style: TextStyle::default(),
            },
        }
    }

    pub fn qr(id: &str, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            id: id.to_string(),
            x,
            y,
            width,
            height,
            kind: ElementKind::Qr,
        }
    }

    /// Builder-style style override for text elements. No-op for other kinds.
    pub fn with_style(mut self, patch: TextStylePatch) -> Self {
        if let ElementKind::Text { style, .. } = &mut self.kind {
            *style = style.merge(&patch);
        }
        self
    }

    /// Semantic role derived from the element id.
    pub fn role(&self) -> ElementRole {
        ElementRole::from_id(&self.id)
    }

    pub fn text_style(&self) -> Option<&TextStyle> {
        match &self.kind {
            ElementKind::Text { style, .. } => Some(style),
            _ => None,
        }
    }
}

// ============================================================================
// CARD CONFIG
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradientKind {
    #[default]
    Linear,
    Radial,
}

/// Card background: a flat color, or a two-stop gradient when enabled.
///
/// Gradient settings are kept while the gradient is switched off so the
/// editor can toggle it without losing the stops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Background {
    pub color: Color,
    pub gradient_enabled: bool,
    pub gradient_kind: GradientKind,
    pub gradient_start: Color,
    pub gradient_end: Color,
    /// Angle in degrees for linear gradients in CSS-rendered previews.
    pub gradient_angle: f32,
}

impl Default for Background {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            gradient_enabled: false,
            gradient_kind: GradientKind::Linear,
            gradient_start: Color::WHITE,
            gradient_end: Color::rgb(0xf0, 0xf0, 0xf0),
            gradient_angle: 45.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Border {
    pub color: Option<Color>,
    pub width: f32,
    pub radius: f32,
}

impl Default for Border {
    fn default() -> Self {
        Self {
            color: Some(Color::BLACK),
            width: 1.0,
            radius: 8.0,
        }
    }
}

impl Border {
    /// A border is drawn only when it has both a width and a color.
    pub fn is_visible(&self) -> bool {
        self.width > 0.0 && self.color.is_some()
    }
}

/// The whole card design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardConfig {
    pub background: Background,
    /// Data URL, remote URL or local path. Empty means no logo.
    pub logo_url: String,
    pub school_name: String,
    /// Placeholder shown in previews in place of a student's name.
    pub student_name: String,
    /// Placeholder shown in previews in place of a student's identity code.
    pub student_id: String,
    /// QR payload used by previews.
    pub qr_value: String,
    pub font: String,
    pub border: Border,
    pub elements: Vec<CardElement>,
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            background: Background::default(),
            logo_url: String::new(),
            school_name: "Escuela de Ejemplo".to_string(),
            student_name: "John Doe".to_string(),
            student_id: "12345".to_string(),
            qr_value: "https://lazarus.com.pe".to_string(),
            font: "Arial".to_string(),
            border: Border::default(),
            elements: default_elements(),
        }
    }
}

/// The fixed element set every new design starts with.
pub fn default_elements() -> Vec<CardElement> {
    vec![
        CardElement::logo("logo", 10.0, 10.0, 80.0, 80.0),
        CardElement::text("schoolName", 100.0, 20.0, 200.0, 30.0, "Nombre de la Escuela")
            .with_style(TextStylePatch {
                font_size: Some(18.0),
                font_weight: Some(FontWeight::Bold),
                ..Default::default()
            }),
        CardElement::text("studentName", 10.0, 100.0, 200.0, 30.0, "Nombre del Estudiante")
            .with_style(TextStylePatch {
                font_size: Some(16.0),
                ..Default::default()
            }),
        CardElement::text("studentId", 10.0, 130.0, 200.0, 30.0, "ID del Estudiante"),
        CardElement::qr("qrCode", 200.0, 100.0, 100.0, 100.0),
    ]
}

impl CardConfig {
    pub fn element(&self, id: &str) -> Option<&CardElement> {
        self.elements.iter().find(|el| el.id == id)
    }

    pub fn element_mut(&mut self, id: &str) -> Option<&mut CardElement> {
        self.elements.iter_mut().find(|el| el.id == id)
    }

    pub fn has_logo(&self) -> bool {
        !self.logo_url.trim().is_empty()
    }

    /// Check the invariants the editor and renderer rely on.
    pub fn validate(&self) -> Result<(), CarnetError> {
        let mut seen = HashSet::new();
        for el in &self.elements {
            if el.id.is_empty() {
                return Err(CarnetError::InvalidDesign("element with empty id".into()));
            }
            if !seen.insert(el.id.as_str()) {
                return Err(CarnetError::InvalidDesign(format!(
                    "duplicate element id '{}'",
                    el.id
                )));
            }
            let within = |v: f32, max: f32| v.is_finite() && (0.0..=max).contains(&v);
            let fits = within(el.x, CANVAS_WIDTH)
                && within(el.y, CANVAS_HEIGHT)
                && within(el.width, CANVAS_WIDTH)
                && within(el.height, CANVAS_HEIGHT);
            if !fits {
                return Err(CarnetError::InvalidDesign(format!(
                    "element '{}' has invalid geometry",
                    el.id
                )));
            }
            if let ElementKind::Text { style, .. } = &el.kind
                && !(style.font_size > 0.0 && style.font_size <= MAX_FONT_SIZE)
            {
                return Err(CarnetError::InvalidDesign(format!(
                    "element '{}' has invalid font size",
                    el.id
                )));
            }
        }
        if !self.border.width.is_finite() || self.border.width < 0.0 {
            return Err(CarnetError::InvalidDesign("negative border width".into()));
        }
        Ok(())
    }

    /// Parse and validate a design from JSON.
    pub fn from_json(json: &str) -> Result<Self, CarnetError> {
        let config: CardConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a design file from disk.
    pub fn load(path: &Path) -> Result<Self, CarnetError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json_pretty(&self) -> Result<String, CarnetError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_element_set() {
        let config = CardConfig::default();
        let ids: Vec<&str> = config.elements.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["logo", "schoolName", "studentName", "studentId", "qrCode"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_styles() {
        let config = CardConfig::default();
        let school = config.element("schoolName").unwrap().text_style().unwrap();
        assert_eq!(school.font_size, 18.0);
        assert_eq!(school.font_weight, FontWeight::Bold);

        let id = config.element("studentId").unwrap().text_style().unwrap();
        assert_eq!(id, &TextStyle::default());
    }

    #[test]
    fn test_merge_keeps_unset_fields() {
        let base = TextStyle {
            color: Color::rgb(255, 0, 0),
            font_size: 20.0,
            ..Default::default()
        };
        let merged = base.merge(&TextStylePatch {
            font_style: Some(FontStyle::Italic),
            ..Default::default()
        });
        assert_eq!(merged.color, Color::rgb(255, 0, 0));
        assert_eq!(merged.font_size, 20.0);
        assert_eq!(merged.font_style, FontStyle::Italic);
    }

    #[test]
    fn test_partial_style_json_falls_back_to_defaults() {
        let json = r##"{"id":"motto","type":"text","x":1,"y":2,"width":3,"height":4,
                        "content":"Hi","style":{"font_size":22}}"##;
        let el: CardElement = serde_json::from_str(json).unwrap();
        let style = el.text_style().unwrap();
        assert_eq!(style.font_size, 22.0);
        assert_eq!(style.color, Color::BLACK);
        assert_eq!(style.font_weight, FontWeight::Normal);
    }

    #[test]
    fn test_element_json_tagging() {
        let el = CardElement::qr("qrCode", 1.0, 2.0, 3.0, 4.0);
        let value = serde_json::to_value(&el).unwrap();
        assert_eq!(value["type"], "qr");
        assert_eq!(value["id"], "qrCode");
        let back: CardElement = serde_json::from_value(value).unwrap();
        assert_eq!(back, el);
    }

    #[test]
    fn test_font_weight_json_uses_css_keywords() {
        assert_eq!(serde_json::to_string(&FontWeight::W700).unwrap(), "\"700\"");
        let w: FontWeight = serde_json::from_str("\"bold\"").unwrap();
        assert!(w.is_bold());
        assert!(!FontWeight::W500.is_bold());
    }

    #[test]
    fn test_text_decoration_kebab_case() {
        let d: TextDecoration = serde_json::from_str("\"line-through\"").unwrap();
        assert_eq!(d, TextDecoration::LineThrough);
    }

    #[test]
    fn test_text_transform_capitalize() {
        assert_eq!(TextTransform::Capitalize.apply("ana maría  lópez"), "Ana María  López");
        assert_eq!(TextTransform::Uppercase.apply("abc"), "ABC");
        assert_eq!(TextTransform::None.apply("aBc"), "aBc");
    }

    #[test]
    fn test_validate_rejects_duplicate_ids() {
        let mut config = CardConfig::default();
        config.elements.push(CardElement::logo("logo", 0.0, 0.0, 10.0, 10.0));
        assert!(matches!(config.validate(), Err(CarnetError::InvalidDesign(_))));
    }

    #[test]
    fn test_validate_rejects_bad_geometry() {
        let mut config = CardConfig::default();
        config.elements[0].width = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bounds_element_box_to_canvas() {
        let mut config = CardConfig::default();
        config.elements[4].width = CANVAS_WIDTH;
        config.elements[4].height = CANVAS_HEIGHT;
        assert!(config.validate().is_ok());

        config.elements[4].width = 200_000.0;
        assert!(matches!(config.validate(), Err(CarnetError::InvalidDesign(_))));

        let mut config = CardConfig::default();
        config.elements[0].x = CANVAS_WIDTH + 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_caps_font_size() {
        let mut config = CardConfig::default();
        let set_size = |config: &mut CardConfig, size: f32| {
            if let ElementKind::Text { style, .. } = &mut config.elements[1].kind {
                style.font_size = size;
            }
        };
        set_size(&mut config, MAX_FONT_SIZE);
        assert!(config.validate().is_ok());
        set_size(&mut config, 3000.0);
        assert!(config.validate().is_err());
        set_size(&mut config, f32::NAN);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_json_roundtrip_preserves_design() {
        let config = CardConfig::default();
        let json = config.to_json_pretty().unwrap();
        let back = CardConfig::from_json(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_empty_json_object_is_default_design() {
        let config = CardConfig::from_json("{}").unwrap();
        assert_eq!(config, CardConfig::default());
    }

    #[test]
    fn test_border_visibility() {
        let mut border = Border::default();
        assert!(border.is_visible());
        border.width = 0.0;
        assert!(!border.is_visible());
        border.width = 2.0;
        border.color = None;
        assert!(!border.is_visible());
    }
}
