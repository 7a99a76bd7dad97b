//! Layout editor: the mutation side of the card model.
//!
//! The editor owns the design behind an `Arc`. Readers (preview, export)
//! take cheap snapshots; every edit either mutates through
//! [`Arc::make_mut`] or builds a validated replacement, so a snapshot held
//! by an in-flight export never observes later edits.
//!
//! Drag handling follows pointer semantics: `begin_drag` records the
//! pointer offset inside the element, `drag_to` moves the element so the
//! offset is preserved, clamped to the canvas minus [`DRAG_MARGIN`].

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::color::Color;
use super::model::{
    CANVAS_HEIGHT, CANVAS_WIDTH, CardConfig, ElementKind, GradientKind, TextStylePatch,
};
use crate::error::CarnetError;
use crate::render::images::encode_data_url;

/// Elements cannot be dragged closer than this to the right/bottom edge,
/// so a sliver always stays grabbable.
pub const DRAG_MARGIN: f32 = 10.0;

/// Border width slider range.
pub const MAX_BORDER_WIDTH: f32 = 10.0;

/// Border radius slider range.
pub const MAX_BORDER_RADIUS: f32 = 20.0;

/// A point in canvas units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Clamp an element origin to `[0, W - margin] × [0, H - margin]`.
pub fn clamp_position(x: f32, y: f32) -> Point {
    let clamp = |v: f32, max: f32| if v.is_nan() { 0.0 } else { v.clamp(0.0, max) };
    Point {
        x: clamp(x, CANVAS_WIDTH - DRAG_MARGIN),
        y: clamp(y, CANVAS_HEIGHT - DRAG_MARGIN),
    }
}

/// Partial element update from a property panel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementPatch {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub content: Option<String>,
    pub style: Option<TextStylePatch>,
}

/// Partial design update from the design panels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigPatch {
    pub background_color: Option<Color>,
    pub gradient_enabled: Option<bool>,
    pub gradient_kind: Option<GradientKind>,
    pub gradient_start: Option<Color>,
    pub gradient_end: Option<Color>,
    pub gradient_angle: Option<f32>,
    pub logo_url: Option<String>,
    pub school_name: Option<String>,
    pub student_name: Option<String>,
    pub student_id: Option<String>,
    pub qr_value: Option<String>,
    pub font: Option<String>,
    pub border_color: Option<Color>,
    pub border_width: Option<f32>,
    pub border_radius: Option<f32>,
}

#[derive(Debug, Clone)]
struct DragState {
    element_id: String,
    offset: Point,
}

/// Interactive editor state for one card design.
#[derive(Debug, Clone)]
pub struct LayoutEditor {
    config: Arc<CardConfig>,
    drag: Option<DragState>,
}

impl Default for LayoutEditor {
    fn default() -> Self {
        Self {
            config: Arc::new(CardConfig::default()),
            drag: None,
        }
    }
}

impl LayoutEditor {
    pub fn new(config: CardConfig) -> Result<Self, CarnetError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            drag: None,
        })
    }

    pub fn config(&self) -> &CardConfig {
        &self.config
    }

    /// Shared, immutable view of the current design.
    pub fn snapshot(&self) -> Arc<CardConfig> {
        Arc::clone(&self.config)
    }

    /// Replace the whole design (e.g. loading a saved design).
    pub fn replace(&mut self, config: CardConfig) -> Result<(), CarnetError> {
        config.validate()?;
        self.config = Arc::new(config);
        self.drag = None;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Dragging
    // ------------------------------------------------------------------------

    /// Start dragging `id` with the pointer at `pointer` (canvas units).
    pub fn begin_drag(&mut self, id: &str, pointer: Point) -> Result<(), CarnetError> {
        let el = self
            .config
            .element(id)
            .ok_or_else(|| CarnetError::UnknownElement(id.to_string()))?;
        self.drag = Some(DragState {
            element_id: id.to_string(),
            offset: Point::new(pointer.x - el.x, pointer.y - el.y),
        });
        Ok(())
    }

    /// Follow the pointer. Returns the element's new origin, or `None` when
    /// no drag is active.
    pub fn drag_to(&mut self, pointer: Point) -> Option<Point> {
        let drag = self.drag.clone()?;
        let target = clamp_position(pointer.x - drag.offset.x, pointer.y - drag.offset.y);
        self.set_position(&drag.element_id, target).ok()
    }

    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Move an element directly, with the same clamping as a drag.
    pub fn move_element(&mut self, id: &str, x: f32, y: f32) -> Result<Point, CarnetError> {
        self.set_position(id, clamp_position(x, y))
    }

    fn set_position(&mut self, id: &str, pos: Point) -> Result<Point, CarnetError> {
        if self.config.element(id).is_none() {
            return Err(CarnetError::UnknownElement(id.to_string()));
        }
        let config = Arc::make_mut(&mut self.config);
        if let Some(el) = config.element_mut(id) {
            el.x = pos.x;
            el.y = pos.y;
        }
        Ok(pos)
    }

    // ------------------------------------------------------------------------
    // Property panels
    // ------------------------------------------------------------------------

    /// Apply a partial update to one element.
    ///
    /// Style patches are merged over the element's current style, whose
    /// unset fields already fell back to defaults on load.
    pub fn update_element(&mut self, id: &str, patch: &ElementPatch) -> Result<(), CarnetError> {
        let mut next = (*self.config).clone();
        let el = next
            .element_mut(id)
            .ok_or_else(|| CarnetError::UnknownElement(id.to_string()))?;

        if let Some(x) = patch.x {
            el.x = x;
        }
        if let Some(y) = patch.y {
            el.y = y;
        }
        if let Some(w) = patch.width {
            el.width = w;
        }
        if let Some(h) = patch.height {
            el.height = h;
        }

        match &mut el.kind {
            ElementKind::Text { content, style } => {
                if let Some(c) = &patch.content {
                    *content = Some(c.clone());
                }
                if let Some(p) = &patch.style {
                    *style = style.merge(p);
                }
            }
            _ if patch.content.is_some() || patch.style.is_some() => {
                return Err(CarnetError::InvalidDesign(format!(
                    "element '{}' is not a text element",
                    id
                )));
            }
            _ => {}
        }

        next.validate()?;
        self.config = Arc::new(next);
        Ok(())
    }

    /// Apply a partial update to the design-level settings.
    pub fn apply_config(&mut self, patch: &ConfigPatch) -> Result<(), CarnetError> {
        let mut next = (*self.config).clone();
        let bg = &mut next.background;

        if let Some(c) = patch.background_color {
            bg.color = c;
        }
        if let Some(on) = patch.gradient_enabled {
            bg.gradient_enabled = on;
        }
        if let Some(kind) = patch.gradient_kind {
            bg.gradient_kind = kind;
        }
        if let Some(c) = patch.gradient_start {
            bg.gradient_start = c;
        }
        if let Some(c) = patch.gradient_end {
            bg.gradient_end = c;
        }
        if let Some(angle) = patch.gradient_angle {
            bg.gradient_angle = clamp_range(angle, 360.0);
        }
        if let Some(url) = &patch.logo_url {
            next.logo_url = url.clone();
        }
        if let Some(s) = &patch.school_name {
            next.school_name = s.clone();
        }
        if let Some(s) = &patch.student_name {
            next.student_name = s.clone();
        }
        if let Some(s) = &patch.student_id {
            next.student_id = s.clone();
        }
        if let Some(s) = &patch.qr_value {
            next.qr_value = s.clone();
        }
        if let Some(f) = &patch.font {
            next.font = f.clone();
        }
        if let Some(c) = patch.border_color {
            next.border.color = Some(c);
        }
        if let Some(w) = patch.border_width {
            next.border.width = clamp_range(w, MAX_BORDER_WIDTH);
        }
        if let Some(r) = patch.border_radius {
            next.border.radius = clamp_range(r, MAX_BORDER_RADIUS);
        }

        next.validate()?;
        self.config = Arc::new(next);
        Ok(())
    }

    /// Store an uploaded logo inline as a data URL.
    ///
    /// The bytes must be a decodable image; the MIME type is sniffed from
    /// the content, not trusted from the upload.
    pub fn set_logo_bytes(&mut self, bytes: &[u8]) -> Result<(), CarnetError> {
        let format = image::guess_format(bytes)
            .map_err(|e| CarnetError::Image(format!("Unrecognized logo format: {}", e)))?;
        let url = encode_data_url(format.to_mime_type(), bytes);
        Arc::make_mut(&mut self.config).logo_url = url;
        Ok(())
    }
}

fn clamp_range(v: f32, max: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, max) }
}
