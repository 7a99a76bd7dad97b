//! # Card Renderer
//!
//! Draws one populated card (a design plus one student) onto a 350×200 RGBA
//! surface. Previews and exports go through the same code path; the only
//! difference is [`RenderOptions`], which corrects the border stroke for the
//! print scale.
//!
//! ## Modules
//!
//! - [`surface`]: RGBA surface with fills, gradients, strokes and image blits
//! - [`text`]: text runs from TrueType faces or scaled Spleen bitmaps
//! - [`images`]: logo loading (data URL, HTTP, path) with cache and timeout
//!
//! ## Paint order
//!
//! 1. Background (flat, linear or radial gradient) over the whole surface
//! 2. Elements in sequence order, later over earlier
//! 3. Border, centered on the surface edge

pub mod images;
pub mod surface;
pub mod text;

use image::RgbaImage;
use std::sync::Arc;

use crate::card::{
    Background, Border, CANVAS_HEIGHT, CANVAS_WIDTH, CardConfig, CardElement, Color, ElementKind,
    ElementRole, FontStyle, GradientKind, resolve_text,
};
use crate::error::CarnetError;
use crate::layout::CARD_WIDTH_MM;
use crate::qr::QrGenerator;
use crate::roster::Student;

pub use images::{DEFAULT_LOAD_TIMEOUT, ImageLoader};
pub use surface::{Surface, encode_png};
pub use text::{FontBook, TextRun};

const LAYOUT_GRID_SPACING: u32 = 10;
const LAYOUT_GRID_OPACITY: f32 = 0.15;
const LAYOUT_TINT_OPACITY: f32 = 0.1;
const LAYOUT_DASH_PX: u32 = 3;

/// Ratio between virtual canvas units and printed millimetres.
///
/// Applied to border strokes on export so the line keeps its on-screen
/// weight once the card is shrunk to 85 mm.
pub fn export_scale_factor() -> f32 {
    CANVAS_WIDTH / CARD_WIDTH_MM
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    pub export: bool,
    pub scale_factor: f32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::preview()
    }
}

impl RenderOptions {
    pub fn preview() -> Self {
        Self {
            export: false,
            scale_factor: 1.0,
        }
    }

    pub fn export(scale_factor: f32) -> Self {
        Self {
            export: true,
            scale_factor,
        }
    }

    /// Border stroke width actually drawn for a configured width.
    pub fn stroke_width(&self, border_width: f32) -> f32 {
        if self.export {
            border_width * self.scale_factor
        } else {
            border_width
        }
    }
}

/// Renders cards. Cheap to clone; fonts and the image cache are shared.
#[derive(Clone)]
pub struct CardRenderer {
    fonts: Arc<FontBook>,
    images: Arc<ImageLoader>,
}

impl CardRenderer {
    pub fn new(fonts: Arc<FontBook>, images: Arc<ImageLoader>) -> Self {
        Self { fonts, images }
    }

    pub fn fonts(&self) -> &FontBook {
        &self.fonts
    }

    /// Load the design's logo, if it has one and a logo element shows it.
    ///
    /// A logo that cannot be loaded is skipped with a warning.
    pub async fn load_logo(&self, config: &CardConfig) -> Option<Arc<RgbaImage>> {
        let shows_logo = config.elements.iter().any(|el| el.kind == ElementKind::Logo);
        if config.has_logo() && shows_logo {
            self.images.try_load(&config.logo_url).await
        } else {
            None
        }
    }

    /// Draw one card for `student` with an already loaded logo. `qr` is
    /// stretched into the QR slot.
    pub fn draw(
        &self,
        config: &CardConfig,
        student: &Student,
        qr: &RgbaImage,
        logo: Option<&RgbaImage>,
        opts: RenderOptions,
    ) -> Surface {
        let mut surface = Surface::new(CANVAS_WIDTH as u32, CANVAS_HEIGHT as u32);
        paint_background(&mut surface, &config.background);

        for element in &config.elements {
            match &element.kind {
                ElementKind::Logo => {
                    if let Some(logo) = logo {
                        blit(&mut surface, logo, element);
                    }
                }
                ElementKind::Text { style, .. } => {
                    let text = style
                        .text_transform
                        .apply(resolve_text(element, config, student));
                    let run = TextRun {
                        text: &text,
                        x: element.x,
                        baseline: element.y + style.font_size,
                        size: style.font_size,
                        bold: style.font_weight.is_bold(),
                        italic: style.font_style == FontStyle::Italic,
                        color: style.color,
                        decoration: style.text_decoration,
                    };
                    self.fonts.draw(&mut surface, &config.font, &run);
                }
                ElementKind::Qr => {
                    if element.role() == ElementRole::QrSlot {
                        blit(&mut surface, qr, element);
                    }
                }
            }
        }

        paint_border(&mut surface, &config.border, opts);
        surface
    }

    /// Render one card for `student`: load the logo, then draw.
    ///
    /// Never fails: a logo that cannot be loaded is skipped with a warning.
    pub async fn render(
        &self,
        config: &CardConfig,
        student: &Student,
        qr: &RgbaImage,
        opts: RenderOptions,
    ) -> Surface {
        let logo = self.load_logo(config).await;
        self.draw(config, student, qr, logo.as_deref(), opts)
    }

    /// Render the design with its own placeholders (`student_name`,
    /// `student_id`, `qr_value`), as the editor shows it.
    pub async fn render_preview(
        &self,
        config: &CardConfig,
        qr: &dyn QrGenerator,
    ) -> Result<Surface, CarnetError> {
        let logo = self.load_logo(config).await;
        self.draw_preview(config, qr, logo.as_deref())
    }

    /// Blocking half of [`CardRenderer::render_preview`].
    pub fn draw_preview(
        &self,
        config: &CardConfig,
        qr: &dyn QrGenerator,
        logo: Option<&RgbaImage>,
    ) -> Result<Surface, CarnetError> {
        let student = Student::placeholder(&config.student_name, &config.student_id);
        let code = qr.render(&config.qr_value)?;
        Ok(self.draw(config, &student, &code, logo, RenderOptions::preview()))
    }

    /// Preview for arranging elements. See [`mark_layout`].
    pub async fn render_layout_preview(
        &self,
        config: &CardConfig,
        qr: &dyn QrGenerator,
        show_grid: bool,
    ) -> Result<Surface, CarnetError> {
        let mut surface = self.render_preview(config, qr).await?;
        mark_layout(&mut surface, config, show_grid);
        Ok(surface)
    }
}

/// Tint every element box and outline it with a dashed line, over an
/// optional alignment grid.
pub fn mark_layout(surface: &mut Surface, config: &CardConfig, show_grid: bool) {
    if show_grid {
        surface.draw_grid(LAYOUT_GRID_SPACING, Color::BLACK, LAYOUT_GRID_OPACITY);
    }
    for element in &config.elements {
        let (x, y, w, h) = (element.x, element.y, element.width, element.height);
        surface.tint_rect(x, y, w, h, Color::BLACK, LAYOUT_TINT_OPACITY);
        surface.stroke_dashed_rect(x, y, w, h, LAYOUT_DASH_PX, Color::BLACK);
    }
}

fn blit(surface: &mut Surface, image: &RgbaImage, element: &CardElement) {
    surface.draw_image(image, element.x, element.y, element.width, element.height);
}

/// Fill the whole surface with the configured background.
pub fn paint_background(surface: &mut Surface, background: &Background) {
    if !background.gradient_enabled {
        surface.fill(background.color);
        return;
    }
    let (start, end) = (background.gradient_start, background.gradient_end);
    match background.gradient_kind {
        GradientKind::Linear => surface.fill_linear_horizontal(start, end),
        GradientKind::Radial => {
            let cx = surface.width() as f32 / 2.0;
            let cy = surface.height() as f32 / 2.0;
            surface.fill_radial(cx, cy, cx, start, end);
        }
    }
}

pub fn paint_border(surface: &mut Surface, border: &Border, opts: RenderOptions) {
    if !border.is_visible() {
        return;
    }
    if let Some(color) = border.color {
        surface.stroke_outline(opts.stroke_width(border.width), color);
    }
}
