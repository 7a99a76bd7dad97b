//! Text rasterization.
//!
//! Text is drawn like a canvas `fillText`: the run starts at `x` and sits on
//! `baseline`. Two glyph sources are available:
//!
//! - TrueType/OpenType faces registered in a [`FontBook`] (anti-aliased via
//!   `ab_glyph`), looked up by CSS family name.
//! - Spleen bitmap fonts, scaled nearest-neighbor to the requested size.
//!   Used whenever a family has no registered face, so rendering never
//!   depends on fonts installed on the host.
//!
//! Bold without a bold face and italic are synthesized (double strike and a
//! row shear). Decorations are solid lines spanning the run's advance width.

use ab_glyph::{Font, FontArc, ScaleFont};
use spleen_font::{FONT_6X12, FONT_8X16, FONT_12X24, PSF2Font};
use std::collections::HashMap;
use std::path::Path;

use super::surface::Surface;
use crate::card::{Color, TextDecoration};
use crate::error::CarnetError;

/// Horizontal shear applied to synthesized italics (x shift per unit of
/// height above the baseline).
const ITALIC_SHEAR: f32 = 0.2;

/// One line of styled text to draw.
#[derive(Debug, Clone, Copy)]
pub struct TextRun<'a> {
    pub text: &'a str,
    pub x: f32,
    pub baseline: f32,
    /// Font size in pixels (em height).
    pub size: f32,
    pub bold: bool,
    pub italic: bool,
    pub color: Color,
    pub decoration: TextDecoration,
}

struct Faces {
    regular: FontArc,
    bold: Option<FontArc>,
}

/// Registry of outline fonts keyed by lower-cased family name.
#[derive(Default)]
pub struct FontBook {
    families: HashMap<String, Faces>,
}

impl FontBook {
    /// A book with no outline faces; every family falls back to Spleen.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a family from raw font bytes.
    pub fn register(
        &mut self,
        family: &str,
        regular: Vec<u8>,
        bold: Option<Vec<u8>>,
    ) -> Result<(), CarnetError> {
        let regular = parse_face(family, regular)?;
        let bold = bold.map(|b| parse_face(family, b)).transpose()?;
        self.families
            .insert(family.to_lowercase(), Faces { regular, bold });
        Ok(())
    }

    /// Load every `.ttf`/`.otf` in `dir`.
    ///
    /// The file stem names the family (`Arial.ttf`); a `-Bold` suffix marks
    /// the bold face (`Arial-Bold.ttf`). A bold file without a regular
    /// sibling is registered as the regular face too.
    pub fn load_dir(dir: &Path) -> Result<Self, CarnetError> {
        let mut regular: HashMap<String, Vec<u8>> = HashMap::new();
        let mut bold: HashMap<String, Vec<u8>> = HashMap::new();

        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let is_font = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("ttf") || e.eq_ignore_ascii_case("otf"));
            if !is_font {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let bytes = std::fs::read(&path)?;
            match stem.strip_suffix("-Bold") {
                Some(family) => bold.insert(family.to_lowercase(), bytes),
                None => regular.insert(stem.to_lowercase(), bytes),
            };
        }

        let mut book = Self::new();
        for (family, bytes) in regular {
            let bold_bytes = bold.remove(&family);
            book.register(&family, bytes, bold_bytes)?;
        }
        for (family, bytes) in bold {
            book.register(&family, bytes.clone(), Some(bytes))?;
        }
        tracing::info!(dir = %dir.display(), families = book.families.len(), "Loaded fonts");
        Ok(book)
    }

    /// Draw `run` in `family`. Returns the advance width in pixels.
    pub fn draw(&self, surface: &mut Surface, family: &str, run: &TextRun<'_>) -> f32 {
        if run.text.is_empty() || !(run.size > 0.0) {
            return 0.0;
        }

        let width = match self.families.get(&family.to_lowercase()) {
            Some(faces) => {
                let (face, synthetic_bold) = match (&faces.bold, run.bold) {
                    (Some(bold), true) => (bold, false),
                    (None, true) => (&faces.regular, true),
                    (_, false) => (&faces.regular, false),
                };
                draw_outline(surface, face, run, synthetic_bold)
            }
            None => draw_bitmap(surface, run),
        };

        draw_decoration(surface, run, width);
        width
    }
}

fn parse_face(family: &str, bytes: Vec<u8>) -> Result<FontArc, CarnetError> {
    FontArc::try_from_vec(bytes)
        .map_err(|e| CarnetError::Config(format!("Invalid font for family '{}': {}", family, e)))
}

#[inline]
fn shear(run: &TextRun<'_>, y: f32) -> f32 {
    if run.italic {
        (run.baseline - y) * ITALIC_SHEAR
    } else {
        0.0
    }
}

fn draw_outline(
    surface: &mut Surface,
    font: &FontArc,
    run: &TextRun<'_>,
    synthetic_bold: bool,
) -> f32 {
    let scaled = font.as_scaled(run.size);
    let mut caret = run.x;

    for ch in run.text.chars() {
        let glyph_id = font.glyph_id(ch);
        let advance = scaled.h_advance(glyph_id);
        let glyph =
            glyph_id.with_scale_and_position(run.size, ab_glyph::point(caret, run.baseline));

        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|px, py, coverage| {
                let y = bounds.min.y + py as f32;
                let x = bounds.min.x + px as f32 + shear(run, y);
                surface.blend_pixel(x.round() as i64, y as i64, run.color, coverage);
                if synthetic_bold {
                    surface.blend_pixel(x.round() as i64 + 1, y as i64, run.color, coverage);
                }
            });
        }
        caret += advance;
    }

    caret - run.x
}

/// Spleen source cell selected for a target size.
#[derive(Debug, Clone, Copy, PartialEq)]
struct BitmapCell {
    width: usize,
    height: usize,
    /// Rows from the top of the cell to the baseline.
    ascent: usize,
}

impl BitmapCell {
    fn for_size(size: f32) -> Self {
        if size <= 12.0 {
            Self {
                width: 6,
                height: 12,
                ascent: 10,
            }
        } else if size <= 16.0 {
            Self {
                width: 8,
                height: 16,
                ascent: 13,
            }
        } else {
            Self {
                width: 12,
                height: 24,
                ascent: 19,
            }
        }
    }

    fn scale(&self, size: f32) -> f32 {
        size / self.height as f32
    }

    fn advance(&self, size: f32) -> f32 {
        self.width as f32 * self.scale(size)
    }

    fn data(&self) -> &'static [u8] {
        match self.height {
            12 => FONT_6X12,
            16 => FONT_8X16,
            _ => FONT_12X24,
        }
    }

    /// Hollow box used for characters the font lacks.
    fn missing_glyph(&self) -> Vec<bool> {
        let mut bitmap = vec![false; self.width * self.height];
        let top = self.height / 6;
        let bottom = self.ascent.min(self.height - 1);
        for y in top..=bottom {
            for x in 1..self.width.saturating_sub(1) {
                if y == top || y == bottom || x == 1 || x == self.width - 2 {
                    bitmap[y * self.width + x] = true;
                }
            }
        }
        bitmap
    }
}

fn draw_bitmap(surface: &mut Surface, run: &TextRun<'_>) -> f32 {
    let cell = BitmapCell::for_size(run.size);
    let scale = cell.scale(run.size);
    let advance = cell.advance(run.size);
    let Ok(mut font) = PSF2Font::new(cell.data()) else {
        tracing::warn!("Spleen font data failed to parse");
        return 0.0;
    };
    let mut glyph_bitmap = |ch: char| -> Vec<bool> {
        let utf8_bytes = ch.to_string();
        match font.glyph_for_utf8(utf8_bytes.as_bytes()) {
            Some(glyph) => {
                let mut bitmap = vec![false; cell.width * cell.height];
                for (row_y, row) in glyph.enumerate() {
                    for (col_x, on) in row.enumerate() {
                        if row_y < cell.height && col_x < cell.width {
                            bitmap[row_y * cell.width + col_x] = on;
                        }
                    }
                }
                bitmap
            }
            None if ch.is_whitespace() => vec![false; cell.width * cell.height],
            None => cell.missing_glyph(),
        }
    };

    let dst_w = advance.round().max(1.0) as usize;
    let dst_h = run.size.round().max(1.0) as usize;
    let top = run.baseline - cell.ascent as f32 * scale;
    let bold_offset = (scale * 0.5).round().max(1.0) as i64;

    let mut caret = run.x;
    for ch in run.text.chars() {
        let bitmap = glyph_bitmap(ch);
        for dy in 0..dst_h {
            let sy = (dy * cell.height / dst_h).min(cell.height - 1);
            let y = top + dy as f32;
            let offset = caret + shear(run, y);
            for dx in 0..dst_w {
                let sx = (dx * cell.width / dst_w).min(cell.width - 1);
                if !bitmap[sy * cell.width + sx] {
                    continue;
                }
                let px = (offset + dx as f32).round() as i64;
                let py = y.round() as i64;
                surface.blend_pixel(px, py, run.color, 1.0);
                if run.bold {
                    surface.blend_pixel(px + bold_offset, py, run.color, 1.0);
                }
            }
        }
        caret += advance;
    }

    caret - run.x
}

fn draw_decoration(surface: &mut Surface, run: &TextRun<'_>, width: f32) {
    let y = match run.decoration {
        TextDecoration::None => return,
        TextDecoration::Underline => run.baseline + run.size * 0.1,
        TextDecoration::Overline => run.baseline - run.size * 0.85,
        TextDecoration::LineThrough => run.baseline - run.size * 0.3,
    };
    let thickness = (run.size / 14.0).max(1.0);
    surface.fill_rect(run.x, y, width, thickness, run.color);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str, size: f32) -> TextRun<'_> {
        TextRun {
            text,
            x: 10.0,
            baseline: 40.0,
            size,
            bold: false,
            italic: false,
            color: Color::BLACK,
            decoration: TextDecoration::None,
        }
    }

    fn ink(surface: &Surface) -> usize {
        surface
            .image()
            .pixels()
            .filter(|p| p[3] > 0)
            .count()
    }

    #[test]
    fn test_bitmap_cell_selection() {
        assert_eq!(BitmapCell::for_size(10.0).height, 12);
        assert_eq!(BitmapCell::for_size(16.0).height, 16);
        assert_eq!(BitmapCell::for_size(18.0).height, 24);
    }

    #[test]
    fn test_bitmap_text_draws_ink_above_baseline() {
        let book = FontBook::new();
        let mut s = Surface::new(200, 60);
        let width = book.draw(&mut s, "Arial", &run("Hola", 16.0));
        assert!(width > 0.0);
        assert!(ink(&s) > 0);
        // Nothing far below the baseline
        for x in 0..200 {
            assert_eq!(s.pixel(x, 50)[3], 0);
        }
    }

    #[test]
    fn test_empty_text_draws_nothing() {
        let book = FontBook::new();
        let mut s = Surface::new(50, 50);
        assert_eq!(book.draw(&mut s, "Arial", &run("", 16.0)), 0.0);
        assert_eq!(ink(&s), 0);
    }

    #[test]
    fn test_bold_adds_ink() {
        let book = FontBook::new();
        let mut regular = Surface::new(200, 60);
        book.draw(&mut regular, "Arial", &run("Mateo", 18.0));
        let mut bold = Surface::new(200, 60);
        let bold_run = TextRun {
            bold: true,
            ..run("Mateo", 18.0)
        };
        book.draw(&mut bold, "Arial", &bold_run);
        assert!(ink(&bold) > ink(&regular));
    }

    #[test]
    fn test_underline_spans_advance() {
        let book = FontBook::new();
        let mut s = Surface::new(200, 60);
        let underlined = TextRun {
            decoration: TextDecoration::Underline,
            ..run("iiii", 16.0)
        };
        let width = book.draw(&mut s, "Arial", &underlined);
        // Line starts at y = 41.6, so pixel row 42 is covered
        let y = 42;
        assert!(s.pixel(11, y)[3] > 0);
        assert!(s.pixel((10.0 + width - 1.0) as u32, y)[3] > 0);
    }

    #[test]
    fn test_unregistered_family() {
        let book = FontBook::new();
        assert!(book.families.is_empty());
    }

    #[test]
    fn test_register_rejects_garbage() {
        let mut book = FontBook::new();
        assert!(book.register("Broken", vec![0, 1, 2, 3], None).is_err());
    }

    #[test]
    fn test_load_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a font").unwrap();
        let book = FontBook::load_dir(dir.path()).unwrap();
        assert!(book.families.is_empty());
    }
}
