//! RGBA drawing surface with the handful of canvas primitives cards need.
//!
//! Coordinates are in pixels with the origin at the top-left corner. All
//! drawing composites source-over with straight alpha, the same model as an
//! HTML canvas 2D context.

use image::{ImageFormat, Rgba, RgbaImage, imageops};
use rayon::prelude::*;
use std::io::Cursor;

use crate::card::Color;
use crate::error::CarnetError;

/// Source-over composite of `src` onto `dst`, with `coverage` scaling the
/// source alpha (anti-aliasing).
#[inline]
pub fn blend_over(dst: Rgba<u8>, src: Rgba<u8>, coverage: f32) -> Rgba<u8> {
    let sa = src[3] as f32 / 255.0 * coverage.clamp(0.0, 1.0);
    if sa <= 0.0 {
        return dst;
    }
    let da = dst[3] as f32 / 255.0;
    let oa = sa + da * (1.0 - sa);
    let ch = |s: u8, d: u8| {
        ((s as f32 * sa + d as f32 * da * (1.0 - sa)) / oa)
            .round()
            .clamp(0.0, 255.0) as u8
    };
    Rgba([
        ch(src[0], dst[0]),
        ch(src[1], dst[1]),
        ch(src[2], dst[2]),
        (oa * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

/// A raster surface.
#[derive(Debug, Clone)]
pub struct Surface {
    img: RgbaImage,
}

impl Surface {
    /// Fully transparent surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            img: RgbaImage::new(width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.img.width()
    }

    pub fn height(&self) -> u32 {
        self.img.height()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        *self.img.get_pixel(x, y)
    }

    pub fn image(&self) -> &RgbaImage {
        &self.img
    }

    /// Composite one pixel; out-of-bounds coordinates are ignored.
    #[inline]
    pub fn blend_pixel(&mut self, x: i64, y: i64, color: Color, coverage: f32) {
        if x < 0 || y < 0 || x >= self.img.width() as i64 || y >= self.img.height() as i64 {
            return;
        }
        let dst = self.img.get_pixel_mut(x as u32, y as u32);
        *dst = blend_over(*dst, color.to_rgba(), coverage);
    }

    /// Fill the whole surface with a per-pixel shade, rows in parallel.
    pub fn fill_with<F>(&mut self, shade: F)
    where
        F: Fn(u32, u32) -> Color + Sync,
    {
        let row_len = self.img.width() as usize * 4;
        if row_len == 0 {
            return;
        }
        self.img
            .par_chunks_mut(row_len)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, px) in row.chunks_exact_mut(4).enumerate() {
                    let dst = Rgba([px[0], px[1], px[2], px[3]]);
                    let out = blend_over(dst, shade(x as u32, y as u32).to_rgba(), 1.0);
                    px.copy_from_slice(&out.0);
                }
            });
    }

    pub fn fill(&mut self, color: Color) {
        self.fill_with(|_, _| color);
    }

    /// Two-stop linear gradient from x = 0 (start) to x = width (end).
    pub fn fill_linear_horizontal(&mut self, start: Color, end: Color) {
        let width = self.img.width() as f32;
        self.fill_with(|x, _| start.lerp(end, (x as f32 + 0.5) / width));
    }

    /// Two-stop radial gradient around (`cx`, `cy`); pixels beyond `radius`
    /// take the end color.
    pub fn fill_radial(&mut self, cx: f32, cy: f32, radius: f32, start: Color, end: Color) {
        let radius = radius.max(f32::EPSILON);
        self.fill_with(|x, y| {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            start.lerp(end, (dx * dx + dy * dy).sqrt() / radius)
        });
    }

    /// Fill an axis-aligned rectangle. Pixels whose centers fall inside are
    /// covered.
    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) {
        self.tint_rect(x, y, w, h, color, 1.0);
    }

    /// Like [`Surface::fill_rect`], with the color laid down at `opacity`.
    pub fn tint_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color, opacity: f32) {
        let x0 = (x - 0.5).ceil().max(0.0) as i64;
        let y0 = (y - 0.5).ceil().max(0.0) as i64;
        let x1 = ((x + w - 0.5).ceil() as i64).min(self.img.width() as i64);
        let y1 = ((y + h - 0.5).ceil() as i64).min(self.img.height() as i64);
        for py in y0..y1 {
            for px in x0..x1 {
                self.blend_pixel(px, py, color, opacity);
            }
        }
    }

    /// 1px dashed outline just inside the box, `dash` pixels on then off.
    pub fn stroke_dashed_rect(&mut self, x: f32, y: f32, w: f32, h: f32, dash: u32, color: Color) {
        let left = x.round() as i64;
        let top = y.round() as i64;
        let right = (x + w).round() as i64 - 1;
        let bottom = (y + h).round() as i64 - 1;
        if right < left || bottom < top {
            return;
        }
        let period = dash.max(1) as i64 * 2;
        let on = |step: i64| step.rem_euclid(period) < period / 2;

        let (cols, rows) = (self.img.width() as i64, self.img.height() as i64);
        for px in left.max(0)..=right.min(cols - 1) {
            if on(px - left) {
                self.blend_pixel(px, top, color, 1.0);
                self.blend_pixel(px, bottom, color, 1.0);
            }
        }
        for py in top.max(0)..=bottom.min(rows - 1) {
            if on(py - top) {
                self.blend_pixel(left, py, color, 1.0);
                self.blend_pixel(right, py, color, 1.0);
            }
        }
    }

    /// 1px grid lines every `spacing` pixels, starting at the origin.
    pub fn draw_grid(&mut self, spacing: u32, color: Color, opacity: f32) {
        if spacing == 0 {
            return;
        }
        let (w, h) = (self.img.width(), self.img.height());
        for y in 0..h {
            for x in 0..w {
                if x % spacing == 0 || y % spacing == 0 {
                    self.blend_pixel(x as i64, y as i64, color, opacity);
                }
            }
        }
    }

    /// Stroke the surface outline with a line of `line_width` centered on
    /// the edge, so only the inner half lands on the surface
    /// (`strokeRect(0, 0, w, h)`). Partial pixels are anti-aliased.
    pub fn stroke_outline(&mut self, line_width: f32, color: Color) {
        let half = line_width / 2.0;
        if half <= 0.0 {
            return;
        }
        let (w, h) = (self.img.width(), self.img.height());
        let reach = half.ceil() as u32;
        for y in 0..h {
            let dy = y.min(h - 1 - y);
            for x in 0..w {
                let dx = x.min(w - 1 - x);
                if dx >= reach && dy >= reach {
                    continue;
                }
                let coverage = (half - dx.min(dy) as f32).clamp(0.0, 1.0);
                self.blend_pixel(x as i64, y as i64, color, coverage);
            }
        }
    }

    /// Draw `src` stretched into the box (`x`, `y`, `w`, `h`), ignoring its
    /// aspect ratio.
    ///
    /// Only the part of the box that lands on the surface is resampled.
    pub fn draw_image(&mut self, src: &RgbaImage, x: f32, y: f32, w: f32, h: f32) {
        let (tw, th) = (w.round(), h.round());
        if tw < 1.0 || th < 1.0 || src.width() == 0 || src.height() == 0 {
            return;
        }
        let (left, top) = (x.round(), y.round());
        let x0 = left.max(0.0);
        let y0 = top.max(0.0);
        let x1 = (left + tw).min(self.width() as f32);
        let y1 = (top + th).min(self.height() as f32);
        if x1 <= x0 || y1 <= y0 {
            return;
        }

        let fully_visible = x0 == left && y0 == top && x1 == left + tw && y1 == top + th;
        let scaled = if fully_visible {
            imageops::resize(src, tw as u32, th as u32, imageops::FilterType::Triangle)
        } else {
            let sx = src.width() as f32 / tw;
            let sy = src.height() as f32 / th;
            let cx = (((x0 - left) * sx).floor() as u32).min(src.width() - 1);
            let cy = (((y0 - top) * sy).floor() as u32).min(src.height() - 1);
            let cw = (((x1 - x0) * sx).ceil() as u32).clamp(1, src.width() - cx);
            let ch = (((y1 - y0) * sy).ceil() as u32).clamp(1, src.height() - cy);
            let visible = imageops::crop_imm(src, cx, cy, cw, ch).to_image();
            imageops::resize(
                &visible,
                (x1 - x0) as u32,
                (y1 - y0) as u32,
                imageops::FilterType::Triangle,
            )
        };
        imageops::overlay(&mut self.img, &scaled, x0 as i64, y0 as i64);
    }

    /// Encode as PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>, CarnetError> {
        encode_png(&self.img)
    }
}

/// Encode an RGBA image as PNG bytes.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>, CarnetError> {
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .map_err(|e| CarnetError::Image(format!("Failed to encode PNG: {}", e)))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Color = Color::rgb(255, 0, 0);
    const BLUE: Color = Color::rgb(0, 0, 255);

    #[test]
    fn test_blend_opaque_replaces() {
        let out = blend_over(Rgba([1, 2, 3, 255]), Rgba([9, 9, 9, 255]), 1.0);
        assert_eq!(out, Rgba([9, 9, 9, 255]));
    }

    #[test]
    fn test_blend_half_coverage() {
        let out = blend_over(Rgba([255, 255, 255, 255]), Rgba([0, 0, 0, 255]), 0.5);
        assert_eq!(out, Rgba([128, 128, 128, 255]));
    }

    #[test]
    fn test_blend_onto_transparent_keeps_source_color() {
        let out = blend_over(Rgba([0, 0, 0, 0]), Rgba([200, 100, 50, 255]), 1.0);
        assert_eq!(out, Rgba([200, 100, 50, 255]));
    }

    #[test]
    fn test_fill() {
        let mut s = Surface::new(4, 3);
        s.fill(RED);
        assert!(s.image().pixels().all(|p| *p == RED.to_rgba()));
    }

    #[test]
    fn test_linear_gradient_runs_left_to_right() {
        let mut s = Surface::new(100, 2);
        s.fill_linear_horizontal(Color::BLACK, Color::WHITE);
        let left = s.pixel(0, 0)[0];
        let mid = s.pixel(50, 1)[0];
        let right = s.pixel(99, 0)[0];
        assert!(left < 5);
        assert!((120..=135).contains(&mid));
        assert!(right > 250);
        // Constant along y
        assert_eq!(s.pixel(30, 0), s.pixel(30, 1));
    }

    #[test]
    fn test_radial_gradient_center_and_edge() {
        let mut s = Surface::new(350, 200);
        s.fill_radial(175.0, 100.0, 175.0, Color::WHITE, Color::BLACK);
        assert!(s.pixel(175, 100)[0] > 250);
        // Corners are beyond the radius
        assert_eq!(s.pixel(0, 0), Color::BLACK.to_rgba());
    }

    #[test]
    fn test_fill_rect_covers_pixel_centers() {
        let mut s = Surface::new(10, 10);
        s.fill(Color::WHITE);
        s.fill_rect(2.0, 3.0, 4.0, 2.0, BLUE);
        assert_eq!(s.pixel(2, 3), BLUE.to_rgba());
        assert_eq!(s.pixel(5, 4), BLUE.to_rgba());
        assert_eq!(s.pixel(6, 4), Color::WHITE.to_rgba());
        assert_eq!(s.pixel(2, 5), Color::WHITE.to_rgba());
    }

    #[test]
    fn test_stroke_outline_inner_half() {
        let mut s = Surface::new(50, 30);
        s.fill(Color::WHITE);
        s.stroke_outline(6.0, Color::BLACK);
        // Inner half of a 6px line is 3px deep
        assert_eq!(s.pixel(0, 15), Color::BLACK.to_rgba());
        assert_eq!(s.pixel(2, 15), Color::BLACK.to_rgba());
        assert_eq!(s.pixel(3, 15), Color::WHITE.to_rgba());
        assert_eq!(s.pixel(25, 29), Color::BLACK.to_rgba());
        assert_eq!(s.pixel(25, 15), Color::WHITE.to_rgba());
    }

    #[test]
    fn test_stroke_outline_thin_line_is_antialiased() {
        let mut s = Surface::new(20, 20);
        s.fill(Color::WHITE);
        s.stroke_outline(1.0, Color::BLACK);
        let edge = s.pixel(0, 10)[0];
        assert!(edge > 100 && edge < 150, "half-covered edge, got {}", edge);
        assert_eq!(s.pixel(1, 10), Color::WHITE.to_rgba());
    }

    #[test]
    fn test_draw_image_stretches() {
        let src = RgbaImage::from_pixel(2, 2, RED.to_rgba());
        let mut s = Surface::new(20, 20);
        s.fill(Color::WHITE);
        s.draw_image(&src, 5.0, 5.0, 10.0, 4.0);
        assert_eq!(s.pixel(5, 5), RED.to_rgba());
        assert_eq!(s.pixel(14, 8), RED.to_rgba());
        assert_eq!(s.pixel(15, 8), Color::WHITE.to_rgba());
        assert_eq!(s.pixel(10, 9), Color::WHITE.to_rgba());
    }

    #[test]
    fn test_draw_image_clips_at_edges() {
        let src = RgbaImage::from_pixel(4, 4, RED.to_rgba());
        let mut s = Surface::new(10, 10);
        s.draw_image(&src, -2.0, 8.0, 4.0, 4.0);
        assert_eq!(s.pixel(0, 9), RED.to_rgba());
    }

    #[test]
    fn test_draw_image_resamples_visible_part_only() {
        let mut src = RgbaImage::new(2, 1);
        src.put_pixel(0, 0, RED.to_rgba());
        src.put_pixel(1, 0, BLUE.to_rgba());
        let mut s = Surface::new(10, 10);
        s.draw_image(&src, -10.0, 0.0, 20.0, 10.0);
        assert_eq!(s.pixel(5, 5), BLUE.to_rgba());
    }

    #[test]
    fn test_draw_image_huge_box_is_bounded_by_surface() {
        let src = RgbaImage::from_pixel(1, 1, RED.to_rgba());
        let mut s = Surface::new(20, 20);
        s.draw_image(&src, -100_000.0, -100_000.0, 200_350.0, 200_200.0);
        assert_eq!(s.pixel(0, 0), RED.to_rgba());
        assert_eq!(s.pixel(19, 19), RED.to_rgba());
    }

    #[test]
    fn test_tint_rect_blends_at_opacity() {
        let mut s = Surface::new(10, 10);
        s.fill(Color::WHITE);
        s.tint_rect(0.0, 0.0, 5.0, 5.0, Color::BLACK, 0.5);
        assert_eq!(s.pixel(2, 2), Rgba([128, 128, 128, 255]));
        assert_eq!(s.pixel(7, 7), Color::WHITE.to_rgba());
    }

    #[test]
    fn test_stroke_dashed_rect_alternates() {
        let mut s = Surface::new(20, 20);
        s.fill(Color::WHITE);
        s.stroke_dashed_rect(2.0, 2.0, 12.0, 8.0, 2, Color::BLACK);
        // Top edge: two on, two off
        assert_eq!(s.pixel(2, 2), Color::BLACK.to_rgba());
        assert_eq!(s.pixel(3, 2), Color::BLACK.to_rgba());
        assert_eq!(s.pixel(4, 2), Color::WHITE.to_rgba());
        assert_eq!(s.pixel(6, 2), Color::BLACK.to_rgba());
        // Bottom and right edges sit inside the box
        assert_eq!(s.pixel(2, 9), Color::BLACK.to_rgba());
        assert_eq!(s.pixel(13, 2), Color::BLACK.to_rgba());
        // Interior untouched
        assert_eq!(s.pixel(7, 5), Color::WHITE.to_rgba());
    }

    #[test]
    fn test_draw_grid_spacing() {
        let mut s = Surface::new(25, 25);
        s.fill(Color::WHITE);
        s.draw_grid(10, Color::BLACK, 1.0);
        assert_eq!(s.pixel(10, 3), Color::BLACK.to_rgba());
        assert_eq!(s.pixel(3, 20), Color::BLACK.to_rgba());
        assert_eq!(s.pixel(5, 5), Color::WHITE.to_rgba());
    }

    #[test]
    fn test_encode_png_signature() {
        let png = Surface::new(3, 3).encode_png().unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }
}
