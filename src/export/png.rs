//! Single flat PNG export.
//!
//! Produces one 350×200 image from the design's placeholders: background
//! color plus three 16px black lines. Elements, logo, QR code and border
//! are not drawn, and students are not enumerated.

use crate::card::{CANVAS_HEIGHT, CANVAS_WIDTH, CardConfig, Color, TextDecoration};
use crate::error::CarnetError;
use crate::render::{FontBook, Surface, TextRun};

const LINE_SIZE: f32 = 16.0;
const LINE_X: f32 = 10.0;
const LINE_BASELINES: [f32; 3] = [30.0, 60.0, 90.0];

pub fn render_flat_card(config: &CardConfig, fonts: &FontBook) -> Surface {
    let mut surface = Surface::new(CANVAS_WIDTH as u32, CANVAS_HEIGHT as u32);
    surface.fill(config.background.color);

    let lines = [
        config.school_name.as_str(),
        config.student_name.as_str(),
        config.student_id.as_str(),
    ];
    for (text, baseline) in lines.into_iter().zip(LINE_BASELINES) {
        let run = TextRun {
            text,
            x: LINE_X,
            baseline,
            size: LINE_SIZE,
            bold: false,
            italic: false,
            color: Color::BLACK,
            decoration: TextDecoration::None,
        };
        fonts.draw(&mut surface, "Arial", &run);
    }
    surface
}

pub fn render_flat_png(config: &CardConfig, fonts: &FontBook) -> Result<Vec<u8>, CarnetError> {
    render_flat_card(config, fonts).encode_png()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_card_ignores_elements_and_border() {
        let mut config = CardConfig::default();
        config.background.color = Color::rgb(0, 128, 0);
        let s = render_flat_card(&config, &FontBook::new());
        assert_eq!((s.width(), s.height()), (350, 200));
        // No border at the edge, no QR in its default slot
        assert_eq!(s.pixel(0, 0), Color::rgb(0, 128, 0).to_rgba());
        assert_eq!(s.pixel(250, 150), Color::rgb(0, 128, 0).to_rgba());
    }

    #[test]
    fn test_flat_card_draws_three_lines() {
        let s = render_flat_card(&CardConfig::default(), &FontBook::new());
        let row_has_ink = |y0: u32, y1: u32| {
            (y0..y1).any(|y| (0..350).any(|x| s.pixel(x, y) == Color::BLACK.to_rgba()))
        };
        assert!(row_has_ink(17, 30));
        assert!(row_has_ink(47, 60));
        assert!(row_has_ink(77, 90));
        assert!(!row_has_ink(100, 200));
    }

    #[test]
    fn test_flat_png_encodes() {
        let png = render_flat_png(&CardConfig::default(), &FontBook::new()).unwrap();
        assert_eq!(&png[..4], b"\x89PNG");
    }
}
