//! # Page Packer
//!
//! Places fixed-size cards on A4 pages in a row-major grid.
//!
//! All geometry is in millimetres with the origin at the top-left corner of
//! the page. A card is 85 mm wide and keeps the 350:200 canvas aspect, so
//! it is 48.57 mm tall. Cards sit inside a 10 mm margin with a 2 mm gap.
//!
//! | Orientation | Page | Grid | Max per page |
//! |-------------|------|------|--------------|
//! | Portrait | 210×297 | 2×5 | 10 |
//! | Landscape | 297×210 | 3×3 | 9 |
//!
//! Oversubscription is capped silently: asking for 12 cards on a portrait
//! page places 10.

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::card::{CANVAS_HEIGHT, CANVAS_WIDTH, Color};
use crate::render::Surface;

pub const CARD_WIDTH_MM: f32 = 85.0;
pub const CARD_HEIGHT_MM: f32 = CARD_WIDTH_MM * CANVAS_HEIGHT / CANVAS_WIDTH;
pub const PAGE_MARGIN_MM: f32 = 10.0;
pub const CARD_GAP_MM: f32 = 2.0;

const A4_SHORT_MM: f32 = 210.0;
const A4_LONG_MM: f32 = 297.0;

/// Width of the rasterized sheet preview.
pub const SHEET_PREVIEW_WIDTH_PX: u32 = 400;

const SHEET_OUTLINE: Color = Color::rgb(0xe5, 0xe7, 0xeb);

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    /// Page (width, height) in millimetres.
    pub fn page_size_mm(self) -> (f32, f32) {
        match self {
            Orientation::Portrait => (A4_SHORT_MM, A4_LONG_MM),
            Orientation::Landscape => (A4_LONG_MM, A4_SHORT_MM),
        }
    }
}

/// Physical page and card dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub orientation: Orientation,
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub card_width_mm: f32,
    pub card_height_mm: f32,
    pub margin_mm: f32,
    pub gap_mm: f32,
}

impl PageGeometry {
    pub fn a4(orientation: Orientation) -> Self {
        let (page_width_mm, page_height_mm) = orientation.page_size_mm();
        Self {
            orientation,
            page_width_mm,
            page_height_mm,
            card_width_mm: CARD_WIDTH_MM,
            card_height_mm: CARD_HEIGHT_MM,
            margin_mm: PAGE_MARGIN_MM,
            gap_mm: CARD_GAP_MM,
        }
    }

    pub fn cards_per_row(&self) -> usize {
        ((self.page_width_mm - 2.0 * self.margin_mm) / self.card_width_mm).floor() as usize
    }

    pub fn cards_per_column(&self) -> usize {
        ((self.page_height_mm - 2.0 * self.margin_mm) / (self.card_height_mm + self.gap_mm))
            .floor() as usize
    }

    pub fn max_cards_per_page(&self) -> usize {
        self.cards_per_row() * self.cards_per_column()
    }

    /// Cards actually placed per page for a requested count. Requests below
    /// one count as one; requests above the grid capacity are capped.
    pub fn actual_cards_per_page(&self, requested: usize) -> usize {
        requested.max(1).min(self.max_cards_per_page().max(1))
    }

    /// Top-left corner of the grid cell at `index_on_page`, row-major.
    pub fn cell_origin(&self, index_on_page: usize) -> (f32, f32) {
        let per_row = self.cards_per_row().max(1);
        let row = index_on_page / per_row;
        let col = index_on_page % per_row;
        (
            self.margin_mm + col as f32 * (self.card_width_mm + self.gap_mm),
            self.margin_mm + row as f32 * (self.card_height_mm + self.gap_mm),
        )
    }

    /// Pack with a requested cards-per-page count.
    pub fn pack(&self, requested: usize) -> Packing {
        Packing {
            geometry: *self,
            per_page: self.actual_cards_per_page(requested),
        }
    }
}

/// Where one card of a roster lands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Position in the roster.
    pub index: usize,
    pub page: usize,
    pub index_on_page: usize,
    pub x_mm: f32,
    pub y_mm: f32,
}

/// A geometry with a fixed cards-per-page count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Packing {
    pub geometry: PageGeometry,
    pub per_page: usize,
}

impl Packing {
    pub fn placement(&self, index: usize) -> Placement {
        let index_on_page = index % self.per_page;
        let (x_mm, y_mm) = self.geometry.cell_origin(index_on_page);
        Placement {
            index,
            page: index / self.per_page,
            index_on_page,
            x_mm,
            y_mm,
        }
    }

    /// Whether a new page starts after card `index` of `total`: after every
    /// `per_page`-th card, never after the last one.
    pub fn page_break_after(&self, index: usize, total: usize) -> bool {
        (index + 1) % self.per_page == 0 && index + 1 < total
    }

    /// Pages needed for `total` cards. An empty roster still has one
    /// (blank) page.
    pub fn page_count(&self, total: usize) -> usize {
        total.div_ceil(self.per_page).max(1)
    }

    pub fn placements(&self, total: usize) -> impl Iterator<Item = Placement> + '_ {
        (0..total).map(move |i| self.placement(i))
    }
}

/// Rasterize one page at [`SHEET_PREVIEW_WIDTH_PX`] wide with `card`
/// repeated in each of the packing's cells.
pub fn render_sheet(packing: &Packing, card: &RgbaImage) -> Surface {
    let geometry = &packing.geometry;
    let px_per_mm = SHEET_PREVIEW_WIDTH_PX as f32 / geometry.page_width_mm;
    let height = (geometry.page_height_mm * px_per_mm).round() as u32;

    let mut sheet = Surface::new(SHEET_PREVIEW_WIDTH_PX, height);
    sheet.fill(Color::WHITE);

    for index in 0..packing.per_page {
        let (x_mm, y_mm) = geometry.cell_origin(index);
        sheet.draw_image(
            card,
            x_mm * px_per_mm,
            y_mm * px_per_mm,
            geometry.card_width_mm * px_per_mm,
            geometry.card_height_mm * px_per_mm,
        );
    }

    sheet.stroke_outline(2.0, SHEET_OUTLINE);
    sheet
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_card_height_keeps_canvas_aspect() {
        assert!((CARD_HEIGHT_MM - 48.571_43).abs() < 1e-3);
    }

    #[test]
    fn test_portrait_grid() {
        let g = PageGeometry::a4(Orientation::Portrait);
        assert_eq!(g.cards_per_row(), 2);
        assert_eq!(g.cards_per_column(), 5);
        assert_eq!(g.max_cards_per_page(), 10);
        assert_eq!(g.actual_cards_per_page(12), 10);
        assert_eq!(g.actual_cards_per_page(4), 4);
    }

    #[test]
    fn test_landscape_grid() {
        let g = PageGeometry::a4(Orientation::Landscape);
        assert_eq!(g.cards_per_row(), 3);
        assert_eq!(g.cards_per_column(), 3);
        assert_eq!(g.max_cards_per_page(), 9);
    }

    #[test]
    fn test_requested_below_one_counts_as_one() {
        let g = PageGeometry::a4(Orientation::Portrait);
        assert_eq!(g.actual_cards_per_page(0), 1);
    }

    #[test]
    fn test_cell_origins_row_major() {
        let g = PageGeometry::a4(Orientation::Portrait);
        assert_eq!(g.cell_origin(0), (10.0, 10.0));
        assert_eq!(g.cell_origin(1), (97.0, 10.0));
        let (x, y) = g.cell_origin(2);
        assert_eq!(x, 10.0);
        assert!((y - (10.0 + CARD_HEIGHT_MM + 2.0)).abs() < 1e-4);
    }

    #[test]
    fn test_placement_wraps_per_page() {
        let packing = PageGeometry::a4(Orientation::Portrait).pack(4);
        let p = packing.placement(5);
        assert_eq!(p.page, 1);
        assert_eq!(p.index_on_page, 1);
        assert_eq!((p.x_mm, p.y_mm), packing.geometry.cell_origin(1));
    }

    #[test]
    fn test_page_breaks_for_25_students() {
        let packing = PageGeometry::a4(Orientation::Portrait).pack(10);
        let breaks: Vec<usize> = (0..25)
            .filter(|&i| packing.page_break_after(i, 25))
            .collect();
        assert_eq!(breaks, vec![9, 19]);
        assert_eq!(packing.page_count(25), 3);
    }

    #[test]
    fn test_no_break_after_last_full_page() {
        let packing = PageGeometry::a4(Orientation::Portrait).pack(10);
        assert!(!packing.page_break_after(19, 20));
        assert_eq!(packing.page_count(20), 2);
    }

    #[test]
    fn test_empty_roster_has_one_page() {
        let packing = PageGeometry::a4(Orientation::Landscape).pack(9);
        assert_eq!(packing.page_count(0), 1);
        assert_eq!(packing.placements(0).count(), 0);
    }

    #[test]
    fn test_placements_cover_roster_in_order() {
        let packing = PageGeometry::a4(Orientation::Landscape).pack(9);
        let pages: Vec<usize> = packing.placements(11).map(|p| p.page).collect();
        assert_eq!(pages, vec![0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 1]);
    }

    #[test]
    fn test_orientation_serde() {
        assert_eq!(serde_json::to_string(&Orientation::Landscape).unwrap(), "\"landscape\"");
        let o: Orientation = serde_json::from_str("\"portrait\"").unwrap();
        assert_eq!(o, Orientation::Portrait);
    }

    #[test]
    fn test_render_sheet_places_cards() {
        let card = RgbaImage::from_pixel(350, 200, Color::rgb(255, 0, 0).to_rgba());
        let packing = PageGeometry::a4(Orientation::Portrait).pack(3);
        let sheet = render_sheet(&packing, &card);
        assert_eq!(sheet.width(), 400);
        assert_eq!(sheet.height(), 566);

        let px_per_mm = 400.0 / 210.0;
        let probe = |index: usize| {
            let (x, y) = packing.geometry.cell_origin(index);
            sheet.pixel(((x + 20.0) * px_per_mm) as u32, ((y + 20.0) * px_per_mm) as u32)
        };
        assert_eq!(probe(0), Color::rgb(255, 0, 0).to_rgba());
        assert_eq!(probe(2), Color::rgb(255, 0, 0).to_rgba());
        // Fourth cell is empty
        assert_eq!(probe(3), Color::WHITE.to_rgba());
    }
}
