//! PDF assembly: card PNGs placed on A4 pages.

use printpdf::image::RawImage;
use printpdf::xobject::{XObject, XObjectTransform};
use printpdf::{Layer, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, Pt, XObjectId};

use super::ExportError;
use crate::layout::{PageGeometry, Placement};

const PT_PER_MM: f32 = 72.0 / 25.4;

/// Builds a multi-page PDF one card at a time.
///
/// The current page is only pushed on [`break_page`](Self::break_page) or
/// [`finish`](Self::finish), so a document always has at least one page.
pub struct PdfSheetWriter {
    document: PdfDocument,
    geometry: PageGeometry,
    ops: Vec<Op>,
}

impl PdfSheetWriter {
    pub fn new(title: &str, geometry: PageGeometry) -> Self {
        let mut writer = Self {
            document: PdfDocument::new(title),
            geometry,
            ops: Vec::new(),
        };
        writer.open_page();
        writer
    }

    fn open_page(&mut self) {
        let layer_name = format!("Page {} Cards", self.document.pages.len() + 1);
        let layer_id = self.document.add_layer(&Layer::new(&*layer_name));
        self.ops.push(Op::BeginLayer { layer_id });
    }

    fn page_height_pt(&self) -> f32 {
        self.geometry.page_height_mm * PT_PER_MM
    }

    /// Place an encoded card image at `placement`, sized to the card.
    pub fn place_card(&mut self, png: &[u8], placement: &Placement) -> Result<(), ExportError> {
        let mut warnings = Vec::new();
        let raw_image = RawImage::decode_from_bytes(png, &mut warnings)
            .map_err(|e| ExportError::Pdf(format!("Failed to decode card image: {}", e)))?;
        let (img_w, img_h) = (raw_image.width as f32, raw_image.height as f32);

        let xobj_id = XObjectId::new();
        self.document
            .resources
            .xobjects
            .map
            .insert(xobj_id.clone(), XObject::Image(raw_image));

        let width_pt = self.geometry.card_width_mm * PT_PER_MM;
        let height_pt = self.geometry.card_height_mm * PT_PER_MM;
        let x_pt = placement.x_mm * PT_PER_MM;
        let y_pt = self.page_height_pt() - (placement.y_mm * PT_PER_MM + height_pt);

        let transform = XObjectTransform {
            translate_x: Some(Pt(x_pt)),
            translate_y: Some(Pt(y_pt)),
            scale_x: Some(width_pt / img_w),
            scale_y: Some(height_pt / img_h),
            rotate: None,
            dpi: Some(72.0),
        };
        self.ops.push(Op::UseXobject {
            id: xobj_id,
            transform,
        });
        Ok(())
    }

    /// Close the current page and start a new one.
    pub fn break_page(&mut self) {
        self.push_page();
        self.open_page();
    }

    fn push_page(&mut self) {
        let ops = std::mem::take(&mut self.ops);
        self.document.pages.push(PdfPage::new(
            Mm(self.geometry.page_width_mm),
            Mm(self.geometry.page_height_mm),
            ops,
        ));
    }

    /// Pages in the document once finished.
    pub fn page_count(&self) -> usize {
        self.document.pages.len() + 1
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.push_page();
        let mut warnings = Vec::new();
        self.document.save(&PdfSaveOptions::default(), &mut warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Orientation;
    use crate::render::encode_png;
    use image::{Rgba, RgbaImage};

    fn card_png() -> Vec<u8> {
        encode_png(&RgbaImage::from_pixel(350, 200, Rgba([20, 40, 60, 255]))).unwrap()
    }

    #[test]
    fn test_empty_document_has_one_page() {
        let writer = PdfSheetWriter::new("t", PageGeometry::a4(Orientation::Portrait));
        assert_eq!(writer.page_count(), 1);
        let bytes = writer.finish();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_pages_follow_breaks() {
        let geometry = PageGeometry::a4(Orientation::Portrait);
        let packing = geometry.pack(2);
        let png = card_png();
        let mut writer = PdfSheetWriter::new("t", geometry);
        for placement in packing.placements(5) {
            writer.place_card(&png, &placement).unwrap();
            if packing.page_break_after(placement.index, 5) {
                writer.break_page();
            }
        }
        assert_eq!(writer.page_count(), 3);
        assert!(writer.finish().starts_with(b"%PDF"));
    }

    #[test]
    fn test_rejects_undecodable_image() {
        let geometry = PageGeometry::a4(Orientation::Landscape);
        let mut writer = PdfSheetWriter::new("t", geometry);
        let placement = geometry.pack(1).placement(0);
        assert!(matches!(
            writer.place_card(b"not a png", &placement),
            Err(ExportError::Pdf(_))
        ));
    }
}
