//! QR code rasterization.
//!
//! The card renderer does not know how QR codes are made; it receives an
//! already rendered image and stretches it into the QR slot. This module
//! provides that image.

use image::{Rgba, RgbaImage};
use qrcode::{EcLevel, QrCode};

use crate::error::CarnetError;

/// Produces a renderable QR image for a payload.
pub trait QrGenerator: Send + Sync {
    fn render(&self, payload: &str) -> Result<RgbaImage, CarnetError>;
}

/// Module-grid QR renderer backed by the `qrcode` crate.
///
/// Each module becomes a `module_px` square; a quiet zone of
/// `quiet_zone` modules surrounds the code.
#[derive(Debug, Clone, Copy)]
pub struct ModuleQr {
    pub ec_level: EcLevel,
    pub module_px: u32,
    pub quiet_zone: u32,
}

impl Default for ModuleQr {
    fn default() -> Self {
        Self {
            ec_level: EcLevel::L,
            module_px: 4,
            quiet_zone: 4,
        }
    }
}

impl QrGenerator for ModuleQr {
    fn render(&self, payload: &str) -> Result<RgbaImage, CarnetError> {
        let code = QrCode::with_error_correction_level(payload.as_bytes(), self.ec_level)
            .map_err(|e| CarnetError::Qr(format!("QR code generation failed: {}", e)))?;

        let cell = self.module_px.max(1);
        let modules = code.width() as u32;
        let size = (modules + 2 * self.quiet_zone) * cell;
        let mut img = RgbaImage::from_pixel(size, size, Rgba([255, 255, 255, 255]));

        for qy in 0..modules {
            for qx in 0..modules {
                if code[(qx as usize, qy as usize)] != qrcode::Color::Dark {
                    continue;
                }
                let ox = (qx + self.quiet_zone) * cell;
                let oy = (qy + self.quiet_zone) * cell;
                for cy in 0..cell {
                    for cx in 0..cell {
                        img.put_pixel(ox + cx, oy + cy, Rgba([0, 0, 0, 255]));
                    }
                }
            }
        }

        Ok(img)
    }
}
