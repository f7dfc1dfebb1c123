//! Code generation utilities
//!
//! Payload builders for scannable labels and QR / Code 128 rendering to PNG.

use std::io::Cursor;

use barcoders::sym::code128::Code128;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{GrayImage, ImageFormat, Luma};
use qrcode::{Color, EcLevel, QrCode};
use uuid::Uuid;

use crate::models::{LabelPayload, PayloadType};
use crate::utils::errors::{GearError, Result};

/// Smallest edge of a rendered QR code, in pixels
pub const QR_MIN_SIZE: u32 = 400;
/// Quiet zone around QR codes, in modules
const QR_QUIET_ZONE: u32 = 4;

pub const BARCODE_MODULE_WIDTH: u32 = 2;
pub const BARCODE_HEIGHT: u32 = 100;
/// Quiet zone on each side of a barcode, in modules
const BARCODE_QUIET_ZONE: u32 = 10;

const BLACK: Luma<u8> = Luma([0]);
const WHITE: Luma<u8> = Luma([255]);

/// Payload for an equipment template label
pub fn equipment_payload(studio_id: Uuid, equipment_id: Uuid) -> String {
    LabelPayload {
        id: equipment_id,
        kind: PayloadType::Equipment,
        studio_id,
    }
    .to_text()
}

/// Payload for a unit label
pub fn unit_payload(studio_id: Uuid, unit_id: Uuid) -> String {
    LabelPayload {
        id: unit_id,
        kind: PayloadType::Item,
        studio_id,
    }
    .to_text()
}

/// QR code with a quiet zone, at least `min_size` pixels wide
pub fn qr_image(text: &str, min_size: u32) -> Result<GrayImage> {
    let code = QrCode::with_error_correction_level(text.as_bytes(), EcLevel::M)
        .map_err(|e| GearError::Render(format!("QR encoding failed: {}", e)))?;

    let modules = code.width() as u32;
    let colors = code.to_colors();
    let total = modules + QR_QUIET_ZONE * 2;
    let scale = ((min_size + total - 1) / total).max(1);
    let size = total * scale;

    let image = GrayImage::from_fn(size, size, |x, y| {
        let mx = x / scale;
        let my = y / scale;
        if mx < QR_QUIET_ZONE || my < QR_QUIET_ZONE || mx >= modules + QR_QUIET_ZONE || my >= modules + QR_QUIET_ZONE {
            return WHITE;
        }
        let index = ((my - QR_QUIET_ZONE) * modules + (mx - QR_QUIET_ZONE)) as usize;
        match colors.get(index) {
            Some(Color::Dark) => BLACK,
            _ => WHITE,
        }
    });
    Ok(image)
}

/// Code 128 barcode, `module_width` pixels per bar module
pub fn barcode_image(text: &str, module_width: u32, height: u32) -> Result<GrayImage> {
    // The leading character selects Code 128 character set B
    let barcode = Code128::new(format!("\u{0181}{}", text))
        .map_err(|e| GearError::Render(format!("Barcode encoding failed: {}", e)))?;
    let bars = barcode.encode();

    let modules = bars.len() as u32 + BARCODE_QUIET_ZONE * 2;
    let width = modules * module_width;

    let image = GrayImage::from_fn(width, height, |x, _| {
        let module = x / module_width;
        if module < BARCODE_QUIET_ZONE {
            return WHITE;
        }
        match bars.get((module - BARCODE_QUIET_ZONE) as usize) {
            Some(1) => BLACK,
            _ => WHITE,
        }
    });
    Ok(image)
}

pub fn encode_png(image: &GrayImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

pub fn png_data_uri(bytes: &[u8]) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(bytes))
}

/// Render `text` as a QR code PNG data URI
pub fn render_qr(text: &str) -> Result<String> {
    let image = qr_image(text, QR_MIN_SIZE)?;
    Ok(png_data_uri(&encode_png(&image)?))
}

/// Render `text` as a Code 128 PNG data URI
pub fn render_barcode(text: &str) -> Result<String> {
    let image = barcode_image(text, BARCODE_MODULE_WIDTH, BARCODE_HEIGHT)?;
    Ok(png_data_uri(&encode_png(&image)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CodePayload;

    #[test]
    fn test_unit_payload_parses_back() {
        let studio_id = Uuid::new_v4();
        let unit_id = Uuid::new_v4();
        let text = unit_payload(studio_id, unit_id);

        match CodePayload::parse(&text) {
            CodePayload::Structured(payload) => {
                assert_eq!(payload.id, unit_id);
                assert_eq!(payload.kind, PayloadType::Item);
                assert_eq!(payload.studio_id, studio_id);
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_equipment_payload_shape() {
        let text = equipment_payload(Uuid::nil(), Uuid::nil());
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["type"], "equipment");
        assert_eq!(json["id"], Uuid::nil().to_string());
    }

    #[test]
    fn test_qr_meets_minimum_size() {
        let image = qr_image("CAM-001-AB12", QR_MIN_SIZE).unwrap();
        assert!(image.width() >= QR_MIN_SIZE);
        assert_eq!(image.width(), image.height());
        // quiet zone corner is white
        assert_eq!(image.get_pixel(0, 0), &WHITE);
    }

    #[test]
    fn test_barcode_dimensions() {
        let image = barcode_image("CAM-001-AB12", 2, 100).unwrap();
        assert_eq!(image.height(), 100);
        assert_eq!(image.width() % 2, 0);
        assert_eq!(image.get_pixel(0, 50), &WHITE);
        assert!(image.pixels().any(|p| *p == BLACK));
    }

    #[test]
    fn test_data_uris() {
        assert!(render_qr("hello").unwrap().starts_with("data:image/png;base64,"));
        assert!(render_barcode("hello").unwrap().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_barcode_rejects_unencodable_text() {
        assert!(matches!(barcode_image("caf\u{e9} \u{2603}", 2, 100), Err(GearError::Render(_))));
    }
}
