use crate::error::{AppError, AppResult};
use image::{DynamicImage, ImageFormat, Luma};
use qrcode::{EcLevel, QrCode};
use std::io::Cursor;

const MODULE_PIXELS: u32 = 10;

/// Encodes `data` as a black-on-white QR code PNG. Same input, same bytes.
pub fn render_qr_png(data: &str) -> AppResult<Vec<u8>> {
    let code = QrCode::with_error_correction_level(data.as_bytes(), EcLevel::M)
        .map_err(|e| AppError::ArtifactError(format!("QR encoding failed: {e}")))?;

    let image = code
        .render::<Luma<u8>>()
        .module_dimensions(MODULE_PIXELS, MODULE_PIXELS)
        .quiet_zone(true)
        .build();

    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(image)
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| AppError::ArtifactError(format!("PNG encoding failed: {e}")))?;

    Ok(buffer.into_inner())
}
