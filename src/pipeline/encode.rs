//! Image encoding: uploaded picture → base64 PNG wrapped in `ImageData`.
//!
//! Vision models accept images as base64 data embedded in the JSON request
//! body. Uploads are re-encoded as PNG so the model always sees a lossless
//! copy, and phone-camera photos are downscaled first: a 4000 px scan costs
//! several times the tokens of a 2000 px one without reading any better.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode `img` for a vision request, capping its longest edge at
/// `max_pixels`.
pub fn encode_image(img: &DynamicImage, max_pixels: u32) -> Result<ImageData, image::ImageError> {
    let longest = img.width().max(img.height());
    let scaled;
    let img = if longest > max_pixels {
        scaled = img.thumbnail(max_pixels, max_pixels);
        debug!(
            "Downscaled {}x{} → {}x{}",
            img.width(),
            img.height(),
            scaled.width(),
            scaled.height()
        );
        &scaled
    } else {
        img
    };

    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;

    let b64 = STANDARD.encode(&buf);
    debug!("Encoded image → {} bytes base64", b64.len());

    Ok(ImageData::new(b64, "image/png").with_detail("high"))
}
