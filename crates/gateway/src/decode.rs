use anyhow::Context;
use image::RgbImage;

/// Decode encoded image bytes (PNG, JPEG) into 8-bit RGB.
pub fn decode_image(bytes: &[u8]) -> anyhow::Result<RgbImage> {
    if bytes.is_empty() {
        anyhow::bail!("Image is empty");
    }

    let image = image::load_from_memory(bytes)
        .context("Unsupported or corrupt image")?
        .to_rgb8();

    if image.width() == 0 || image.height() == 0 {
        anyhow::bail!("Image has no pixels");
    }

    Ok(image)
}
