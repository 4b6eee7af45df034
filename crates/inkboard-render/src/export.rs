//! PNG encoding of rasterized images.

use inkboard_core::{RasterImage, RenderError, RenderResult};

/// Encode straight RGBA8 pixels as a PNG.
pub fn encode_png(image: &RasterImage) -> RenderResult<Vec<u8>> {
    if image.width == 0 || image.height == 0 {
        return Err(RenderError::EmptyViewport {
            width: image.width,
            height: image.height,
        });
    }

    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, image.width, image.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder.write_header().map_err(|e| {
            log::error!("Failed to write PNG header: {:?}", e);
            RenderError::Encode(e.to_string())
        })?;

        writer.write_image_data(&image.pixels).map_err(|e| {
            log::error!("Failed to write PNG data: {:?}", e);
            RenderError::Encode(e.to_string())
        })?;
    }

    Ok(png_data)
}
