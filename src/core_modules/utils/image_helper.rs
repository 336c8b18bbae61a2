pub mod image_helper {
    use crate::error::Result;
    use image::ImageEncoder;
    use image::RgbaImage;
    use std::path::Path;

    /// Writes an RGBA frame (e.g. the motion view) as a PNG.
    pub fn save_png(path: impl AsRef<Path>, frame: &RgbaImage) -> Result<()> {
        let output = std::fs::File::create(path)?;
        let encoder = image::codecs::png::PngEncoder::new(output);

        encoder.write_image(frame.as_raw(), frame.width(), frame.height(), image::ExtendedColorType::Rgba8)?;

        Ok(())
    }
}
