// THEORY:
// A `PixelSource` is whatever holds the decoded image. The pipeline only ever asks
// it for one rectangle at a time, so the trait is deliberately narrow. The tile
// grid already clips requests to the image, but sources still clamp them so that a
// bad rectangle can never read out of bounds.

use crate::Result;
use crate::core_modules::color::color::PixelBuffer;
use image::RgbaImage;

pub trait PixelSource {
    /// `(width, height)` of the whole image in pixels.
    fn dimensions(&self) -> (u32, u32);

    /// Row-major RGBA bytes of the rectangle at `(x, y)`, clipped to the image.
    fn read_region(&self, x: u32, y: u32, width: u32, height: u32) -> Result<PixelBuffer>;
}

impl PixelSource for RgbaImage {
    fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    fn read_region(&self, x: u32, y: u32, width: u32, height: u32) -> Result<PixelBuffer> {
        let x = x.min(self.width());
        let y = y.min(self.height());
        let width = width.min(self.width() - x);
        let height = height.min(self.height() - y);

        let stride = self.width() as usize * 4;
        let raw = self.as_raw();
        let mut region = Vec::with_capacity(width as usize * height as usize * 4);
        for row in y..y + height {
            let start = row as usize * stride + x as usize * 4;
            region.extend_from_slice(&raw[start..start + width as usize * 4]);
        }
        Ok(region)
    }
}
