//! Owned RGBA8 pixel buffers shared by every stage of the texture pipeline.

use std::path::Path;

use image::RgbaImage;

/// A 2D raster stored as row-major RGBA pixels.
///
/// Rasters cross thread boundaries by value: a build request owns its
/// buffers and hands them back inside the result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel data in row-major RGBA format. Length = `width * height * 4`.
    pub pixels: Vec<u8>,
}

impl Raster {
    /// Create a transparent black (all-zero) raster.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        }
    }

    /// Create a raster with every pixel set to `color`.
    pub fn filled(width: u32, height: u32, color: [u8; 4]) -> Self {
        let count = width as usize * height as usize;
        let mut pixels = Vec::with_capacity(count * 4);
        for _ in 0..count {
            pixels.extend_from_slice(&color);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Byte offset of pixel `(x, y)`.
    #[inline]
    pub fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    /// Set a single pixel's RGBA value.
    ///
    /// # Panics
    ///
    /// Panics if `x >= width` or `y >= height`.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: [u8; 4]) {
        let idx = self.offset(x, y);
        self.pixels[idx..idx + 4].copy_from_slice(&color);
    }

    /// Get a pixel's RGBA value.
    ///
    /// # Panics
    ///
    /// Panics if `x >= width` or `y >= height`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = self.offset(x, y);
        [
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        ]
    }

    /// Returns `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of pixels in the raster.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Nearest-neighbour rescale to `width × height`.
    pub fn resized_nearest(&self, width: u32, height: u32) -> Raster {
        if self.dimensions() == (width, height) {
            return self.clone();
        }
        let mut out = Raster::new(width, height);
        if self.width == 0 || self.height == 0 {
            return out;
        }
        for y in 0..height {
            let sy = (y as u64 * self.height as u64 / height as u64) as u32;
            for x in 0..width {
                let sx = (x as u64 * self.width as u64 / width as u64) as u32;
                out.set_pixel(x, y, self.pixel(sx, sy));
            }
        }
        out
    }

    /// Convert into an `image` crate buffer for encoding.
    pub fn into_image(self) -> RgbaImage {
        // Length always matches `width * height * 4`.
        RgbaImage::from_raw(self.width, self.height, self.pixels)
            .unwrap_or_else(|| RgbaImage::new(0, 0))
    }

    /// Wrap an `image` crate buffer without copying.
    pub fn from_image(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            pixels: image.into_raw(),
        }
    }

    /// Encode the raster as a PNG file.
    pub fn save_png(&self, path: &Path) -> Result<(), image::ImageError> {
        image::save_buffer(
            path,
            &self.pixels,
            self.width,
            self.height,
            image::ExtendedColorType::Rgba8,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raster_correct_dimensions() {
        let raster = Raster::new(256, 128);
        assert_eq!(raster.dimensions(), (256, 128));
        assert_eq!(raster.pixels.len(), 256 * 128 * 4);
    }

    #[test]
    fn test_filled_sets_every_pixel() {
        let raster = Raster::filled(4, 3, [128, 128, 255, 255]);
        for chunk in raster.pixels.chunks_exact(4) {
            assert_eq!(chunk, [128, 128, 255, 255]);
        }
    }

    #[test]
    fn test_set_pixel_layout() {
        let mut raster = Raster::new(10, 10);
        raster.set_pixel(3, 5, [255, 128, 64, 255]);

        let idx = (5 * 10 + 3) * 4;
        assert_eq!(&raster.pixels[idx..idx + 4], &[255, 128, 64, 255]);
        assert_eq!(raster.pixel(3, 5), [255, 128, 64, 255]);
    }

    #[test]
    fn test_resize_nearest_upscales_blocks() {
        let mut raster = Raster::new(2, 2);
        raster.set_pixel(1, 0, [9, 9, 9, 255]);
        let big = raster.resized_nearest(4, 4);
        assert_eq!(big.dimensions(), (4, 4));
        assert_eq!(big.pixel(2, 0), [9, 9, 9, 255]);
        assert_eq!(big.pixel(3, 1), [9, 9, 9, 255]);
        assert_eq!(big.pixel(0, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn test_image_conversion_keeps_pixels() {
        let mut raster = Raster::new(3, 2);
        raster.set_pixel(2, 1, [1, 2, 3, 4]);
        let back = Raster::from_image(raster.clone().into_image());
        assert_eq!(back, raster);
    }

    #[test]
    fn test_save_png_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        Raster::filled(8, 8, [10, 20, 30, 255]).save_png(&path).unwrap();
        let loaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(loaded.get_pixel(4, 4).0, [10, 20, 30, 255]);
    }
}
