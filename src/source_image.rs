use std::path::Path;

use log::info;

use crate::error::Error;

pub type Rgba = [u8; 4];

/// The picture under the water. Read-only once loaded.
pub struct SourceImage {
    width: usize,
    height: usize,
    pixels: Vec<Rgba>,
}

impl SourceImage {
    pub fn open(path: &Path) -> Result<Self, Error> {
        let rgba = image::open(path)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        info!("loaded {} ({}x{})", path.display(), width, height);
        Self::from_rgba(width as usize, height as usize, rgba.into_raw())
    }

    /// Wrap a tightly packed RGBA8 buffer.
    pub fn from_rgba(width: usize, height: usize, bytes: Vec<u8>) -> Result<Self, Error> {
        let pixel_count = width
            .checked_mul(height)
            .filter(|count| *count > 0)
            .ok_or(Error::InvalidDimensions { width, height })?;
        if pixel_count.checked_mul(4) != Some(bytes.len()) {
            return Err(Error::ImageBuffer { width, height, len: bytes.len() });
        }
        Ok(Self {
            width,
            height,
            pixels: bytemuck::cast_slice::<u8, Rgba>(&bytes).to_vec(),
        })
    }

    /// Two-tone checkerboard with a soft diagonal gradient, used when no
    /// image is given on the command line.
    pub fn checkerboard(width: usize, height: usize, cell: usize) -> Result<Self, Error> {
        let cell = cell.max(1);
        let mut bytes = Vec::with_capacity(width.saturating_mul(height).saturating_mul(4));
        for y in 0..height {
            for x in 0..width {
                let shade = ((x + y) * 64 / (width + height).max(1)) as u8;
                let pixel = if (x / cell + y / cell) % 2 == 0 {
                    [40 + shade, 110 + shade, 170 + shade / 2, 255]
                } else {
                    [230 - shade, 220 - shade, 190 - shade, 255]
                };
                bytes.extend_from_slice(&pixel);
            }
        }
        Self::from_rgba(width, height, bytes)
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }
}

/// One rendered frame, same size as the source.
pub struct OutputImage {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<Rgba>,
}

impl OutputImage {
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.pixels.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_buffer_length_is_checked() {
        assert!(SourceImage::from_rgba(2, 2, vec![0; 16]).is_ok());
        assert!(matches!(
            SourceImage::from_rgba(2, 2, vec![0; 15]),
            Err(Error::ImageBuffer { width: 2, height: 2, len: 15 })
        ));
        assert!(matches!(
            SourceImage::from_rgba(0, 2, Vec::new()),
            Err(Error::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn pixels_keep_channel_order() {
        let image = SourceImage::from_rgba(2, 1, vec![1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        assert_eq!(image.pixels(), &[[1, 2, 3, 4], [5, 6, 7, 8]]);
        assert_eq!(image.dimensions(), (2, 1));
    }

    #[test]
    fn checkerboard_alternates_cells() {
        let image = SourceImage::checkerboard(8, 8, 4).unwrap();
        assert_eq!(image.pixels().len(), 64);
        assert_ne!(image.pixels()[0], image.pixels()[4]);
        assert!(image.pixels().iter().all(|p| p[3] == 255));
    }

    #[test]
    fn missing_file_is_an_image_error() {
        let result = SourceImage::open(Path::new("/definitely/not/here.png"));
        assert!(matches!(result, Err(Error::Image(_))));
    }

    #[test]
    fn output_bytes_are_tightly_packed() {
        let output = OutputImage { width: 2, height: 1, pixels: vec![[1, 2, 3, 255], [4, 5, 6, 255]] };
        assert_eq!(output.as_bytes(), &[1, 2, 3, 255, 4, 5, 6, 255]);
    }
}
