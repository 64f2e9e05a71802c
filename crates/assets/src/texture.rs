use std::path::Path;

use crate::{AssetError, AssetId};

/// Decoded RGBA8 image ready for GPU upload.
#[derive(Debug, Clone)]
pub struct ImageData {
    pub id: AssetId,
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl ImageData {
    /// Load and decode an image file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "loading image");
        let bytes = std::fs::read(path)?;
        let image = Self::from_bytes(&bytes)?;
        tracing::info!(
            path = %path.display(),
            width = image.width,
            height = image.height,
            "image loaded"
        );
        Ok(image)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AssetError> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Self {
            id: AssetId::of_bytes(bytes),
            data: rgba.into_raw(),
            width,
            height,
        })
    }

    /// Single-color image, used when a texture is missing.
    pub fn solid_color(width: u32, height: u32, color: [u8; 4]) -> Self {
        let data: Vec<u8> = color
            .iter()
            .copied()
            .cycle()
            .take((width * height * 4) as usize)
            .collect();
        Self {
            id: AssetId::of_bytes(&data),
            data,
            width,
            height,
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * self.width + x) * 4) as usize;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }
}

/// Scalar height samples taken from the red channel of an image, in `[0, 1]`.
///
/// Sampled with texture coordinates: `v = 1` is the top row of the image.
#[derive(Debug, Clone)]
pub struct HeightField {
    width: u32,
    height: u32,
    values: Vec<f32>,
}

impl HeightField {
    /// Images with no pixels give [`HeightField::flat`].
    pub fn from_image(image: &ImageData) -> Self {
        if image.data.is_empty() {
            return Self::flat();
        }
        let values = image
            .data
            .chunks_exact(4)
            .map(|px| f32::from(px[0]) / 255.0)
            .collect();
        Self {
            width: image.width.max(1),
            height: image.height.max(1),
            values,
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        Ok(Self::from_image(&ImageData::from_file(path)?))
    }

    /// Zero everywhere; terrain built from it is a flat grid.
    pub fn flat() -> Self {
        Self {
            width: 1,
            height: 1,
            values: vec![0.0],
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Bilinear sample at texture coordinates, clamped to the edges.
    pub fn sample(&self, u: f32, v: f32) -> f32 {
        let x = u.clamp(0.0, 1.0) * (self.width - 1) as f32;
        let y = (1.0 - v.clamp(0.0, 1.0)) * (self.height - 1) as f32;
        let x0 = x.floor() as u32;
        let y0 = y.floor() as u32;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);
        let fx = x - x0 as f32;
        let fy = y - y0 as f32;

        let at = |x: u32, y: u32| self.values[(y * self.width + x) as usize];
        let top = at(x0, y0) * (1.0 - fx) + at(x1, y0) * fx;
        let bottom = at(x0, y1) * (1.0 - fx) + at(x1, y1) * fx;
        top * (1.0 - fy) + bottom * fy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn write_png(path: &Path, width: u32, height: u32, f: impl Fn(u32, u32) -> [u8; 4]) {
        let img = image::RgbaImage::from_fn(width, height, |x, y| image::Rgba(f(x, y)));
        img.save(path).unwrap();
    }

    #[test]
    fn load_png_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sun.png");
        write_png(&path, 4, 2, |_, _| [255, 200, 0, 255]);

        let image = ImageData::from_file(&path).unwrap();
        assert_eq!((image.width, image.height), (4, 2));
        assert_eq!(image.data.len(), 4 * 2 * 4);
        assert_eq!(image.pixel(3, 1), [255, 200, 0, 255]);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ImageData::from_file("/no/such/height.png").unwrap_err();
        assert!(matches!(err, AssetError::Io(_)));
    }

    #[test]
    fn garbage_bytes_are_image_error() {
        let err = ImageData::from_bytes(b"definitely not a png").unwrap_err();
        assert!(matches!(err, AssetError::Image(_)));
    }

    #[test]
    fn solid_color_fills_every_pixel() {
        let image = ImageData::solid_color(3, 3, [1, 2, 3, 4]);
        assert_eq!(image.data.len(), 36);
        assert_eq!(image.pixel(2, 2), [1, 2, 3, 4]);
    }

    #[test]
    fn heightfield_reads_red_channel_top_row_at_v1() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("height.png");
        // Top row white, bottom row black.
        write_png(&path, 2, 2, |_, y| if y == 0 { [255, 0, 0, 255] } else { [0, 0, 0, 255] });

        let field = HeightField::from_file(&path).unwrap();
        assert_eq!(field.dimensions(), (2, 2));
        assert_relative_eq!(field.sample(0.0, 1.0), 1.0);
        assert_relative_eq!(field.sample(1.0, 0.0), 0.0);
        assert_relative_eq!(field.sample(0.5, 0.5), 0.5);
    }

    #[test]
    fn heightfield_clamps_out_of_range_coordinates() {
        let field = HeightField::from_image(&ImageData::solid_color(2, 2, [128, 0, 0, 255]));
        let expected = 128.0 / 255.0;
        assert_relative_eq!(field.sample(-3.0, 7.0), expected);
    }

    #[test]
    fn empty_image_gives_flat_field() {
        let field = HeightField::from_image(&ImageData::solid_color(0, 0, [255, 0, 0, 255]));
        assert_eq!(field.dimensions(), (1, 1));
        assert_eq!(field.sample(0.5, 0.5), 0.0);
    }

    #[test]
    fn flat_field_is_zero() {
        let field = HeightField::flat();
        assert_eq!(field.sample(0.3, 0.8), 0.0);
    }
}
