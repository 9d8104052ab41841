use crate::ImageError;
use crates_image::{RgbImage, imageops::FilterType};

/// Packed 8-bit RGB pixels, row-major, no padding.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl Image {
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Result<Self, ImageError> {
        if width == 0 || height == 0 || data.len() != width * height * 3 {
            return Err(ImageError::Dimensions {
                width,
                height,
                len: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Build an image by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> [u8; 3]) -> Self {
        let mut data = Vec::with_capacity(width * height * 3);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        let i = (y * self.width + x) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// BT.601 luma, one byte per pixel.
    pub fn to_luma(&self) -> Vec<u8> {
        self.data
            .chunks_exact(3)
            .map(|p| {
                let y = 299 * p[0] as u32 + 587 * p[1] as u32 + 114 * p[2] as u32;
                ((y + 500) / 1000) as u8
            })
            .collect()
    }

    /// Downscale to fit inside `max_width` x `max_height`, keeping the aspect
    /// ratio. Images that already fit are returned unchanged.
    pub fn resize_to_fit(&self, max_width: usize, max_height: usize) -> Image {
        if max_width == 0
            || max_height == 0
            || (self.width <= max_width && self.height <= max_height)
        {
            return self.clone();
        }
        let scale = (max_width as f64 / self.width as f64)
            .min(max_height as f64 / self.height as f64);
        let new_width = ((self.width as f64 * scale).round() as usize).clamp(1, max_width);
        let new_height = ((self.height as f64 * scale).round() as usize).clamp(1, max_height);

        let Some(buffer) =
            RgbImage::from_raw(self.width as u32, self.height as u32, self.data.clone())
        else {
            return self.clone();
        };
        let resized = crates_image::imageops::resize(
            &buffer,
            new_width as u32,
            new_height as u32,
            FilterType::Triangle,
        );
        Image {
            width: new_width,
            height: new_height,
            data: resized.into_raw(),
        }
    }

    pub(crate) fn to_buffer(&self) -> Result<RgbImage, ImageError> {
        RgbImage::from_raw(self.width as u32, self.height as u32, self.data.clone()).ok_or(
            ImageError::Dimensions {
                width: self.width,
                height: self.height,
                len: self.data.len(),
            },
        )
    }
}
