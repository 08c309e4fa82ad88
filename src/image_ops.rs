use crate::error::{DatasetError, Result};
use image::{imageops::FilterType, open, DynamicImage, GenericImageView};
use log::trace;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Rgb,
    Luma,
}

impl ColorMode {
    pub fn channels(self) -> u8 {
        match self {
            ColorMode::Rgb => 3,
            ColorMode::Luma => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    pub color: ColorMode,
    /// When set, every image is resized to exactly `(width, height)`.
    pub dimensions: Option<(u32, u32)>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            color: ColorMode::Rgb,
            dimensions: None,
        }
    }
}

/// Raw decoded pixels, row-major and interleaved by channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Pixels {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    pub data: Vec<u8>,
}

pub fn load_pixels(file_path: &Path, opts: &LoadOptions) -> Result<Pixels> {
    let image = open(file_path).map_err(|source| DatasetError::Decode {
        path: file_path.to_path_buf(),
        source,
    })?;
    trace!(
        "decoded {} ({}x{})",
        file_path.display(),
        image.width(),
        image.height()
    );
    Ok(convert_image(image, opts))
}

pub fn convert_image(image: DynamicImage, opts: &LoadOptions) -> Pixels {
    let image = match opts.dimensions {
        Some((w, h)) if (w, h) != (image.width(), image.height()) => {
            image.resize_exact(w, h, FilterType::Triangle)
        }
        _ => image,
    };
    let (width, height) = (image.width(), image.height());
    let data = match opts.color {
        ColorMode::Rgb => image.into_rgb8().into_raw(),
        ColorMode::Luma => image.into_luma8().into_raw(),
    };
    Pixels {
        width,
        height,
        channels: opts.color.channels(),
        data,
    }
}
