//! Turns uploaded image bytes into the model's input tensor.
//!
//! The classifier was trained on channels-last input, so the tensor layout is
//! `[batch, height, width, channels]` with pixel values scaled to `[0, 1]`.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use ndarray::Array4;

use crate::error::{PredictError, PredictResult};

pub const INPUT_HEIGHT: u32 = 224;
pub const INPUT_WIDTH: u32 = 224;
pub const INPUT_CHANNELS: usize = 3;

/// Shape of the tensor produced by [`preprocess`].
pub const INPUT_SHAPE: [usize; 4] = [
    1,
    INPUT_HEIGHT as usize,
    INPUT_WIDTH as usize,
    INPUT_CHANNELS,
];

/// Decode an image, resize it to 224x224 and scale pixels into `[0, 1]`.
pub fn preprocess(bytes: &[u8]) -> PredictResult<Array4<f32>> {
    let image = decode(bytes)?;
    let resized = image.resize_exact(INPUT_WIDTH, INPUT_HEIGHT, FilterType::CatmullRom);
    Ok(to_tensor_nhwc(&resized))
}

/// Decode bytes of any supported format, guessing the format from content.
pub fn decode(bytes: &[u8]) -> PredictResult<DynamicImage> {
    if bytes.is_empty() {
        return Err(PredictError::Decode(
            "cannot identify image file: upload is empty".to_string(),
        ));
    }
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| PredictError::Decode(e.to_string()))?;
    if reader.format().is_none() {
        return Err(PredictError::Decode(
            "cannot identify image file: unknown format".to_string(),
        ));
    }
    Ok(reader.decode()?)
}

/// Convert to RGB and lay out as `[1, H, W, 3]` scaled by 1/255.
pub fn to_tensor_nhwc(image: &DynamicImage) -> Array4<f32> {
    let rgb = image.to_rgb8();
    let (w, h) = (rgb.width() as usize, rgb.height() as usize);
    let mut arr = Array4::<f32>::zeros((1, h, w, INPUT_CHANNELS));

    for (x, y, pixel) in rgb.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        for c in 0..INPUT_CHANNELS {
            arr[[0, y, x, c]] = pixel[c] as f32 / 255.0;
        }
    }
    arr
}
