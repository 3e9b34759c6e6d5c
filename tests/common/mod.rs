// Shared by the integration tests
#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;

use batik_classifier::classifier::Classifier;
use batik_classifier::error::{PredictError, PredictResult};
use batik_classifier::labels::LabelSet;
use batik_classifier::server::AppState;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use ndarray::Array4;

pub const BOUNDARY: &str = "----batik-test-boundary";

/// Returns the same scores for every image.
pub struct MockClassifier {
    scores: Vec<f32>,
}

impl MockClassifier {
    pub fn new(scores: Vec<f32>) -> Self {
        Self { scores }
    }
}

impl Classifier for MockClassifier {
    fn predict(&self, pixels: &Array4<f32>) -> PredictResult<Vec<f32>> {
        assert_eq!(pixels.shape(), &[1, 224, 224, 3]);
        Ok(self.scores.clone())
    }

    fn source(&self) -> &str {
        "mock.onnx"
    }
}

/// Fails every forward pass with the given message.
pub struct FailingClassifier(pub &'static str);

impl Classifier for FailingClassifier {
    fn predict(&self, _pixels: &Array4<f32>) -> PredictResult<Vec<f32>> {
        Err(PredictError::Inference(self.0.to_string()))
    }
}

pub fn test_state(classifier: impl Classifier + 'static) -> AppState {
    AppState::new(Arc::new(classifier), LabelSet::default(), 1024 * 1024)
}

/// Probabilities for the 20 stock labels with `index` at `top`.
pub fn scores_with_top(index: usize, top: f32) -> Vec<f32> {
    let rest = (1.0 - top) / 19.0;
    let mut scores = vec![rest; 20];
    scores[index] = top;
    scores
}

pub fn encoded_image(format: ImageFormat) -> Vec<u8> {
    let img = DynamicImage::from(RgbImage::from_fn(40, 30, |x, y| {
        Rgb([(x * 5) as u8, (y * 8) as u8, 90])
    }));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

pub enum Part<'a> {
    File {
        name: &'a str,
        filename: &'a str,
        data: &'a [u8],
    },
    Text {
        name: &'a str,
        value: &'a str,
    },
}

/// Assemble a multipart/form-data body using [`BOUNDARY`].
pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::File {
                name,
                filename,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n",
                        name, filename
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"\r\n\r\n{}",
                        name, value
                    )
                    .as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}
