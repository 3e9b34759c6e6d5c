use ndarray::Array4;

use crate::error::PredictResult;

/// A loaded image classification model.
///
/// Implementations take a preprocessed `[1, H, W, C]` tensor and return one
/// score per class index.
pub trait Classifier: Send + Sync {
    fn predict(&self, pixels: &Array4<f32>) -> PredictResult<Vec<f32>>;

    /// Where the model was loaded from, for diagnostics.
    fn source(&self) -> &str {
        "in-memory"
    }
}

#[cfg(feature = "onnx")]
pub use onnx::OnnxClassifier;

#[cfg(feature = "onnx")]
mod onnx {
    use std::path::Path;
    use std::sync::Mutex;

    use anyhow::Context;
    use ndarray::Array4;
    use ort::session::Session;
    use ort::session::builder::GraphOptimizationLevel;
    use ort::value::Tensor;

    use super::Classifier;
    use crate::error::{PredictError, PredictResult};

    /// Classifier backed by an ONNX Runtime session.
    pub struct OnnxClassifier {
        // running a session needs `&mut`
        session: Mutex<Session>,
        source: String,
    }

    impl OnnxClassifier {
        pub fn load(path: impl AsRef<Path>, intra_threads: usize) -> anyhow::Result<Self> {
            let path = path.as_ref();
            let session = build_session(path, intra_threads)
                .with_context(|| format!("failed to load model from {}", path.display()))?;
            log::info!(
                "Loaded model {} ({} inputs, {} outputs)",
                path.display(),
                session.inputs.len(),
                session.outputs.len()
            );
            Ok(Self {
                session: Mutex::new(session),
                source: path.display().to_string(),
            })
        }
    }

    fn build_session(path: &Path, intra_threads: usize) -> ort::Result<Session> {
        Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(intra_threads)?
            .commit_from_file(path)
    }

    impl Classifier for OnnxClassifier {
        fn predict(&self, pixels: &Array4<f32>) -> PredictResult<Vec<f32>> {
            let input = Tensor::from_array(pixels.clone())
                .map_err(|e| PredictError::Inference(e.to_string()))?;
            let mut session = self
                .session
                .lock()
                .map_err(|_| PredictError::Internal("model session lock poisoned".to_string()))?;
            let outputs = session
                .run(ort::inputs![input])
                .map_err(|e| PredictError::Inference(e.to_string()))?;
            let (_, output) = outputs
                .iter()
                .next()
                .ok_or_else(|| PredictError::Inference("model produced no outputs".to_string()))?;
            let scores = output
                .try_extract_array::<f32>()
                .map_err(|e| PredictError::Inference(e.to_string()))?;
            // [1, classes] or [classes]; keep the first row
            let classes = scores.shape().last().copied().unwrap_or(0);
            Ok(scores.iter().take(classes).copied().collect())
        }

        fn source(&self) -> &str {
            &self.source
        }
    }
}


#[cfg(all(test, feature = "onnx"))]
mod onnx_tests {
    use std::path::PathBuf;

    use ndarray::Array4;

    use super::{Classifier, OnnxClassifier};
    use crate::preprocess::INPUT_SHAPE;

    // ReduceMean over H and W, a 3x20 MatMul, then Softmax: output [1, 20]
    fn fixture_path() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/softmax_classifier.onnx")
    }

    #[test]
    fn test_load_missing_model() {
        let err = match OnnxClassifier::load("does/not/exist.onnx", 1) {
            Ok(_) => panic!("loading a missing model should fail"),
            Err(e) => e,
        };
        let message = format!("{:#}", err);
        assert!(message.contains("failed to load model from does/not/exist.onnx"));
    }

    #[test]
    fn test_predict_returns_first_row() {
        let path = fixture_path();
        let classifier = OnnxClassifier::load(&path, 1).unwrap();
        assert_eq!(classifier.source(), path.display().to_string());

        let pixels = Array4::<f32>::from_elem(INPUT_SHAPE, 0.5);
        let scores = classifier.predict(&pixels).unwrap();
        assert_eq!(scores.len(), 20);

        let total: f32 = scores.iter().sum();
        assert!((total - 1.0).abs() < 1e-4);
        // logits grow with the class index for a uniform grey image
        let best = crate::ranking::top_k(&scores, 1);
        assert_eq!(best, vec![19]);
    }

    #[test]
    fn test_predict_rejects_wrong_layout() {
        let classifier = OnnxClassifier::load(fixture_path(), 1).unwrap();
        let pixels = Array4::<f32>::zeros((1, 3, 224, 224));
        assert!(matches!(
            classifier.predict(&pixels),
            Err(crate::error::PredictError::Inference(_))
        ));
    }
}
