pub mod classifier;
pub mod config;
pub mod error;
pub mod labels;
pub mod logging;
pub mod preprocess;
pub mod ranking;
pub mod server;

pub use classifier::Classifier;
pub use error::{PredictError, PredictResult};
pub use labels::LabelSet;
pub use ranking::{MatchTier, PatternMatch, Prediction};
pub use server::AppState;
