//! Services layer for PathWise
//!
//! External collaborators reached over HTTP.

pub mod predictor;

pub use predictor::{
    predict_with_fallback, DifficultyPredictor, HttpDifficultyPredictor, PredictionInput,
};
