//! Difficulty predictor client
//!
//! The personalization engine is an external HTTP service that maps a
//! learner's metrics to a roadmap difficulty (0 beginner, 1 intermediate,
//! 2 advanced). The returned value is passed through unchanged.

use crate::config::PredictorConfig;
use crate::error::{PathwiseError, Result};
use crate::types::{Profile, UserMetrics};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Request body of `POST /predict-difficulty`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionInput {
    pub engagement: i64,
    pub velocity: i64,
    pub mastery: i64,
    pub credibility: i64,
    /// Entry=0, Junior=1, Intermediate=2, Senior=3
    pub experience: i64,
}

impl PredictionInput {
    /// Build from stored metrics (zeros when absent) and the profile
    pub fn from_profile(profile: &Profile, metrics: Option<&UserMetrics>) -> Self {
        Self {
            engagement: metrics.map_or(0, |m| m.engagement_score),
            velocity: metrics.map_or(0, |m| m.velocity_score),
            mastery: metrics.map_or(0, |m| m.mastery_score),
            credibility: profile.credibility_score as i64,
            experience: profile.experience_level.feature(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PredictionResponse {
    difficulty: i64,
}

/// Maps learner metrics to a roadmap difficulty
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DifficultyPredictor: Send + Sync {
    async fn predict(&self, input: &PredictionInput) -> Result<i64>;
}

/// HTTP client for the personalization engine
pub struct HttpDifficultyPredictor {
    base_url: String,
    client: reqwest::Client,
}

impl HttpDifficultyPredictor {
    pub fn new(config: &PredictorConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/predict-difficulty", self.base_url)
    }
}

#[async_trait]
impl DifficultyPredictor for HttpDifficultyPredictor {
    async fn predict(&self, input: &PredictionInput) -> Result<i64> {
        debug!("Requesting difficulty prediction: {:?}", input);

        let response = self
            .client
            .post(self.endpoint())
            .json(input)
            .send()
            .await
            .map_err(|e| PathwiseError::Predictor(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(PathwiseError::Predictor(format!(
                "Prediction failed with status {}: {}",
                status, error_text
            )));
        }

        let body: PredictionResponse = response
            .json()
            .await
            .map_err(|e| PathwiseError::Predictor(format!("Failed to parse response: {}", e)))?;

        debug!("Predicted difficulty: {}", body.difficulty);
        Ok(body.difficulty)
    }
}

/// Predict, substituting `fallback` when the predictor fails.
/// With no fallback the failure propagates.
pub async fn predict_with_fallback(
    predictor: &dyn DifficultyPredictor,
    input: &PredictionInput,
    fallback: Option<i64>,
) -> Result<i64> {
    match predictor.predict(input).await {
        Ok(difficulty) => Ok(difficulty),
        Err(e) => match fallback {
            Some(difficulty) => {
                warn!("Difficulty predictor unavailable ({}), using {}", e, difficulty);
                Ok(difficulty)
            }
            None => Err(e),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ExperienceLevel, UserId};
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    fn input() -> PredictionInput {
        PredictionInput {
            engagement: 20,
            velocity: 10,
            mastery: 16,
            credibility: 20,
            experience: 1,
        }
    }

    #[test]
    fn test_request_body_shape() {
        let json = serde_json::to_value(input()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "engagement": 20,
                "velocity": 10,
                "mastery": 16,
                "credibility": 20,
                "experience": 1
            })
        );
    }

    #[test]
    fn test_input_from_profile_without_metrics() {
        let mut profile = Profile::new(
            UserId::new(),
            "Kim".into(),
            "AI".into(),
            ExperienceLevel::Intermediate,
        );
        profile.credibility_score = 30;
        let input = PredictionInput::from_profile(&profile, None);
        assert_eq!((input.engagement, input.velocity, input.mastery), (0, 0, 0));
        assert_eq!(input.credibility, 30);
        assert_eq!(input.experience, 2);
    }

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let predictor = HttpDifficultyPredictor::new(&PredictorConfig {
            base_url: "http://localhost:8000/".into(),
            ..PredictorConfig::default()
        })
        .unwrap();
        assert_eq!(predictor.endpoint(), "http://localhost:8000/predict-difficulty");
    }

    /// Serve `POST /predict-difficulty` on an ephemeral port, recording bodies
    async fn stub_engine(
        status: StatusCode,
        reply: Value,
    ) -> (HttpDifficultyPredictor, Arc<Mutex<Vec<Value>>>) {
        let received = Arc::new(Mutex::new(Vec::new()));
        let recorder = received.clone();
        let handler = move |Json(body): Json<Value>| async move {
            recorder.lock().unwrap().push(body);
            (status, Json(reply))
        };
        let app = Router::new().route("/predict-difficulty", post(handler));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let predictor = HttpDifficultyPredictor::new(&PredictorConfig {
            base_url: format!("http://{}", addr),
            ..PredictorConfig::default()
        })
        .unwrap();
        (predictor, received)
    }

    #[tokio::test]
    async fn test_http_predictor_posts_metrics() {
        let (predictor, received) =
            stub_engine(StatusCode::OK, json!({"difficulty": 2, "confidence": 0.87})).await;

        assert_eq!(predictor.predict(&input()).await.unwrap(), 2);
        let bodies = received.lock().unwrap().clone();
        assert_eq!(bodies, vec![serde_json::to_value(input()).unwrap()]);
    }

    #[tokio::test]
    async fn test_http_predictor_error_status() {
        let (predictor, received) = stub_engine(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"detail": "model not loaded"}),
        )
        .await;

        let err = predictor.predict(&input()).await.unwrap_err();
        assert!(matches!(&err, PathwiseError::Predictor(msg) if msg.contains("500")));
        assert_eq!(received.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_fallback_on_failure() {
        let mut predictor = MockDifficultyPredictor::new();
        predictor
            .expect_predict()
            .returning(|_| Err(PathwiseError::Predictor("connection refused".into())));

        assert_eq!(predict_with_fallback(&predictor, &input(), Some(0)).await.unwrap(), 0);
        let err = predict_with_fallback(&predictor, &input(), None).await.unwrap_err();
        assert!(matches!(err, PathwiseError::Predictor(_)));
    }

    #[tokio::test]
    async fn test_prediction_passes_through() {
        let mut predictor = MockDifficultyPredictor::new();
        predictor.expect_predict().times(1).returning(|_| Ok(5));
        assert_eq!(predict_with_fallback(&predictor, &input(), Some(0)).await.unwrap(), 5);
    }
}
