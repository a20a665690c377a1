use crate::model::{DEFAULT_INFERENCE_BASE, Model};
use crate::validation::ClassificationRequest;
use reqwest::Client;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use tracing::{debug, info, warn};

/// Outcome of classifying one keyphrase.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum InferenceResult {
    Success {
        sequence: String,
        labels: Vec<String>,
        scores: Vec<f64>,
    },
    Failure {
        reason: String,
    },
}

impl InferenceResult {
    pub fn failure(reason: impl Into<String>) -> Self {
        InferenceResult::Failure {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, InferenceResult::Success { .. })
    }

    /// Interprets a response body. Anything other than a well-formed
    /// classification with positionally matching labels and scores fails.
    pub fn from_body(body: &[u8]) -> Self {
        match serde_json::from_slice::<RawResponse>(body) {
            Ok(RawResponse::Classification {
                sequence,
                labels,
                scores,
            }) => {
                if labels.len() != scores.len() {
                    return InferenceResult::failure(format!(
                        "{} labels but {} scores",
                        labels.len(),
                        scores.len()
                    ));
                }
                InferenceResult::Success {
                    sequence,
                    labels,
                    scores,
                }
            }
            Ok(RawResponse::Error { error }) => InferenceResult::failure(match error {
                serde_json::Value::String(message) => message,
                other => other.to_string(),
            }),
            Err(err) => InferenceResult::failure(format!("unreadable response: {err}")),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawResponse {
    Classification {
        sequence: String,
        labels: Vec<String>,
        scores: Vec<f64>,
    },
    Error {
        error: serde_json::Value,
    },
}

/// Request body sent for a single keyphrase.
#[derive(Debug, Serialize)]
pub struct InferencePayload<'a> {
    pub inputs: &'a str,
    pub parameters: InferenceParameters<'a>,
    pub options: InferenceOptions,
}

#[derive(Debug, Serialize)]
pub struct InferenceParameters<'a> {
    pub candidate_labels: &'a [String],
}

#[derive(Debug, Serialize)]
pub struct InferenceOptions {
    pub wait_for_model: bool,
}

impl<'a> InferencePayload<'a> {
    pub fn new(input: &'a str, labels: &'a [String]) -> Self {
        Self {
            inputs: input,
            parameters: InferenceParameters {
                candidate_labels: labels,
            },
            options: InferenceOptions {
                wait_for_model: true,
            },
        }
    }
}

pub type ClassifyFuture<'a> = Pin<Box<dyn Future<Output = InferenceResult> + Send + 'a>>;

/// Something that can classify one keyphrase against a label set.
pub trait Classifier: Send + Sync {
    fn classify<'a>(
        &'a self,
        model: Model,
        api_key: &'a str,
        payload: InferencePayload<'a>,
    ) -> ClassifyFuture<'a>;
}

/// Classifier backed by the hosted inference HTTP API.
#[derive(Clone)]
pub struct HttpClassifier {
    client: Client,
    inference_base: String,
}

impl HttpClassifier {
    pub fn new(inference_base: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            inference_base: inference_base.into(),
        }
    }

    pub fn inference_base(&self) -> &str {
        &self.inference_base
    }

    async fn post(
        &self,
        model: Model,
        api_key: &str,
        payload: InferencePayload<'_>,
    ) -> InferenceResult {
        let url = model.endpoint_with_base(&self.inference_base);
        debug!(%url, input = payload.inputs, "posting classification request");
        let response = match self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {api_key}"))
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => return InferenceResult::failure(format!("request failed: {err}")),
        };
        let status = response.status();
        match response.bytes().await {
            Ok(body) => {
                let result = InferenceResult::from_body(&body);
                if let InferenceResult::Failure { reason } = &result {
                    warn!(%status, reason = reason.as_str(), "unusable inference response");
                }
                result
            }
            Err(err) => InferenceResult::failure(format!("HTTP {status}: {err}")),
        }
    }
}

impl Default for HttpClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_INFERENCE_BASE)
    }
}

impl Classifier for HttpClassifier {
    fn classify<'a>(
        &'a self,
        model: Model,
        api_key: &'a str,
        payload: InferencePayload<'a>,
    ) -> ClassifyFuture<'a> {
        Box::pin(self.post(model, api_key, payload))
    }
}

/// Classifies every keyphrase of the request one after another, keeping
/// keyphrase order.
pub async fn classify_batch(
    classifier: &dyn Classifier,
    request: &ClassificationRequest,
) -> Vec<InferenceResult> {
    let mut results = Vec::with_capacity(request.keyphrases.len());
    for phrase in &request.keyphrases.phrases {
        let payload = InferencePayload::new(phrase, &request.labels);
        results.push(classifier.classify(request.model, &request.api_key, payload).await);
    }
    let failures = results.iter().filter(|result| !result.is_success()).count();
    info!(
        model = request.model.key(),
        rows = results.len(),
        failures,
        "classification batch finished"
    );
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_matches_inference_wire_format() {
        let labels = vec!["Positive".to_string(), "Negative".to_string()];
        let payload = InferencePayload::new("I love this", &labels);
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "inputs": "I love this",
                "parameters": {"candidate_labels": ["Positive", "Negative"]},
                "options": {"wait_for_model": true}
            })
        );
    }

    #[test]
    fn success_body_parses() {
        let body = br#"{"sequence":"I love this","labels":["Positive","Negative"],"scores":[0.97,0.03]}"#;
        assert_eq!(
            InferenceResult::from_body(body),
            InferenceResult::Success {
                sequence: "I love this".into(),
                labels: vec!["Positive".into(), "Negative".into()],
                scores: vec![0.97, 0.03],
            }
        );
    }

    #[test]
    fn error_bodies_become_failures() {
        let loading = br#"{"error":"Model is currently loading","estimated_time":20.0}"#;
        assert_eq!(
            InferenceResult::from_body(loading),
            InferenceResult::failure("Model is currently loading")
        );
        let listed = br#"{"error":["bad input"]}"#;
        assert_eq!(
            InferenceResult::from_body(listed),
            InferenceResult::failure(r#"["bad input"]"#)
        );
    }

    #[test]
    fn malformed_bodies_become_failures() {
        assert!(!InferenceResult::from_body(b"<html>502</html>").is_success());
        assert!(!InferenceResult::from_body(b"{}").is_success());
        let mismatched = br#"{"sequence":"x","labels":["a","b"],"scores":[1.0]}"#;
        assert!(!InferenceResult::from_body(mismatched).is_success());
    }
}

#[cfg(all(test, feature = "web"))]
mod http_tests {
    use super::*;
    use crate::keyphrases::{Mode, collate_keyphrases};
    use axum::{Json, Router, http::HeaderMap, routing::post};
    use tokio::net::TcpListener;

    async fn stub_classifier(
        headers: HeaderMap,
        Json(body): Json<serde_json::Value>,
    ) -> Json<serde_json::Value> {
        let authorized = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            == Some("Bearer hf_test");
        if !authorized || body["options"]["wait_for_model"] != serde_json::json!(true) {
            return Json(serde_json::json!({"error": "Authorization header is invalid"}));
        }
        let labels = body["parameters"]["candidate_labels"].clone();
        Json(serde_json::json!({
            "sequence": body["inputs"],
            "labels": labels,
            "scores": [0.75, 0.25],
        }))
    }

    async fn spawn_stub() -> String {
        let router = Router::new().route(
            "/models/valhalla/distilbart-mnli-12-3",
            post(stub_classifier),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/models")
    }

    fn request(api_key: &str, text: &str) -> ClassificationRequest {
        ClassificationRequest {
            model: Model::DistilBart,
            api_key: api_key.to_string(),
            labels: vec!["Positive".into(), "Negative".into()],
            keyphrases: collate_keyphrases(text, Mode::Unlocked),
        }
    }

    #[tokio::test]
    async fn http_classifier_posts_one_request_per_keyphrase() {
        let classifier = HttpClassifier::new(spawn_stub().await);
        let results = classify_batch(&classifier, &request("hf_test", "first\nsecond")).await;
        assert_eq!(results.len(), 2);
        match &results[1] {
            InferenceResult::Success { sequence, labels, scores } => {
                assert_eq!(sequence, "second");
                assert_eq!(labels, &vec!["Positive".to_string(), "Negative".to_string()]);
                assert_eq!(scores, &vec![0.75, 0.25]);
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[tokio::test]
    async fn http_classifier_surfaces_service_errors() {
        let classifier = HttpClassifier::new(spawn_stub().await);
        let results = classify_batch(&classifier, &request("wrong", "first")).await;
        assert_eq!(
            results,
            vec![InferenceResult::failure("Authorization header is invalid")]
        );
    }

    #[tokio::test]
    async fn unknown_route_is_a_failure_not_a_panic() {
        let base = spawn_stub().await;
        let classifier = HttpClassifier::new(base);
        let mut req = request("hf_test", "first");
        req.model = Model::BartLarge;
        let results = classify_batch(&classifier, &req).await;
        assert_eq!(results.len(), 1);
        assert!(!results[0].is_success());
    }
}
