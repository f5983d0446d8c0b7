//! Verification gate in front of the external image classifier.
//!
//! The classifier is addressed as a black box behind the `Classify`
//! trait; the gate converts its answer, or its failure, into a
//! definite verified/unverified decision. An upstream failure never
//! propagates past the gate: the configured fallback policy decides
//! the outcome instead.

use std::time::Duration;

use base64::prelude::*;
use floodnet_config::{FallbackPolicy, Verification};
use floodnet_models::v0::VerificationResult;
use floodnet_result::{create_error, Result};
use serde::Deserialize;
use serde_json::json;

#[async_trait]
pub trait Classify: Send + Sync {
    /// Ask the upstream model whether the image shows a genuine hazard
    async fn classify(&self, image: &[u8]) -> Result<VerificationResult>;
}

/// Client for an OpenAI-compatible vision chat-completions endpoint
pub struct VisionClassifier {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    instruction: String,
}

/// Answer shape of a chat completions endpoint, reduced to the part
/// we read
#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

impl VisionClassifier {
    pub fn new(config: &Verification) -> VisionClassifier {
        VisionClassifier {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(config.timeout_seconds))
                .connect_timeout(Duration::from_secs(5))
                .build()
                .expect("reqwest Client"),
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            instruction: config.instruction.clone(),
        }
    }
}

/// Parse the strict-JSON answer the instruction demands from the model
pub(crate) fn parse_answer(content: &str) -> Result<VerificationResult> {
    serde_json::from_str(content).map_err(|_| create_error!(ClassifierUnavailable))
}

#[async_trait]
impl Classify for VisionClassifier {
    async fn classify(&self, image: &[u8]) -> Result<VerificationResult> {
        let image_url = format!("data:image/jpeg;base64,{}", BASE64_STANDARD.encode(image));

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "temperature": 0,
                "response_format": { "type": "json_object" },
                "messages": [
                    {
                        "role": "user",
                        "content": [
                            { "type": "text", "text": self.instruction },
                            { "type": "image_url", "image_url": { "url": image_url } }
                        ]
                    }
                ]
            }))
            .send()
            .await
            .map_err(|_| create_error!(ClassifierUnavailable))?;

        if !response.status().is_success() {
            tracing::error!("classifier answered {}", response.status());
            return Err(create_error!(ClassifierUnavailable));
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|_| create_error!(ClassifierUnavailable))?;

        let content = completion
            .choices
            .first()
            .map(|choice| choice.message.content.as_str())
            .ok_or_else(|| create_error!(ClassifierUnavailable))?;

        parse_answer(content)
    }
}

/// The gate itself: classifier plus uniform fallback policy
pub struct VerificationGate {
    classifier: Box<dyn Classify>,
    policy: FallbackPolicy,
}

impl VerificationGate {
    pub fn new(classifier: Box<dyn Classify>, policy: FallbackPolicy) -> VerificationGate {
        VerificationGate { classifier, policy }
    }

    /// Decide whether the image shows a genuine hazard. Infallible by
    /// contract: upstream failure resolves to the policy default.
    pub async fn verify(&self, image: &[u8]) -> VerificationResult {
        match self.classifier.classify(image).await {
            Ok(result) => result,
            Err(error) => {
                tracing::warn!("classifier unavailable, applying fallback: {error:?}");

                match self.policy {
                    FallbackPolicy::FailOpen => VerificationResult {
                        verified: true,
                        reason: "Verification unavailable; accepted by policy".to_string(),
                        severity: None,
                    },
                    FallbackPolicy::FailClosed => VerificationResult {
                        verified: false,
                        reason: "Verification unavailable; rejected by policy".to_string(),
                        severity: None,
                    },
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use floodnet_config::FallbackPolicy;
    use floodnet_models::v0::{Severity, VerificationResult};
    use floodnet_result::{create_error, Result};

    use super::{parse_answer, Classify, VerificationGate};

    pub(crate) struct StaticClassifier(pub VerificationResult);

    #[async_trait]
    impl Classify for StaticClassifier {
        async fn classify(&self, _image: &[u8]) -> Result<VerificationResult> {
            Ok(self.0.clone())
        }
    }

    pub(crate) struct BrokenClassifier;

    #[async_trait]
    impl Classify for BrokenClassifier {
        async fn classify(&self, _image: &[u8]) -> Result<VerificationResult> {
            Err(create_error!(ClassifierUnavailable))
        }
    }

    #[test]
    fn parses_strict_json_answer() {
        let result = parse_answer(
            r#"{ "verified": true, "reason": "flood detected", "severity": "high" }"#,
        )
        .unwrap();
        assert!(result.verified);
        assert_eq!(result.reason, "flood detected");
        assert_eq!(result.severity, Some(Severity::High));
    }

    #[test]
    fn severity_is_optional() {
        let result = parse_answer(r#"{ "verified": false, "reason": "selfie" }"#).unwrap();
        assert!(!result.verified);
        assert_eq!(result.severity, None);
    }

    #[test]
    fn malformed_answer_is_an_error() {
        assert!(parse_answer("the image shows water").is_err());
    }

    #[async_std::test]
    async fn healthy_classifier_answer_passes_through() {
        let gate = VerificationGate::new(
            Box::new(StaticClassifier(VerificationResult {
                verified: true,
                reason: "flood detected".to_string(),
                severity: Some(Severity::Medium),
            })),
            FallbackPolicy::FailClosed,
        );

        let result = gate.verify(b"image").await;
        assert!(result.verified);
        assert_eq!(result.reason, "flood detected");
    }

    #[async_std::test]
    async fn fail_closed_rejects_when_classifier_is_down() {
        let gate = VerificationGate::new(Box::new(BrokenClassifier), FallbackPolicy::FailClosed);

        let result = gate.verify(b"image").await;
        assert!(!result.verified);
        assert!(!result.reason.is_empty());
    }

    #[async_std::test]
    async fn fail_open_accepts_when_classifier_is_down() {
        let gate = VerificationGate::new(Box::new(BrokenClassifier), FallbackPolicy::FailOpen);

        let result = gate.verify(b"image").await;
        assert!(result.verified);
    }
}
