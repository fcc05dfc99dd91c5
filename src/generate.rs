//! Review text generation.
//!
//! Two tiers. The remote tier posts a mood-coach prompt to a hosted
//! text-generation endpoint and trims the response. The local tier is a
//! deterministic template per dominant mood category. The remote tier may
//! fail for any reason; the local tier cannot fail, so
//! [`generate_with_fallback`] is infallible and the review engine never
//! propagates a generation error.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::config::PipelineConfig;
use crate::error::GenerateError;
use crate::fetch::HTTP_CLIENT;
use crate::types::{MoodTally, ReviewPeriod};

/// Build the mood-coach prompt from a tally and period.
///
/// Deterministic: categories appear in first-tallied order as
/// `Category: count` pairs.
pub fn build_mood_prompt(counts: &MoodTally, period: ReviewPeriod) -> String {
    let summary = counts
        .iter()
        .map(|(mood, count)| format!("{mood}: {count}"))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "You are a friendly mood coach. Based on these mood counts for the past {period}: \
         {summary}, write a short, positive review (max 50 words). \
         If most moods are positive, congratulate and encourage consistency. \
         If mostly negative, give a short uplifting suggestion to improve the next {period}."
    )
}

/// Produces review text from a prompt. The seam exists so the review engine
/// tests run with canned generators instead of a live inference endpoint.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError>;
}

#[derive(Serialize)]
struct GenerationRequest<'a> {
    inputs: &'a str,
    parameters: GenerationParameters,
}

#[derive(Serialize)]
struct GenerationParameters {
    max_new_tokens: u32,
    temperature: f32,
    return_full_text: bool,
}

/// [`TextGenerator`] backed by a hosted inference API.
///
/// Speaks the common text-generation wire shape: request
/// `{"inputs", "parameters": {...}}`, response either
/// `[{"generated_text": ...}]` or a bare `{"generated_text": ...}` object.
#[derive(Debug, Clone)]
pub struct HttpGenerator {
    endpoint: String,
    api_token: Option<String>,
    max_new_tokens: u32,
}

impl HttpGenerator {
    pub fn new(endpoint: impl Into<String>, max_new_tokens: u32) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_token: None,
            max_new_tokens,
        }
    }

    /// Build from config; `None` when no endpoint is configured.
    pub fn from_config(cfg: &PipelineConfig) -> Option<Self> {
        cfg.generation_endpoint
            .as_ref()
            .map(|endpoint| Self::new(endpoint, cfg.max_new_tokens))
    }

    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }
}

#[async_trait]
impl TextGenerator for HttpGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        let body = GenerationRequest {
            inputs: prompt,
            parameters: GenerationParameters {
                max_new_tokens: self.max_new_tokens,
                temperature: 0.7,
                return_full_text: false,
            },
        };

        let mut request = HTTP_CLIENT.post(&self.endpoint).json(&body);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| GenerateError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenerateError::BadStatus(status.as_u16()));
        }

        let value = response
            .json::<Value>()
            .await
            .map_err(|e| GenerateError::MalformedResponse(e.to_string()))?;
        extract_generated_text(&value)
    }
}

/// Pull `generated_text` out of either response shape, trimmed.
fn extract_generated_text(value: &Value) -> Result<String, GenerateError> {
    let text = value
        .get(0)
        .unwrap_or(value)
        .get("generated_text")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            GenerateError::MalformedResponse("missing generated_text field".to_string())
        })?;

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(GenerateError::EmptyResponse);
    }
    Ok(trimmed.to_string())
}

/// Local template review for a dominant mood. Cannot fail.
///
/// `Happy` and `Hopeful` get a congratulation, `Sad` and `Anxious` a
/// supportive suggestion, anything else the generic balanced line.
pub fn fallback_review(dominant_mood: &str, period: ReviewPeriod) -> String {
    let template = match dominant_mood {
        "Happy" => "Wow, you've been super happy this {period}! Keep shining!",
        "Hopeful" => "Lots of hope this {period}! Keep chasing those dreams!",
        "Sad" => "It's been a tough {period}. Try journaling or a walk to lift your spirits.",
        "Anxious" => "Feeling anxious this {period}? Try meditation or a fun hobby to relax.",
        _ => "A balanced {period}! Keep expressing yourself!",
    };
    template.replace("{period}", period.as_str())
}

/// Generate review text, falling back to the local template on any remote
/// failure. Infallible: a review is always produced.
pub async fn generate_with_fallback(
    generator: Option<&dyn TextGenerator>,
    counts: &MoodTally,
    dominant_mood: &str,
    period: ReviewPeriod,
) -> String {
    if let Some(generator) = generator {
        let prompt = build_mood_prompt(counts, period);
        match generator.generate(&prompt).await {
            Ok(text) => return text,
            Err(err) => {
                warn!(period = %period, error = %err, "review_fallback");
            }
        }
    }
    fallback_review(dominant_mood, period)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Canned generator: a fixed response or a fixed failure.
    struct StaticGenerator(Result<String, GenerateError>);

    #[async_trait]
    impl TextGenerator for StaticGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, GenerateError> {
            self.0.clone()
        }
    }

    fn tally(pairs: &[(&str, u32)]) -> MoodTally {
        let mut tally = MoodTally::new();
        for (mood, count) in pairs {
            for _ in 0..*count {
                tally.add(mood);
            }
        }
        tally
    }

    #[test]
    fn prompt_embeds_every_pair_and_period() {
        let counts = tally(&[("Happy", 3), ("Sad", 1)]);
        let prompt = build_mood_prompt(&counts, ReviewPeriod::Weekly);

        assert!(prompt.contains("Happy: 3"));
        assert!(prompt.contains("Sad: 1"));
        assert!(prompt.contains("past weekly"));
        assert!(prompt.contains("next weekly"));
        assert!(prompt.contains("mood coach"));
    }

    #[test]
    fn prompt_is_deterministic_over_insertion_order() {
        let counts = tally(&[("Calm", 2), ("Happy", 2)]);
        let a = build_mood_prompt(&counts, ReviewPeriod::Monthly);
        let b = build_mood_prompt(&counts, ReviewPeriod::Monthly);
        assert_eq!(a, b);
        assert!(a.contains("Calm: 2, Happy: 2"));
    }

    #[test]
    fn extract_handles_array_response() {
        let value = json!([{"generated_text": "  Great week! \n"}]);
        assert_eq!(extract_generated_text(&value).unwrap(), "Great week!");
    }

    #[test]
    fn extract_handles_object_response() {
        let value = json!({"generated_text": "Nice month."});
        assert_eq!(extract_generated_text(&value).unwrap(), "Nice month.");
    }

    #[test]
    fn extract_rejects_missing_field() {
        let err = extract_generated_text(&json!({"error": "loading"})).unwrap_err();
        assert!(matches!(err, GenerateError::MalformedResponse(_)));
    }

    #[test]
    fn extract_rejects_whitespace_only_text() {
        let err = extract_generated_text(&json!([{"generated_text": "   "}])).unwrap_err();
        assert_eq!(err, GenerateError::EmptyResponse);
    }

    #[test]
    fn fallback_substitutes_period_per_category() {
        assert_eq!(
            fallback_review("Happy", ReviewPeriod::Weekly),
            "Wow, you've been super happy this weekly! Keep shining!"
        );
        assert_eq!(
            fallback_review("Sad", ReviewPeriod::Monthly),
            "It's been a tough monthly. Try journaling or a walk to lift your spirits."
        );
        assert_eq!(
            fallback_review("Mixed", ReviewPeriod::Weekly),
            "A balanced weekly! Keep expressing yourself!"
        );
        assert_eq!(
            fallback_review("Determined", ReviewPeriod::Monthly),
            "A balanced monthly! Keep expressing yourself!"
        );
    }

    #[tokio::test]
    async fn remote_success_wins_over_fallback() {
        let generator = StaticGenerator(Ok("You had a wonderful week!".into()));
        let counts = tally(&[("Happy", 2)]);

        let text =
            generate_with_fallback(Some(&generator), &counts, "Happy", ReviewPeriod::Weekly).await;
        assert_eq!(text, "You had a wonderful week!");
    }

    #[tokio::test]
    async fn remote_failure_falls_back_to_template() {
        let generator = StaticGenerator(Err(GenerateError::BadStatus(503)));
        let counts = tally(&[("Anxious", 2)]);

        let text =
            generate_with_fallback(Some(&generator), &counts, "Anxious", ReviewPeriod::Weekly)
                .await;
        assert_eq!(
            text,
            "Feeling anxious this weekly? Try meditation or a fun hobby to relax."
        );
    }

    #[tokio::test]
    async fn no_generator_uses_fallback_directly() {
        let counts = tally(&[("Hopeful", 1)]);
        let text = generate_with_fallback(None, &counts, "Hopeful", ReviewPeriod::Monthly).await;
        assert_eq!(text, "Lots of hope this monthly! Keep chasing those dreams!");
    }

    #[test]
    fn from_config_requires_endpoint() {
        assert!(HttpGenerator::from_config(&PipelineConfig::default()).is_none());
        let cfg =
            PipelineConfig::default().with_generation_endpoint("https://api.example.com/generate");
        assert!(HttpGenerator::from_config(&cfg).is_some());
    }

    #[test]
    fn request_body_wire_shape() {
        let body = GenerationRequest {
            inputs: "prompt text",
            parameters: GenerationParameters {
                max_new_tokens: 50,
                temperature: 0.7,
                return_full_text: false,
            },
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["inputs"], "prompt text");
        assert_eq!(value["parameters"]["max_new_tokens"], 50);
        assert_eq!(value["parameters"]["return_full_text"], false);
    }
}
