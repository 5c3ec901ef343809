// ABOUTME: Content generation for deck outlines and slide drafts
// ABOUTME: Talks to the OpenRouter chat completions API with retry and timeout handling

use crate::deck::{coerce_optional_text, coerce_text, DeckRequest, Outline, SlideContent, SlidePlan};
use crate::errors::{DeckError, Result};
use log::{debug, info, warn};
use serde_json::{json, Value};
use std::thread;
use std::time::Duration;

pub const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

const MAX_COMPLETION_TOKENS: u32 = 1024;
const MAX_ATTEMPTS: u32 = 3;
const INITIAL_RETRY_DELAY_MS: u64 = 1000;

/// Produces outline and slide content for a deck. The pipeline drives this
/// trait, so tests can substitute a deterministic implementation.
pub trait ContentGenerator {
    /// Proposes a deck outline for the given brief.
    fn propose_outline(&self, request: &DeckRequest) -> Result<Outline>;

    /// Drafts the content for one planned slide.
    fn draft_slide(&self, plan: &SlidePlan) -> Result<SlideContent>;
}

/// OpenRouter-backed generator. Requests are retried up to three times
/// with exponential backoff; responses are expected to carry a JSON body,
/// optionally wrapped in a Markdown code fence.
pub struct OpenRouterClient {
    client: reqwest::blocking::Client,
    api_key: String,
    model: String,
}

impl OpenRouterClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(OpenRouterClient {
            client,
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    /// Sends one prompt and returns the parsed JSON payload of the reply.
    fn complete(&self, prompt: &str) -> Result<Value> {
        let body = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "max_tokens": MAX_COMPLETION_TOKENS,
        });

        let mut retry_delay_ms = INITIAL_RETRY_DELAY_MS;
        let mut last_error: Option<DeckError> = None;

        for attempt in 1..=MAX_ATTEMPTS {
            debug!("Requesting completion from {} (attempt {})", self.model, attempt);

            match self
                .client
                .post(OPENROUTER_API_URL)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .json(&body)
                .send()
            {
                Ok(response) => {
                    if response.status().is_success() {
                        let payload: Value = response.json()?;
                        let content = payload["choices"][0]["message"]["content"]
                            .as_str()
                            .ok_or_else(|| {
                                DeckError::GenerationError(
                                    "Response payload had no message content".to_string(),
                                )
                            })?;
                        let extracted = extract_json_block(content);
                        return serde_json::from_str(&extracted).map_err(|e| {
                            DeckError::GenerationError(format!(
                                "Model returned unparseable JSON: {}",
                                e
                            ))
                        });
                    }

                    let status = response.status();
                    let detail = response.text().unwrap_or_default();
                    last_error = Some(DeckError::GenerationError(format!(
                        "API request failed with status {}: {}",
                        status, detail
                    )));
                }
                Err(e) => {
                    last_error = Some(DeckError::FetchError(e));
                }
            }

            if attempt < MAX_ATTEMPTS {
                info!(
                    "Completion attempt {} failed, retrying in {} ms",
                    attempt, retry_delay_ms
                );
                thread::sleep(Duration::from_millis(retry_delay_ms));
                retry_delay_ms *= 2;
            }
        }

        Err(last_error.unwrap_or_else(|| {
            DeckError::GenerationError("Completion failed with no diagnostic".to_string())
        }))
    }
}

impl ContentGenerator for OpenRouterClient {
    fn propose_outline(&self, request: &DeckRequest) -> Result<Outline> {
        info!(
            "Proposing outline for topic {:?} ({} slides)",
            request.topic, request.slide_count
        );
        let payload = self.complete(&outline_prompt(request))?;
        serde_json::from_value(payload).map_err(|e| {
            DeckError::GenerationError(format!("Outline response had unexpected shape: {}", e))
        })
    }

    fn draft_slide(&self, plan: &SlidePlan) -> Result<SlideContent> {
        let title = coerce_optional_text(&plan.title).unwrap_or_else(|| "Slide".to_string());
        info!("Drafting slide {:?}", title);
        let payload = self.complete(&slide_prompt(&title, &coerce_text(&plan.summary)))?;
        serde_json::from_value(payload).map_err(|e| {
            DeckError::GenerationError(format!("Slide response had unexpected shape: {}", e))
        })
    }
}

fn outline_prompt(request: &DeckRequest) -> String {
    format!(
        r#"You are a presentation planner. Propose an outline for a slide deck.

Topic: {topic}
Audience: {audience}
Tone: {tone}
Number of content slides: {slide_count}

Respond with JSON only, no prose, in exactly this shape:
{{
  "title": "deck title",
  "slides": [
    {{"title": "slide title", "summary": "one sentence on what the slide covers"}}
  ],
  "citations": ["optional source or reference"]
}}

The slides array must contain exactly {slide_count} entries."#,
        topic = request.topic,
        audience = request.audience,
        tone = request.tone,
        slide_count = request.slide_count,
    )
}

fn slide_prompt(title: &str, summary: &str) -> String {
    format!(
        r##"You are a presentation writer. Draft the content for one slide.

Slide title: {title}
Slide summary: {summary}

Respond with JSON only, no prose, in exactly this shape:
{{
  "bullets": ["three to five short bullet points"],
  "notes": "speaker notes for this slide",
  "image_prompt": "short description of a fitting stock photo",
  "theme": {{"font": "font family name", "color": "#RRGGBB accent color"}}
}}"##,
        title = title,
        summary = summary,
    )
}

/// Pulls the first parseable JSON body out of a model reply. Replies often
/// arrive wrapped in a Markdown code fence, with or without a language tag;
/// if no fenced block parses, the whole reply is returned trimmed.
pub(crate) fn extract_json_block(text: &str) -> String {
    let mut search = text;
    while let Some(open) = search.find("```") {
        let after_open = &search[open + 3..];

        // A fence may carry a language tag on its opening line.
        let body = match after_open.find('\n') {
            Some(newline)
                if after_open[..newline]
                    .trim()
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric()) =>
            {
                &after_open[newline + 1..]
            }
            _ => after_open,
        };

        match body.find("```") {
            Some(close) => {
                let candidate = body[..close].trim();
                if serde_json::from_str::<Value>(candidate).is_ok() {
                    return candidate.to_string();
                }
                search = &body[close + 3..];
            }
            None => break,
        }
    }
    text.trim().to_string()
}
