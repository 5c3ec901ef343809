// ABOUTME: Core data model for deck briefs, outlines and drafted slides
// ABOUTME: Includes the coercion helpers that normalize loosely-typed model output

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The brief a deck is generated from. The four fields together identify a
/// deck for caching purposes, see [`crate::cache::cache_key`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeckRequest {
    pub topic: String,
    pub audience: String,
    pub tone: String,
    pub slide_count: u32,
}

impl DeckRequest {
    pub fn new(
        topic: impl Into<String>,
        audience: impl Into<String>,
        tone: impl Into<String>,
        slide_count: u32,
    ) -> Self {
        DeckRequest {
            topic: topic.into(),
            audience: audience.into(),
            tone: tone.into(),
            slide_count,
        }
    }
}

/// One planned slide in an outline. Fields are kept as raw JSON values
/// because the model occasionally returns numbers or nested structures
/// where prose was asked for; they are normalized at assembly time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlidePlan {
    #[serde(default)]
    pub title: Value,
    #[serde(default)]
    pub summary: Value,
}

/// The overall plan for a deck: a title and one entry per slide.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    #[serde(default)]
    pub title: Value,
    #[serde(default)]
    pub slides: Vec<SlidePlan>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub citations: Value,
}

/// Drafted content for a single slide.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlideContent {
    #[serde(default)]
    pub bullets: Value,
    #[serde(default)]
    pub notes: Value,
    #[serde(default)]
    pub image_prompt: Value,
    #[serde(default)]
    pub theme: Value,
}

/// A fully generated deck: the outline plus drafted content for each
/// planned slide, in outline order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Deck {
    pub outline: Outline,
    pub slides: Vec<SlideContent>,
}

/// Per-slide styling extracted from a drafted slide's theme mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlideTheme {
    pub font: Option<String>,
    /// Six-digit hex color, without the leading '#'.
    pub color: Option<String>,
}

/// Renders any JSON value as display text. Strings pass through, numbers
/// and booleans become their literal form, null becomes the empty string,
/// and arrays or objects fall back to compact JSON.
pub fn coerce_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Like [`coerce_text`], but treats null and blank text as absent.
pub fn coerce_optional_text(value: &Value) -> Option<String> {
    let text = coerce_text(value);
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Normalizes a bullets value into display lines. An array yields one line
/// per element, a string is split on newlines, and any other shape yields
/// no lines at all.
pub fn coerce_bullet_lines(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(coerce_optional_text)
            .collect(),
        Value::String(text) => text
            .lines()
            .map(|line| line.trim_end_matches('\r').trim())
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
        Value::Null => Vec::new(),
        other => {
            debug!("ignoring non-list bullets value: {}", other);
            Vec::new()
        }
    }
}

/// Extracts styling from a theme value. Only mappings contribute anything;
/// unknown keys and malformed colors are dropped with a warning.
pub fn coerce_theme(value: &Value) -> SlideTheme {
    let map = match value.as_object() {
        Some(map) => map,
        None => {
            if !value.is_null() {
                debug!("ignoring non-mapping theme value: {}", value);
            }
            return SlideTheme::default();
        }
    };

    let font = map.get("font").and_then(coerce_optional_text);
    let color = map
        .get("color")
        .and_then(coerce_optional_text)
        .and_then(|raw| normalize_color(&raw));

    SlideTheme { font, color }
}

fn normalize_color(raw: &str) -> Option<String> {
    let hex = raw.trim().trim_start_matches('#');
    if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(hex.to_ascii_uppercase())
    } else {
        warn!("ignoring unrecognized color value: {:?}", raw);
        None
    }
}
