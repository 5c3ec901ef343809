// ABOUTME: Deck generation pipeline for the decksmith application
// ABOUTME: Orchestrates cache lookup, outline and slide generation, and export

use crate::cache::DeckCache;
use crate::deck::{coerce_optional_text, Deck, DeckRequest};
use crate::errors::Result;
use crate::exporter::{export_slides_with, ExportConfig};
use crate::images::ImageSource;
use crate::llm::ContentGenerator;
use log::info;
use serde_json::{json, Value};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Generate a complete deck for a request, consulting the cache first.
///
/// On a miss the outline is generated, then every planned slide is drafted
/// in outline order, one at a time; the finished deck is cached before it
/// is returned. Any failure aborts the whole run and caches nothing, so a
/// later call starts fresh. Two concurrent calls for the same brief may
/// both generate; the second write simply replaces the first.
pub fn generate_full_deck(
    request: &DeckRequest,
    generator: &dyn ContentGenerator,
    cache: &dyn DeckCache,
) -> Result<Deck> {
    if let Some(deck) = cache.get(request) {
        return Ok(deck);
    }

    info!("Generating new deck for topic {:?}", request.topic);
    let outline = generator.propose_outline(request)?;

    let mut slides = Vec::with_capacity(outline.slides.len());
    for plan in &outline.slides {
        slides.push(generator.draft_slide(plan)?);
    }

    let deck = Deck { outline, slides };
    cache.set(request, &deck);
    info!("Deck generation complete ({} slides)", deck.slides.len());
    Ok(deck)
}

/// Merge a generated deck into the document shape the exporter reads.
///
/// Outline entries and drafted slides are paired up in order; if their
/// counts differ, the extra entries on the longer side are dropped. A
/// blank outline title falls back to the request topic.
pub fn deck_to_export_input(deck: &Deck, request: &DeckRequest) -> Value {
    let title = coerce_optional_text(&deck.outline.title)
        .unwrap_or_else(|| request.topic.clone());
    let subtitle = format!("For {}", request.audience);

    let slides: Vec<Value> = deck
        .outline
        .slides
        .iter()
        .zip(&deck.slides)
        .enumerate()
        .map(|(index, (plan, content))| {
            let slide_title = coerce_optional_text(&plan.title)
                .unwrap_or_else(|| format!("Slide {}", index + 1));
            json!({
                "title": slide_title,
                "summary": plan.summary,
                "bullets": content.bullets,
                "notes": content.notes,
                "image_prompt": content.image_prompt,
                "theme": content.theme,
            })
        })
        .collect();

    json!({
        "title": title,
        "subtitle": subtitle,
        "slides": slides,
    })
}

/// Generate a deck for a request and export it to a PPTX file in one go.
/// The merged deck document is staged through a temporary file, so the
/// exporter sees exactly what a detached export would see.
pub fn export_deck(
    request: &DeckRequest,
    generator: &dyn ContentGenerator,
    cache: &dyn DeckCache,
    images: Option<&dyn ImageSource>,
    config: &ExportConfig,
    output_path: &Path,
) -> Result<PathBuf> {
    let deck = generate_full_deck(request, generator, cache)?;
    let document = deck_to_export_input(&deck, request);

    let mut staged = NamedTempFile::new()?;
    serde_json::to_writer_pretty(&mut staged, &document).map_err(|e| {
        crate::errors::DeckError::ExportError(format!("Could not stage deck document: {}", e))
    })?;
    staged.flush()?;

    export_slides_with(staged.path(), output_path, config, images)
}
