// ABOUTME: Library module for the decksmith program.
// ABOUTME: Contains core functionality for generating, caching and exporting slide decks.

// Reexport modules
pub mod cache;
pub mod config;
pub mod deck;
pub mod errors;
pub mod exporter;
pub mod images;
pub mod llm;
pub mod pipeline;
pub mod template;
pub mod utils;

// Reexport common types and functions
pub use cache::{DeckCache, MemoryCache, RedisCache, cache_key};
pub use config::Config;
pub use deck::{Deck, DeckRequest, Outline, SlideContent, SlidePlan, SlideTheme};
pub use errors::{DeckError, Result};
pub use exporter::{ExportConfig, export_slides, export_slides_with};
pub use images::{ImageSource, UnsplashImages};
pub use llm::{ContentGenerator, OpenRouterClient};
pub use pipeline::{deck_to_export_input, export_deck, generate_full_deck};
pub use template::{create_minimal_template, ensure_template};

#[cfg(test)]
mod tests;
