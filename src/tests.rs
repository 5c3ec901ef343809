use super::deck::{coerce_bullet_lines, coerce_optional_text, coerce_text, coerce_theme};
use super::exporter::parse_slide_size;
use super::llm::extract_json_block;
use super::utils::sanitize_filename;
use super::*;
use serde_json::{json, Value};
use std::time::Duration;

fn sample_deck(slide_count: usize) -> Deck {
    let plans: Vec<SlidePlan> = (0..slide_count)
        .map(|i| SlidePlan {
            title: json!(format!("Slide {}", i + 1)),
            summary: json!("What this slide covers"),
        })
        .collect();
    let contents: Vec<SlideContent> = (0..slide_count)
        .map(|i| SlideContent {
            bullets: json!([format!("Point {}", i + 1), "Another point"]),
            notes: json!("Speaker notes"),
            image_prompt: Value::Null,
            theme: Value::Null,
        })
        .collect();

    Deck {
        outline: Outline {
            title: json!("Deck Title"),
            slides: plans,
            citations: Value::Null,
        },
        slides: contents,
    }
}

#[test]
fn test_coerce_text_literals() {
    assert_eq!(coerce_text(&json!("hello")), "hello");
    assert_eq!(coerce_text(&json!(123)), "123");
    assert_eq!(coerce_text(&json!(1.5)), "1.5");
    assert_eq!(coerce_text(&json!(true)), "true");
    assert_eq!(coerce_text(&Value::Null), "");
}

#[test]
fn test_coerce_text_compacts_structures() {
    assert_eq!(coerce_text(&json!(["a", "b"])), r#"["a","b"]"#);
    assert_eq!(coerce_text(&json!({"k": 1})), r#"{"k":1}"#);
}

#[test]
fn test_coerce_optional_text_blank_is_absent() {
    assert_eq!(coerce_optional_text(&Value::Null), None);
    assert_eq!(coerce_optional_text(&json!("")), None);
    assert_eq!(coerce_optional_text(&json!("   ")), None);
    assert_eq!(coerce_optional_text(&json!("x")), Some("x".to_string()));
    assert_eq!(coerce_optional_text(&json!(1011)), Some("1011".to_string()));
}

#[test]
fn test_coerce_bullet_lines_from_array() {
    let bullets = coerce_bullet_lines(&json!(["First", 2, null, "Third"]));
    assert_eq!(bullets, vec!["First", "2", "Third"]);
}

#[test]
fn test_coerce_bullet_lines_from_string() {
    let bullets = coerce_bullet_lines(&json!("One\nTwo\r\n\nThree"));
    assert_eq!(bullets, vec!["One", "Two", "Three"]);
}

#[test]
fn test_coerce_bullet_lines_other_shapes_yield_nothing() {
    assert!(coerce_bullet_lines(&Value::Null).is_empty());
    assert!(coerce_bullet_lines(&json!(42)).is_empty());
    assert!(coerce_bullet_lines(&json!({"text": "nope"})).is_empty());
}

#[test]
fn test_coerce_theme_extracts_font_and_color() {
    let theme = coerce_theme(&json!({"font": "Arial", "color": "#003366"}));
    assert_eq!(theme.font, Some("Arial".to_string()));
    assert_eq!(theme.color, Some("003366".to_string()));
}

#[test]
fn test_coerce_theme_accepts_bare_hex_and_uppercases() {
    let theme = coerce_theme(&json!({"color": "ab12cd"}));
    assert_eq!(theme.color, Some("AB12CD".to_string()));
}

#[test]
fn test_coerce_theme_drops_malformed_color() {
    let theme = coerce_theme(&json!({"font": "Georgia", "color": "navy"}));
    assert_eq!(theme.font, Some("Georgia".to_string()));
    assert_eq!(theme.color, None);
}

#[test]
fn test_coerce_theme_non_mapping_is_default() {
    assert_eq!(coerce_theme(&json!("dark")), SlideTheme::default());
    assert_eq!(coerce_theme(&Value::Null), SlideTheme::default());
    assert_eq!(coerce_theme(&json!([1, 2])), SlideTheme::default());
}

#[test]
fn test_coerce_theme_coerces_odd_font_values() {
    // A numeric font name still renders as text rather than failing
    let theme = coerce_theme(&json!({"font": 42}));
    assert_eq!(theme.font, Some("42".to_string()));
}

#[test]
fn test_outline_accepts_loose_fields() {
    let value = json!({"title": 42, "slides": [{"title": "A"}, {}], "citations": ["x"]});
    let outline: Outline = serde_json::from_value(value).unwrap();

    assert_eq!(outline.title, json!(42));
    assert_eq!(outline.slides.len(), 2);
    assert_eq!(outline.slides[0].title, json!("A"));
    assert_eq!(outline.slides[1].title, Value::Null);
    assert_eq!(outline.citations, json!(["x"]));
}

#[test]
fn test_slide_content_missing_fields_default() {
    let content: SlideContent = serde_json::from_value(json!({"bullets": "a\nb"})).unwrap();
    assert_eq!(content.bullets, json!("a\nb"));
    assert_eq!(content.notes, Value::Null);
    assert_eq!(content.image_prompt, Value::Null);
    assert_eq!(content.theme, Value::Null);
}

#[test]
fn test_cache_key_is_fixed_width_hex() {
    let request = DeckRequest::new("Rust for beginners", "engineers", "friendly", 5);
    let key = cache_key(&request);

    assert_eq!(key.len(), 64);
    assert!(key.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
}

#[test]
fn test_cache_key_is_deterministic() {
    let a = DeckRequest::new("Topic", "Audience", "Tone", 3);
    let b = a.clone();
    assert_eq!(cache_key(&a), cache_key(&b));
}

#[test]
fn test_cache_key_differs_per_field() {
    let base = DeckRequest::new("Topic", "Audience", "Tone", 3);

    let mut changed = base.clone();
    changed.topic = "Other topic".to_string();
    assert_ne!(cache_key(&base), cache_key(&changed));

    let mut changed = base.clone();
    changed.audience = "Other audience".to_string();
    assert_ne!(cache_key(&base), cache_key(&changed));

    let mut changed = base.clone();
    changed.tone = "Other tone".to_string();
    assert_ne!(cache_key(&base), cache_key(&changed));

    let mut changed = base.clone();
    changed.slide_count = 4;
    assert_ne!(cache_key(&base), cache_key(&changed));
}

#[test]
fn test_memory_cache_round_trip() {
    let cache = MemoryCache::new(Duration::from_secs(60));
    let request = DeckRequest::new("Rust", "devs", "fun", 2);
    let deck = sample_deck(2);

    assert!(cache.get(&request).is_none());
    cache.set(&request, &deck);
    assert_eq!(cache.get(&request), Some(deck));
}

#[test]
fn test_memory_cache_returns_copies() {
    let cache = MemoryCache::new(Duration::from_secs(60));
    let request = DeckRequest::new("Rust", "devs", "fun", 2);
    let deck = sample_deck(2);
    cache.set(&request, &deck);

    // Mutating a returned deck must not leak back into the cache
    let mut first = cache.get(&request).unwrap();
    first.slides[0].bullets = json!(["changed"]);

    assert_eq!(cache.get(&request), Some(deck));
}

#[test]
fn test_memory_cache_set_overwrites() {
    let cache = MemoryCache::new(Duration::from_secs(60));
    let request = DeckRequest::new("Rust", "devs", "fun", 2);

    cache.set(&request, &sample_deck(1));
    let replacement = sample_deck(2);
    cache.set(&request, &replacement);

    assert_eq!(cache.get(&request), Some(replacement));
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_memory_cache_expires_and_evicts() {
    let cache = MemoryCache::new(Duration::from_millis(50));
    let request = DeckRequest::new("Rust", "devs", "fun", 2);
    cache.set(&request, &sample_deck(1));
    assert_eq!(cache.len(), 1);

    std::thread::sleep(Duration::from_millis(100));

    // The expired entry reports a miss and is dropped from the store
    assert!(cache.get(&request).is_none());
    assert_eq!(cache.len(), 0);
}

#[test]
fn test_memory_cache_clear() {
    let cache = MemoryCache::new(Duration::from_secs(60));
    cache.set(&DeckRequest::new("A", "x", "y", 1), &sample_deck(1));
    cache.set(&DeckRequest::new("B", "x", "y", 1), &sample_deck(1));
    assert_eq!(cache.len(), 2);

    cache.clear();
    assert!(cache.is_empty());
    assert!(cache.get(&DeckRequest::new("A", "x", "y", 1)).is_none());
}

#[test]
fn test_extract_json_block_with_tagged_fence() {
    let text = "Here is the outline:\n```json\n{\"title\": \"T\"}\n```\nEnjoy!";
    let value: Value = serde_json::from_str(&extract_json_block(text)).unwrap();
    assert_eq!(value, json!({"title": "T"}));
}

#[test]
fn test_extract_json_block_with_bare_fence() {
    let text = "```\n{\"bullets\": [1, 2]}\n```";
    let value: Value = serde_json::from_str(&extract_json_block(text)).unwrap();
    assert_eq!(value, json!({"bullets": [1, 2]}));
}

#[test]
fn test_extract_json_block_without_fence() {
    let text = "  {\"title\": \"plain\"}  ";
    assert_eq!(extract_json_block(text), "{\"title\": \"plain\"}");
}

#[test]
fn test_extract_json_block_skips_unparseable_fences() {
    let text = "```\nnot json\n```\n```json\n{\"ok\": true}\n```";
    let value: Value = serde_json::from_str(&extract_json_block(text)).unwrap();
    assert_eq!(value, json!({"ok": true}));
}

#[test]
fn test_extract_json_block_falls_back_to_whole_text() {
    let text = "no json anywhere";
    assert_eq!(extract_json_block(text), "no json anywhere");
}

#[test]
fn test_sanitize_filename_basic() {
    assert_eq!(
        sanitize_filename("Quarterly Review: Q3 2025!"),
        "Quarterly_Review_Q3_2025"
    );
    assert_eq!(sanitize_filename("  hello  "), "hello");
    assert_eq!(sanitize_filename("already-safe_name"), "already-safe_name");
}

#[test]
fn test_sanitize_filename_truncates() {
    let long = "a".repeat(80);
    assert_eq!(sanitize_filename(&long).len(), 50);
}

#[test]
fn test_sanitize_filename_falls_back_when_empty() {
    assert_eq!(sanitize_filename(""), "presentation");
    assert_eq!(sanitize_filename("???"), "presentation");
}

#[test]
fn test_parse_slide_size_reads_dimensions() {
    let xml = r#"<p:presentation xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:sldSz cx="9144000" cy="5143500" type="screen16x9"/></p:presentation>"#;
    assert_eq!(parse_slide_size(xml), (9144000, 5143500));
}

#[test]
fn test_parse_slide_size_falls_back_to_4x3() {
    assert_eq!(parse_slide_size("<p:presentation/>"), (9144000, 6858000));
    assert_eq!(parse_slide_size("not xml at all"), (9144000, 6858000));
}

#[test]
fn test_export_input_pairs_outline_with_drafts() {
    let mut deck = sample_deck(3);
    deck.slides.truncate(2);
    let request = DeckRequest::new("Rust", "devs", "fun", 3);

    let document = deck_to_export_input(&deck, &request);

    assert_eq!(document["title"], json!("Deck Title"));
    assert_eq!(document["subtitle"], json!("For devs"));
    // Pairing stops at the shorter side
    let slides = document["slides"].as_array().unwrap();
    assert_eq!(slides.len(), 2);
    assert_eq!(slides[0]["title"], json!("Slide 1"));
    assert_eq!(slides[0]["bullets"], json!(["Point 1", "Another point"]));
    assert_eq!(slides[1]["notes"], json!("Speaker notes"));
}

#[test]
fn test_export_input_title_falls_back_to_topic() {
    let mut deck = sample_deck(1);
    deck.outline.title = Value::Null;
    deck.outline.slides[0].title = json!("   ");
    let request = DeckRequest::new("Ada Lovelace", "students", "warm", 1);

    let document = deck_to_export_input(&deck, &request);

    assert_eq!(document["title"], json!("Ada Lovelace"));
    assert_eq!(document["slides"][0]["title"], json!("Slide 1"));
}

mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_equal_briefs_share_a_key(
            topic in "[a-zA-Z0-9 ]{1,24}",
            audience in "[a-zA-Z0-9 ]{1,24}",
            tone in "[a-zA-Z ]{1,16}",
            slide_count in 1u32..40,
        ) {
            let a = DeckRequest::new(topic.clone(), audience.clone(), tone.clone(), slide_count);
            let b = DeckRequest::new(topic, audience, tone, slide_count);
            prop_assert_eq!(cache_key(&a), cache_key(&b));
        }

        #[test]
        fn prop_any_field_change_changes_the_key(
            topic in "[a-zA-Z0-9 ]{1,24}",
            audience in "[a-zA-Z0-9 ]{1,24}",
            tone in "[a-zA-Z ]{1,16}",
            slide_count in 1u32..40,
            suffix in "[a-z]{1,6}",
        ) {
            let base = DeckRequest::new(topic, audience, tone, slide_count);

            let mut changed = base.clone();
            changed.topic = format!("{}{}", changed.topic, suffix);
            prop_assert_ne!(cache_key(&base), cache_key(&changed));

            let mut changed = base.clone();
            changed.audience = format!("{}{}", changed.audience, suffix);
            prop_assert_ne!(cache_key(&base), cache_key(&changed));

            let mut changed = base.clone();
            changed.tone = format!("{}{}", changed.tone, suffix);
            prop_assert_ne!(cache_key(&base), cache_key(&changed));

            let mut changed = base.clone();
            changed.slide_count += 1;
            prop_assert_ne!(cache_key(&base), cache_key(&changed));
        }

        #[test]
        fn prop_keys_stay_fixed_width_for_any_input(
            topic in any::<String>(),
            audience in any::<String>(),
            tone in any::<String>(),
            slide_count in any::<u32>(),
        ) {
            let key = cache_key(&DeckRequest::new(topic, audience, tone, slide_count));
            prop_assert_eq!(key.len(), 64);
            prop_assert!(key.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
        }
    }
}
