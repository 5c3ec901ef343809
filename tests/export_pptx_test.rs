use decksmith::errors::DeckError;
use decksmith::exporter::{export_slides, export_slides_with, ExportConfig};
use decksmith::images::ImageSource;
use image::{ImageBuffer, Rgb};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::{json, Value};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::ZipArchive;

fn write_deck_json(dir: &Path, document: &Value) -> PathBuf {
    let path = dir.join("deck.json");
    fs::write(&path, serde_json::to_string_pretty(document).unwrap())
        .expect("Failed to write deck JSON");
    path
}

fn export_config(dir: &Path) -> ExportConfig {
    ExportConfig {
        template_path: dir.join("template.pptx"),
    }
}

fn archive_names(path: &Path) -> Vec<String> {
    let file = fs::File::open(path).expect("Failed to open PPTX file");
    let mut archive = ZipArchive::new(file).expect("Failed to read PPTX as ZIP");
    (0..archive.len())
        .filter_map(|i| archive.by_index(i).ok().map(|f| f.name().to_string()))
        .collect()
}

fn part_xml(path: &Path, part_name: &str) -> String {
    let file = fs::File::open(path).expect("Failed to open PPTX file");
    let mut archive = ZipArchive::new(file).expect("Failed to read PPTX as ZIP");
    let mut xml = String::new();
    archive
        .by_name(part_name)
        .unwrap_or_else(|_| panic!("Missing part: {}", part_name))
        .read_to_string(&mut xml)
        .expect("Failed to read part");
    xml
}

/// Collects the text runs of a slide part, in document order.
fn part_texts(path: &Path, part_name: &str) -> Vec<String> {
    let xml = part_xml(path, part_name);
    let mut reader = Reader::from_str(&xml);
    let mut buf = Vec::new();
    let mut texts = Vec::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"a:t" => in_text_run = true,
            Ok(Event::End(ref e)) if e.name().as_ref() == b"a:t" => in_text_run = false,
            Ok(Event::Text(ref t)) if in_text_run => {
                texts.push(t.unescape().expect("Invalid text run").to_string());
            }
            Ok(Event::Eof) => break,
            Err(e) => panic!("XML parse error in {}: {}", part_name, e),
            _ => {}
        }
        buf.clear();
    }
    texts
}

fn slide_count(names: &[String]) -> usize {
    names
        .iter()
        .filter(|name| name.starts_with("ppt/slides/slide") && name.ends_with(".xml"))
        .count()
}

#[test]
fn test_export_creates_presentation() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let document = json!({
        "title": "Accessibility in AI",
        "subtitle": "For product teams",
        "slides": [
            {
                "title": "Introduction",
                "bullets": ["Why it matters", "Who benefits"],
                "notes": "Welcome everyone",
                "theme": {"font": "Arial", "color": "#336699"}
            },
            {
                "title": "Best Practices",
                "bullets": ["Alt text everywhere", "Check contrast"]
            }
        ]
    });
    let input = write_deck_json(temp_dir.path(), &document);
    let output = temp_dir.path().join("out.pptx");

    let result = export_slides_with(&input, &output, &export_config(temp_dir.path()), None);
    assert!(result.is_ok(), "Export failed: {:?}", result.err());
    assert_eq!(result.unwrap(), output);
    assert!(output.exists(), "PPTX file was not created");

    // One title slide plus two content slides
    let names = archive_names(&output);
    assert_eq!(slide_count(&names), 3, "Expected three slide XML files");

    // The template's reusable parts are carried over
    assert!(names.contains(&"ppt/slideMasters/slideMaster1.xml".to_string()));
    assert!(names.contains(&"ppt/slideLayouts/slideLayout1.xml".to_string()));
    assert!(names.contains(&"ppt/slideLayouts/slideLayout2.xml".to_string()));
    assert!(names.contains(&"ppt/theme/theme1.xml".to_string()));
    assert!(names.contains(&"ppt/notesMasters/notesMaster1.xml".to_string()));

    // Only the first content slide carries notes
    let notes: Vec<&String> = names
        .iter()
        .filter(|name| name.starts_with("ppt/notesSlides/notesSlide") && name.ends_with(".xml"))
        .collect();
    assert_eq!(notes.len(), 1);
    assert_eq!(
        part_texts(&output, "ppt/notesSlides/notesSlide1.xml"),
        vec!["Welcome everyone"]
    );

    // No images were requested
    assert!(!names.iter().any(|name| name.starts_with("ppt/media/")));

    let title_texts = part_texts(&output, "ppt/slides/slide1.xml");
    assert_eq!(title_texts[0], "Accessibility in AI");
    assert!(title_texts.contains(&"For product teams".to_string()));

    let first_content = part_texts(&output, "ppt/slides/slide2.xml");
    assert_eq!(first_content[0], "Introduction");
    assert!(first_content.contains(&"Why it matters".to_string()));

    // The slide theme shows up as run properties
    let slide2_xml = part_xml(&output, "ppt/slides/slide2.xml");
    assert!(slide2_xml.contains(r#"<a:srgbClr val="336699"/>"#));
    assert!(slide2_xml.contains(r#"<a:latin typeface="Arial"/>"#));

    let second_content = part_texts(&output, "ppt/slides/slide3.xml");
    assert_eq!(second_content[0], "Best Practices");
}

#[test]
fn test_export_missing_input_is_not_found() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let output = temp_dir.path().join("out.pptx");

    let result = export_slides(Path::new("/nonexistent/deck.json"), &output);
    match result {
        Err(DeckError::PathNotFoundError(_)) => {}
        other => panic!("Expected PathNotFoundError, got {:?}", other),
    }
    assert!(!output.exists(), "No output should be written on failure");
}

#[test]
fn test_export_rejects_unparseable_input() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let input = temp_dir.path().join("deck.json");
    fs::write(&input, "{ this is not json").expect("Failed to write input");
    let output = temp_dir.path().join("out.pptx");

    let result = export_slides_with(&input, &output, &export_config(temp_dir.path()), None);
    match result {
        Err(DeckError::ExportError(message)) => {
            assert!(message.contains("Invalid deck input"), "Got: {}", message)
        }
        other => panic!("Expected ExportError, got {:?}", other),
    }
    assert!(!output.exists(), "No output should be written on failure");
}

#[test]
fn test_export_creates_template_once() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = export_config(temp_dir.path());
    let document = json!({"title": "First", "slides": []});
    let input = write_deck_json(temp_dir.path(), &document);

    assert!(!config.template_path.exists());
    export_slides_with(&input, &temp_dir.path().join("a.pptx"), &config, None)
        .expect("First export failed");
    assert!(config.template_path.exists(), "Template was not created");

    let created = fs::metadata(&config.template_path)
        .and_then(|meta| meta.modified())
        .expect("Failed to stat template");
    std::thread::sleep(std::time::Duration::from_millis(50));

    export_slides_with(&input, &temp_dir.path().join("b.pptx"), &config, None)
        .expect("Second export failed");
    let after = fs::metadata(&config.template_path)
        .and_then(|meta| meta.modified())
        .expect("Failed to stat template");

    // The existing template is reused, not rewritten
    assert_eq!(created, after);
}

#[test]
fn test_export_tolerates_messy_fields() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let document = json!({
        "title": 123,
        "slides": [
            {
                "title": 456,
                "bullets": "Bullet as string\nAnother bullet",
                "notes": 1011,
                "theme": "notadict"
            },
            {
                "title": null,
                "bullets": [true, {"x": 1}],
                "image_prompt": null
            }
        ]
    });
    let input = write_deck_json(temp_dir.path(), &document);
    let output = temp_dir.path().join("out.pptx");

    export_slides_with(&input, &output, &export_config(temp_dir.path()), None)
        .expect("Messy input should still export");

    let names = archive_names(&output);
    assert_eq!(slide_count(&names), 3);

    // Numeric title renders as its literal text
    assert_eq!(part_texts(&output, "ppt/slides/slide1.xml")[0], "123");

    let first_content = part_texts(&output, "ppt/slides/slide2.xml");
    assert_eq!(first_content[0], "456");
    assert!(first_content.contains(&"Bullet as string".to_string()));
    assert!(first_content.contains(&"Another bullet".to_string()));

    // Numeric notes are still speaker notes
    assert_eq!(
        part_texts(&output, "ppt/notesSlides/notesSlide1.xml"),
        vec!["1011"]
    );

    // Non-text bullet elements fall back to literal JSON
    let second_content = part_texts(&output, "ppt/slides/slide3.xml");
    assert!(second_content.contains(&"true".to_string()));
    assert!(second_content.contains(&r#"{"x":1}"#.to_string()));
}

#[test]
fn test_export_with_no_slides_yields_title_only() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let input = write_deck_json(temp_dir.path(), &json!({"title": "Empty", "slides": []}));
    let output = temp_dir.path().join("out.pptx");

    export_slides_with(&input, &output, &export_config(temp_dir.path()), None)
        .expect("Empty deck should still export");

    let names = archive_names(&output);
    assert_eq!(slide_count(&names), 1);
    assert_eq!(part_texts(&output, "ppt/slides/slide1.xml")[0], "Empty");

    // A document with no slides key at all behaves the same
    let input = write_deck_json(temp_dir.path(), &json!({"title": "Still works"}));
    let output = temp_dir.path().join("out2.pptx");
    export_slides_with(&input, &output, &export_config(temp_dir.path()), None)
        .expect("Deck without slides key should still export");
    assert_eq!(slide_count(&archive_names(&output)), 1);
}

#[test]
fn test_export_creates_parent_directories() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let input = write_deck_json(temp_dir.path(), &json!({"title": "Nested", "slides": []}));
    let output = temp_dir.path().join("deep/nested/out.pptx");

    let result = export_slides_with(&input, &output, &export_config(temp_dir.path()), None);
    assert!(result.is_ok(), "Export failed: {:?}", result.err());
    assert!(output.exists(), "Output in nested directory was not created");
}

#[test]
fn test_export_overwrites_existing_output() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let input = write_deck_json(temp_dir.path(), &json!({"title": "Fresh", "slides": []}));
    let output = temp_dir.path().join("out.pptx");
    fs::write(&output, "stale bytes").expect("Failed to write stale file");

    export_slides_with(&input, &output, &export_config(temp_dir.path()), None)
        .expect("Export over an existing file failed");

    // The destination is now a valid archive again
    assert_eq!(slide_count(&archive_names(&output)), 1);
}

struct StubImages {
    bytes: Vec<u8>,
}

impl ImageSource for StubImages {
    fn resolve(&self, _query: &str) -> Option<Vec<u8>> {
        Some(self.bytes.clone())
    }
}

fn png_bytes(dir: &Path) -> Vec<u8> {
    let path = dir.join("stub.png");
    let img = ImageBuffer::from_fn(4, 4, |_, _| Rgb([120u8, 30u8, 200u8]));
    img.save(&path).expect("Failed to save stub image");
    fs::read(&path).expect("Failed to read stub image")
}

#[test]
fn test_export_embeds_resolved_images() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let document = json!({
        "title": "Illustrated",
        "slides": [
            {"title": "With image", "bullets": ["One"], "image_prompt": "sunrise over hills"},
            {"title": "Without image", "bullets": ["Two"]}
        ]
    });
    let input = write_deck_json(temp_dir.path(), &document);
    let output = temp_dir.path().join("out.pptx");
    let images = StubImages {
        bytes: png_bytes(temp_dir.path()),
    };

    export_slides_with(
        &input,
        &output,
        &export_config(temp_dir.path()),
        Some(&images),
    )
    .expect("Export with images failed");

    let names = archive_names(&output);
    let media: Vec<&String> = names
        .iter()
        .filter(|name| name.starts_with("ppt/media/"))
        .collect();
    assert_eq!(media.len(), 1, "Exactly one image should be embedded");
    assert!(names.contains(&"ppt/media/slide_image2.png".to_string()));

    // The slide with the prompt references its picture, the other does not
    let slide2_rels = part_xml(&output, "ppt/slides/_rels/slide2.xml.rels");
    assert!(slide2_rels.contains("../media/slide_image2.png"));
    assert!(part_xml(&output, "ppt/slides/slide2.xml").contains("<p:pic>"));
    assert!(!part_xml(&output, "ppt/slides/slide3.xml").contains("<p:pic>"));
}

#[test]
fn test_export_skips_undecodable_image_bytes() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let document = json!({
        "title": "Illustrated",
        "slides": [{"title": "With image", "bullets": ["One"], "image_prompt": "sunrise"}]
    });
    let input = write_deck_json(temp_dir.path(), &document);
    let output = temp_dir.path().join("out.pptx");
    let images = StubImages {
        bytes: b"definitely not an image".to_vec(),
    };

    export_slides_with(
        &input,
        &output,
        &export_config(temp_dir.path()),
        Some(&images),
    )
    .expect("Undecodable image bytes must not fail the export");

    let names = archive_names(&output);
    assert!(!names.iter().any(|name| name.starts_with("ppt/media/")));
    assert!(!part_xml(&output, "ppt/slides/slide2.xml").contains("<p:pic>"));
}
