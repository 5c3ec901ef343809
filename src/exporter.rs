// ABOUTME: PPTX export module for the decksmith application
// ABOUTME: Assembles a deck-shaped JSON document into a PowerPoint file

use crate::deck::{
    coerce_bullet_lines, coerce_optional_text, coerce_text, coerce_theme, SlideTheme,
};
use crate::errors::{DeckError, Result};
use crate::images::ImageSource;
use crate::template;
use crate::utils;
use log::{debug, info, warn};
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::Value;
use std::fs;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use zip::{write::FileOptions, ZipArchive, ZipWriter};

/// Configuration for PPTX export
pub struct ExportConfig {
    pub template_path: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            template_path: PathBuf::from(crate::config::DEFAULT_TEMPLATE_PATH),
        }
    }
}

/// Template parts reused by every export: the masters, layouts, theme and
/// media of the template, never its slides.
const TEMPLATE_COPY_PREFIXES: [&str; 4] = [
    "ppt/slideMasters/",
    "ppt/slideLayouts/",
    "ppt/theme/",
    "ppt/media/",
];

/// Parts the generated slides reference by name, so a usable template must
/// provide them.
const REQUIRED_TEMPLATE_PARTS: [&str; 4] = [
    "ppt/slideMasters/slideMaster1.xml",
    "ppt/slideLayouts/slideLayout1.xml",
    "ppt/slideLayouts/slideLayout2.xml",
    "ppt/theme/theme1.xml",
];

/// Horizontal page margin used for explicit shape geometry, in EMU.
const MARGIN_EMU: u64 = 457200;
/// Top edge of the body placeholder area, in EMU.
const BODY_TOP_EMU: u64 = 1600200;

/// One slide of the presentation being written, after coercion.
struct RenderSlide {
    title: String,
    bullets: Vec<String>,
    theme: SlideTheme,
    notes: Option<String>,
    image: Option<EmbeddedImage>,
}

struct EmbeddedImage {
    bytes: Vec<u8>,
    ext: &'static str,
}

/// Export a deck-shaped JSON file to a PPTX using the default template
/// location and no image lookups.
pub fn export_slides(input_path: &Path, output_path: &Path) -> Result<PathBuf> {
    export_slides_with(input_path, output_path, &ExportConfig::default(), None)
}

/// Export a deck-shaped JSON file to a PPTX presentation.
///
/// The input document provides a deck title, a subtitle and a list of
/// slide entries. Field values are normalized rather than validated, so a
/// numeric title or a newline-joined bullets string still exports; only a
/// missing file or a file that is not JSON at all fails. The destination
/// is overwritten if it exists and its path is returned on success.
pub fn export_slides_with(
    input_path: &Path,
    output_path: &Path,
    config: &ExportConfig,
    images: Option<&dyn ImageSource>,
) -> Result<PathBuf> {
    info!("Exporting deck from {:?} to {:?}", input_path, output_path);

    utils::validate_file_exists(input_path)?;
    let file = fs::File::open(input_path).map_err(DeckError::FileReadError)?;
    let doc: Value = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        DeckError::ExportError(format!("Invalid deck input {:?}: {}", input_path, e))
    })?;

    template::ensure_template(&config.template_path)?;
    let tpl = TemplateParts::load(&config.template_path)?;

    utils::ensure_parent_directory_exists(output_path)?;

    let title = coerce_text(field(&doc, "title"));
    let subtitle = coerce_text(field(&doc, "subtitle"));
    let entries = match field(&doc, "slides") {
        Value::Array(entries) => entries.clone(),
        Value::Null => Vec::new(),
        other => {
            warn!("Deck slides field is not a list, exporting none: {}", other);
            Vec::new()
        }
    };

    let slides: Vec<RenderSlide> = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| render_slide(index, entry, images))
        .collect();

    write_presentation(output_path, &tpl, &title, &subtitle, &slides)?;

    info!(
        "Presentation written to {:?} ({} slides)",
        output_path,
        slides.len() + 1
    );
    Ok(output_path.to_path_buf())
}

fn field<'a>(doc: &'a Value, name: &str) -> &'a Value {
    doc.get(name).unwrap_or(&Value::Null)
}

fn render_slide(index: usize, entry: &Value, images: Option<&dyn ImageSource>) -> RenderSlide {
    let title = coerce_text(field(entry, "title"));
    let bullets = coerce_bullet_lines(field(entry, "bullets"));
    let theme = coerce_theme(field(entry, "theme"));
    let notes = coerce_optional_text(field(entry, "notes"));
    let image = coerce_optional_text(field(entry, "image_prompt"))
        .and_then(|prompt| resolve_image(images?, index, &prompt));

    RenderSlide {
        title,
        bullets,
        theme,
        notes,
        image,
    }
}

fn resolve_image(
    source: &dyn ImageSource,
    index: usize,
    prompt: &str,
) -> Option<EmbeddedImage> {
    let bytes = source.resolve(prompt)?;
    match image::guess_format(&bytes) {
        Ok(image::ImageFormat::Png) => Some(EmbeddedImage { bytes, ext: "png" }),
        Ok(image::ImageFormat::Jpeg) => Some(EmbeddedImage { bytes, ext: "jpeg" }),
        Ok(other) => {
            warn!(
                "Slide {}: unsupported image format {:?}, skipping embed",
                index + 1,
                other
            );
            None
        }
        Err(e) => {
            warn!("Slide {}: could not identify image bytes: {}", index + 1, e);
            None
        }
    }
}

/// The reusable pieces of a template file, read once per export.
struct TemplateParts {
    parts: Vec<(String, Vec<u8>)>,
    slide_size: (u64, u64),
}

impl TemplateParts {
    fn load(path: &Path) -> Result<Self> {
        debug!("Loading template parts from {:?}", path);
        let file = fs::File::open(path).map_err(DeckError::FileReadError)?;
        let mut archive = ZipArchive::new(file).map_err(|e| {
            DeckError::TemplateError(format!(
                "Template {:?} is not a readable PPTX: {}",
                path, e
            ))
        })?;

        let mut names: Vec<String> = archive
            .file_names()
            .filter(|name| {
                TEMPLATE_COPY_PREFIXES
                    .iter()
                    .any(|prefix| name.starts_with(prefix))
            })
            .map(String::from)
            .collect();
        names.sort();

        for required in REQUIRED_TEMPLATE_PARTS {
            if !names.iter().any(|name| name == required) {
                return Err(DeckError::TemplateError(format!(
                    "Template {:?} is missing part {}",
                    path, required
                )));
            }
        }

        let mut parts = Vec::with_capacity(names.len());
        for name in names {
            let mut contents = Vec::new();
            archive
                .by_name(&name)?
                .read_to_end(&mut contents)
                .map_err(DeckError::FileReadError)?;
            parts.push((name, contents));
        }

        let slide_size = match archive.by_name("ppt/presentation.xml") {
            Ok(mut part) => {
                let mut xml = String::new();
                part.read_to_string(&mut xml)
                    .map_err(DeckError::FileReadError)?;
                parse_slide_size(&xml)
            }
            Err(_) => {
                warn!("Template {:?} has no presentation.xml, assuming 4:3", path);
                (template::SLIDE_WIDTH_EMU, template::SLIDE_HEIGHT_EMU)
            }
        };

        Ok(TemplateParts { parts, slide_size })
    }
}

/// Reads the slide size out of a presentation.xml body, falling back to
/// the built-in 4:3 size if none can be found.
pub(crate) fn parse_slide_size(xml: &str) -> (u64, u64) {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.name().as_ref() == b"p:sldSz" =>
            {
                let mut cx: Option<u64> = None;
                let mut cy: Option<u64> = None;
                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(attr.value.as_ref()).to_string();
                    match attr.key.as_ref() {
                        b"cx" => cx = value.parse().ok(),
                        b"cy" => cy = value.parse().ok(),
                        _ => {}
                    }
                }
                if let (Some(cx), Some(cy)) = (cx, cy) {
                    return (cx, cy);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                warn!("Could not parse presentation.xml: {}", e);
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    warn!("No readable slide size found, assuming 4:3");
    (template::SLIDE_WIDTH_EMU, template::SLIDE_HEIGHT_EMU)
}

fn write_presentation(
    output_path: &Path,
    tpl: &TemplateParts,
    title: &str,
    subtitle: &str,
    slides: &[RenderSlide],
) -> Result<()> {
    let file = fs::File::create(output_path).map_err(DeckError::FileReadError)?;
    let mut zip = ZipWriter::new(file);
    let total_slides = slides.len() + 1;

    debug!("Creating PPTX structure: [Content_Types].xml");
    zip.start_file("[Content_Types].xml", FileOptions::default())?;
    zip.write_all(content_types_xml(tpl, slides).as_bytes())?;

    zip.start_file("_rels/.rels", FileOptions::default())?;
    zip.write_all(ROOT_RELS_XML.as_bytes())?;

    zip.start_file("docProps/app.xml", FileOptions::default())?;
    zip.write_all(app_xml(total_slides).as_bytes())?;

    zip.start_file("docProps/core.xml", FileOptions::default())?;
    zip.write_all(core_xml(title).as_bytes())?;

    for (name, contents) in &tpl.parts {
        debug!("Copying template part: {}", name);
        zip.start_file(name.as_str(), FileOptions::default())?;
        zip.write_all(contents)?;
    }

    zip.start_file("ppt/presentation.xml", FileOptions::default())?;
    zip.write_all(presentation_xml(total_slides, tpl.slide_size).as_bytes())?;

    zip.start_file("ppt/_rels/presentation.xml.rels", FileOptions::default())?;
    zip.write_all(presentation_rels_xml(total_slides).as_bytes())?;

    zip.start_file("ppt/notesMasters/notesMaster1.xml", FileOptions::default())?;
    zip.write_all(NOTES_MASTER_XML.as_bytes())?;
    zip.start_file(
        "ppt/notesMasters/_rels/notesMaster1.xml.rels",
        FileOptions::default(),
    )?;
    zip.write_all(NOTES_MASTER_RELS_XML.as_bytes())?;

    debug!("Creating slide XML: ppt/slides/slide1.xml");
    zip.start_file("ppt/slides/slide1.xml", FileOptions::default())?;
    zip.write_all(title_slide_xml(title, subtitle).as_bytes())?;
    zip.start_file("ppt/slides/_rels/slide1.xml.rels", FileOptions::default())?;
    zip.write_all(TITLE_SLIDE_RELS_XML.as_bytes())?;

    let mut notes_count = 0usize;
    for (index, slide) in slides.iter().enumerate() {
        let slide_num = index + 2;
        debug!("Creating slide XML: ppt/slides/slide{}.xml", slide_num);

        let media_name = slide
            .image
            .as_ref()
            .map(|image| format!("slide_image{}.{}", slide_num, image.ext));
        if let (Some(image), Some(name)) = (&slide.image, &media_name) {
            debug!("Adding image to PPTX: ppt/media/{}", name);
            zip.start_file(format!("ppt/media/{}", name), FileOptions::default())?;
            zip.write_all(&image.bytes)?;
        }

        let notes_num = slide.notes.as_ref().map(|_| {
            notes_count += 1;
            notes_count
        });

        zip.start_file(
            format!("ppt/slides/slide{}.xml", slide_num),
            FileOptions::default(),
        )?;
        zip.write_all(content_slide_xml(slide, tpl.slide_size).as_bytes())?;

        zip.start_file(
            format!("ppt/slides/_rels/slide{}.xml.rels", slide_num),
            FileOptions::default(),
        )?;
        zip.write_all(content_slide_rels_xml(media_name.as_deref(), notes_num).as_bytes())?;

        if let (Some(notes), Some(notes_num)) = (&slide.notes, notes_num) {
            zip.start_file(
                format!("ppt/notesSlides/notesSlide{}.xml", notes_num),
                FileOptions::default(),
            )?;
            zip.write_all(notes_slide_xml(notes).as_bytes())?;
            zip.start_file(
                format!("ppt/notesSlides/_rels/notesSlide{}.xml.rels", notes_num),
                FileOptions::default(),
            )?;
            zip.write_all(notes_slide_rels_xml(slide_num).as_bytes())?;
        }
    }

    zip.finish()?;
    Ok(())
}

fn content_types_xml(tpl: &TemplateParts, slides: &[RenderSlide]) -> String {
    let mut overrides = Vec::new();
    for (name, _) in &tpl.parts {
        if let Some(entry) = template_part_override(name) {
            overrides.push(entry);
        }
    }
    overrides.push(override_entry(
        "/ppt/notesMasters/notesMaster1.xml",
        "application/vnd.openxmlformats-officedocument.presentationml.notesMaster+xml",
    ));
    for num in 1..=slides.len() + 1 {
        overrides.push(override_entry(
            &format!("/ppt/slides/slide{}.xml", num),
            "application/vnd.openxmlformats-officedocument.presentationml.slide+xml",
        ));
    }
    let notes_total = slides.iter().filter(|slide| slide.notes.is_some()).count();
    for num in 1..=notes_total {
        overrides.push(override_entry(
            &format!("/ppt/notesSlides/notesSlide{}.xml", num),
            "application/vnd.openxmlformats-officedocument.presentationml.notesSlide+xml",
        ));
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="xml" ContentType="application/xml"/>
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Default Extension="jpeg" ContentType="image/jpeg"/>
    <Default Extension="jpg" ContentType="image/jpeg"/>
    <Default Extension="png" ContentType="image/png"/>
    <Default Extension="gif" ContentType="image/gif"/>
    <Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>
    <Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
    <Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>
{overrides}
</Types>"#,
        overrides = overrides.join("\n")
    )
}

fn template_part_override(name: &str) -> Option<String> {
    if !name.ends_with(".xml") {
        return None;
    }
    let content_type = if name.starts_with("ppt/slideMasters/") {
        "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"
    } else if name.starts_with("ppt/slideLayouts/") {
        "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"
    } else if name.starts_with("ppt/theme/") {
        "application/vnd.openxmlformats-officedocument.theme+xml"
    } else {
        return None;
    };
    Some(override_entry(&format!("/{}", name), content_type))
}

fn override_entry(part_name: &str, content_type: &str) -> String {
    format!(
        r#"    <Override PartName="{}" ContentType="{}"/>"#,
        part_name, content_type
    )
}

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/>
    <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
    <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/>
</Relationships>"#;

fn app_xml(total_slides: usize) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">
    <Application>decksmith</Application>
    <Slides>{}</Slides>
</Properties>"#,
        total_slides
    )
}

fn core_xml(title: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
    <dc:title>{}</dc:title>
    <dc:creator>decksmith</dc:creator>
    <dcterms:created xsi:type="dcterms:W3CDTF">{}</dcterms:created>
    <cp:revision>1</cp:revision>
</cp:coreProperties>"#,
        escape(title),
        chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ")
    )
}

fn presentation_xml(total_slides: usize, slide_size: (u64, u64)) -> String {
    let slide_ids = (1..=total_slides)
        .map(|num| {
            format!(
                r#"        <p:sldId id="{}" r:id="rId{}"/>"#,
                255 + num,
                num + 2
            )
        })
        .collect::<Vec<String>>()
        .join("\n");

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
    <p:sldMasterIdLst>
        <p:sldMasterId id="2147483648" r:id="rId1"/>
    </p:sldMasterIdLst>
    <p:notesMasterIdLst>
        <p:notesMasterId r:id="rId2"/>
    </p:notesMasterIdLst>
    <p:sldIdLst>
{slide_ids}
    </p:sldIdLst>
    <p:sldSz cx="{cx}" cy="{cy}"/>
    <p:notesSz cx="6858000" cy="9144000"/>
</p:presentation>"#,
        slide_ids = slide_ids,
        cx = slide_size.0,
        cy = slide_size.1
    )
}

fn presentation_rels_xml(total_slides: usize) -> String {
    let mut rels = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="slideMasters/slideMaster1.xml"/>
    <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesMaster" Target="notesMasters/notesMaster1.xml"/>
"#,
    );

    for num in 1..=total_slides {
        rels.push_str(&format!(
            r#"    <Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide{}.xml"/>"#,
            num + 2,
            num
        ));
        rels.push('\n');
    }

    rels.push_str("</Relationships>");
    rels
}

fn title_slide_xml(title: &str, subtitle: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
    <p:cSld>
        <p:spTree>
            <p:nvGrpSpPr>
                <p:cNvPr id="1" name=""/>
                <p:cNvGrpSpPr/>
                <p:nvPr/>
            </p:nvGrpSpPr>
            <p:grpSpPr>
                <a:xfrm>
                    <a:off x="0" y="0"/>
                    <a:ext cx="0" cy="0"/>
                    <a:chOff x="0" y="0"/>
                    <a:chExt cx="0" cy="0"/>
                </a:xfrm>
            </p:grpSpPr>
            <p:sp>
                <p:nvSpPr>
                    <p:cNvPr id="2" name="Title 1"/>
                    <p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr>
                    <p:nvPr><p:ph type="ctrTitle"/></p:nvPr>
                </p:nvSpPr>
                <p:spPr/>
                <p:txBody>
                    <a:bodyPr/>
                    <a:lstStyle/>
                    <a:p><a:r><a:t>{title}</a:t></a:r></a:p>
                </p:txBody>
            </p:sp>
            <p:sp>
                <p:nvSpPr>
                    <p:cNvPr id="3" name="Subtitle 2"/>
                    <p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr>
                    <p:nvPr><p:ph type="subTitle" idx="1"/></p:nvPr>
                </p:nvSpPr>
                <p:spPr/>
                <p:txBody>
                    <a:bodyPr/>
                    <a:lstStyle/>
                    <a:p><a:r><a:t>{subtitle}</a:t></a:r></a:p>
                </p:txBody>
            </p:sp>
        </p:spTree>
    </p:cSld>
    <p:clrMapOvr>
        <a:masterClrMapping/>
    </p:clrMapOvr>
</p:sld>"#,
        title = escape(title),
        subtitle = escape(subtitle)
    )
}

const TITLE_SLIDE_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/>
</Relationships>"#;

fn content_slide_xml(slide: &RenderSlide, slide_size: (u64, u64)) -> String {
    let title_run = text_run(&slide.title, &slide.theme);

    let bullet_paragraphs = if slide.bullets.is_empty() {
        "<a:p/>".to_string()
    } else {
        slide
            .bullets
            .iter()
            .map(|line| format!("<a:p>{}</a:p>", text_run(line, &slide.theme)))
            .collect::<Vec<String>>()
            .join("\n                    ")
    };

    let (body_props, picture) = match slide.image {
        Some(_) => {
            let geom = split_geometry(slide_size);
            (
                format!(
                    r#"<p:spPr>
                    <a:xfrm>
                        <a:off x="{}" y="{}"/>
                        <a:ext cx="{}" cy="{}"/>
                    </a:xfrm>
                </p:spPr>"#,
                    geom.body.0, geom.body.1, geom.body.2, geom.body.3
                ),
                format!(
                    r#"
            <p:pic>
                <p:nvPicPr>
                    <p:cNvPr id="4" name="Illustration 3"/>
                    <p:cNvPicPr>
                        <a:picLocks noChangeAspect="1"/>
                    </p:cNvPicPr>
                    <p:nvPr/>
                </p:nvPicPr>
                <p:blipFill>
                    <a:blip r:embed="rId2"/>
                    <a:stretch>
                        <a:fillRect/>
                    </a:stretch>
                </p:blipFill>
                <p:spPr>
                    <a:xfrm>
                        <a:off x="{}" y="{}"/>
                        <a:ext cx="{}" cy="{}"/>
                    </a:xfrm>
                    <a:prstGeom prst="rect">
                        <a:avLst/>
                    </a:prstGeom>
                </p:spPr>
            </p:pic>"#,
                    geom.picture.0, geom.picture.1, geom.picture.2, geom.picture.3
                ),
            )
        }
        None => ("<p:spPr/>".to_string(), String::new()),
    };

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
    <p:cSld>
        <p:spTree>
            <p:nvGrpSpPr>
                <p:cNvPr id="1" name=""/>
                <p:cNvGrpSpPr/>
                <p:nvPr/>
            </p:nvGrpSpPr>
            <p:grpSpPr>
                <a:xfrm>
                    <a:off x="0" y="0"/>
                    <a:ext cx="0" cy="0"/>
                    <a:chOff x="0" y="0"/>
                    <a:chExt cx="0" cy="0"/>
                </a:xfrm>
            </p:grpSpPr>
            <p:sp>
                <p:nvSpPr>
                    <p:cNvPr id="2" name="Title 1"/>
                    <p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr>
                    <p:nvPr><p:ph type="title"/></p:nvPr>
                </p:nvSpPr>
                <p:spPr/>
                <p:txBody>
                    <a:bodyPr/>
                    <a:lstStyle/>
                    <a:p>{title_run}</a:p>
                </p:txBody>
            </p:sp>
            <p:sp>
                <p:nvSpPr>
                    <p:cNvPr id="3" name="Body 2"/>
                    <p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr>
                    <p:nvPr><p:ph type="body" idx="1"/></p:nvPr>
                </p:nvSpPr>
                {body_props}
                <p:txBody>
                    <a:bodyPr/>
                    <a:lstStyle/>
                    {bullet_paragraphs}
                </p:txBody>
            </p:sp>{picture}
        </p:spTree>
    </p:cSld>
    <p:clrMapOvr>
        <a:masterClrMapping/>
    </p:clrMapOvr>
</p:sld>"#,
        title_run = title_run,
        body_props = body_props,
        bullet_paragraphs = bullet_paragraphs,
        picture = picture
    )
}

/// Builds a text run, applying the slide theme's font and color overrides
/// when present.
fn text_run(text: &str, theme: &SlideTheme) -> String {
    let mut props = String::new();
    if let Some(color) = &theme.color {
        props.push_str(&format!(
            r#"<a:solidFill><a:srgbClr val="{}"/></a:solidFill>"#,
            color
        ));
    }
    if let Some(font) = &theme.font {
        props.push_str(&format!(r#"<a:latin typeface="{}"/>"#, escape(font)));
    }

    if props.is_empty() {
        format!("<a:r><a:t>{}</a:t></a:r>", escape(text))
    } else {
        format!(
            r#"<a:r><a:rPr lang="en-US">{}</a:rPr><a:t>{}</a:t></a:r>"#,
            props,
            escape(text)
        )
    }
}

/// Shape geometry for a slide that carries a picture: the body placeholder
/// keeps the left portion and the picture fills the rest.
struct SplitGeometry {
    body: (u64, u64, u64, u64),
    picture: (u64, u64, u64, u64),
}

fn split_geometry(slide_size: (u64, u64)) -> SplitGeometry {
    let (slide_cx, slide_cy) = slide_size;
    let full_width = slide_cx.saturating_sub(2 * MARGIN_EMU);
    let height = slide_cy.saturating_sub(BODY_TOP_EMU + MARGIN_EMU);

    let body_width = full_width * 11 / 20;
    let gutter = 114300;
    let picture_left = MARGIN_EMU + body_width + gutter;
    let picture_width = slide_cx.saturating_sub(picture_left + MARGIN_EMU);

    SplitGeometry {
        body: (MARGIN_EMU, BODY_TOP_EMU, body_width, height),
        picture: (picture_left, BODY_TOP_EMU, picture_width, height),
    }
}

fn content_slide_rels_xml(media_name: Option<&str>, notes_num: Option<usize>) -> String {
    let mut rels = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout2.xml"/>
"#,
    );

    if let Some(name) = media_name {
        rels.push_str(&format!(
            r#"    <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/{}"/>"#,
            name
        ));
        rels.push('\n');
    }

    if let Some(num) = notes_num {
        rels.push_str(&format!(
            r#"    <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesSlide" Target="../notesSlides/notesSlide{}.xml"/>"#,
            num
        ));
        rels.push('\n');
    }

    rels.push_str("</Relationships>");
    rels
}

const NOTES_MASTER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:notesMaster xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
    <p:cSld>
        <p:spTree>
            <p:nvGrpSpPr>
                <p:cNvPr id="1" name=""/>
                <p:cNvGrpSpPr/>
                <p:nvPr/>
            </p:nvGrpSpPr>
            <p:grpSpPr>
                <a:xfrm>
                    <a:off x="0" y="0"/>
                    <a:ext cx="0" cy="0"/>
                    <a:chOff x="0" y="0"/>
                    <a:chExt cx="0" cy="0"/>
                </a:xfrm>
            </p:grpSpPr>
        </p:spTree>
    </p:cSld>
    <p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>
</p:notesMaster>"#;

const NOTES_MASTER_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme" Target="../theme/theme1.xml"/>
</Relationships>"#;

fn notes_slide_xml(notes: &str) -> String {
    let paragraphs = notes
        .lines()
        .map(|line| {
            format!(
                "<a:p><a:r><a:t>{}</a:t></a:r></a:p>",
                escape(line.trim_end_matches('\r'))
            )
        })
        .collect::<Vec<String>>()
        .join("\n                    ");

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:notes xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
    <p:cSld>
        <p:spTree>
            <p:nvGrpSpPr>
                <p:cNvPr id="1" name=""/>
                <p:cNvGrpSpPr/>
                <p:nvPr/>
            </p:nvGrpSpPr>
            <p:grpSpPr>
                <a:xfrm>
                    <a:off x="0" y="0"/>
                    <a:ext cx="0" cy="0"/>
                    <a:chOff x="0" y="0"/>
                    <a:chExt cx="0" cy="0"/>
                </a:xfrm>
            </p:grpSpPr>
            <p:sp>
                <p:nvSpPr>
                    <p:cNvPr id="2" name="Notes Placeholder 1"/>
                    <p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr>
                    <p:nvPr><p:ph type="body" idx="1"/></p:nvPr>
                </p:nvSpPr>
                <p:spPr/>
                <p:txBody>
                    <a:bodyPr/>
                    <a:lstStyle/>
                    {paragraphs}
                </p:txBody>
            </p:sp>
        </p:spTree>
    </p:cSld>
    <p:clrMapOvr>
        <a:masterClrMapping/>
    </p:clrMapOvr>
</p:notes>"#,
        paragraphs = paragraphs
    )
}

fn notes_slide_rels_xml(slide_num: usize) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesMaster" Target="../notesMasters/notesMaster1.xml"/>
    <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="../slides/slide{}.xml"/>
</Relationships>"#,
        slide_num
    )
}
