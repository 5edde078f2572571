//! SVG minification and the color-immutable marker.
//!
//! The minifier is a single streaming pass over the document with
//! `quick-xml`. It strips content that does not affect rendering and never
//! touches `viewBox`, so pictograms keep scaling correctly.

use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use thiserror::Error;

/// Class added to the root of pictograms that consumers must not recolor.
pub const COLOR_IMMUTABLE_CLASS: &str = "color-immutable";

/// Elements removed together with their content.
const DROPPED_ELEMENTS: [&[u8]; 3] = [b"metadata", b"title", b"desc"];

/// Containers removed when they end up with neither attributes nor children.
const COLLAPSIBLE_CONTAINERS: [&[u8]; 2] = [b"g", b"defs"];

/// Elements whose character data is rendered, so whitespace inside is kept.
const TEXT_CONTENT_ELEMENTS: [&[u8]; 3] = [b"text", b"tspan", b"textPath"];

/// Editor namespaces whose attributes and declarations are stripped.
const EDITOR_NAMESPACES: [&[u8]; 3] = [b"inkscape", b"sodipodi", b"sketch"];

#[derive(Error, Debug)]
pub enum MinifyError {
    #[error("Malformed SVG at byte {position}: {message}")]
    Malformed { position: u64, message: String },

    #[error("Root element is '{0}', expected 'svg'")]
    NotSvg(String),

    #[error("Document has no root element")]
    Empty,

    #[error("Document ended before all elements were closed")]
    Truncated,

    #[error("Failed to write SVG: {0}")]
    Write(String),
}

/// Minifies an SVG document.
///
/// Removes declarations, comments, doctype, `<metadata>`, `<title>` and
/// `<desc>`, editor namespace attributes, whitespace-only text and empty
/// attribute-less `<g>`/`<defs>`. Childless elements are written
/// self-closing.
///
/// # Errors
///
/// Returns [`MinifyError`] if the document is not well-formed XML or its root
/// element is not `<svg>`.
pub fn minify_svg(content: &str) -> Result<String, MinifyError> {
    let mut reader = Reader::from_str(content);
    let mut writer = Writer::new(Vec::with_capacity(content.len()));

    // Start tag held back until we know whether the element has children
    let mut pending: Option<BytesStart<'static>> = None;
    let mut skip_depth = 0usize;
    let mut depth = 0usize;
    let mut text_depth = 0usize;
    let mut seen_root = false;

    loop {
        let event = reader.read_event().map_err(|e| MinifyError::Malformed {
            position: reader.buffer_position(),
            message: e.to_string(),
        })?;

        if skip_depth > 0 {
            match event {
                Event::Start(_) => skip_depth += 1,
                Event::End(_) => skip_depth -= 1,
                Event::Eof => return Err(MinifyError::Truncated),
                _ => {}
            }
            continue;
        }

        match event {
            Event::Decl(_) | Event::PI(_) | Event::DocType(_) | Event::Comment(_) => {}
            Event::Text(text) if text_depth == 0 && text.iter().all(u8::is_ascii_whitespace) => {}
            Event::Start(start) => {
                if is_dropped(&start) {
                    skip_depth = 1;
                    continue;
                }
                check_root(&start, &mut seen_root)?;
                flush(&mut writer, &mut pending)?;
                if is_text_content(start.local_name().as_ref()) {
                    text_depth += 1;
                }
                pending = Some(clean_start(&start)?);
                depth += 1;
            }
            Event::Empty(start) => {
                if is_dropped(&start) {
                    continue;
                }
                check_root(&start, &mut seen_root)?;
                flush(&mut writer, &mut pending)?;
                let start = clean_start(&start)?;
                if !is_collapsible(&start) {
                    write(&mut writer, Event::Empty(start))?;
                }
            }
            Event::End(end) => {
                depth = depth.checked_sub(1).ok_or(MinifyError::Truncated)?;
                if is_text_content(end.local_name().as_ref()) {
                    text_depth = text_depth.saturating_sub(1);
                }
                match pending.take() {
                    Some(start) if is_collapsible(&start) => {}
                    Some(start) => write(&mut writer, Event::Empty(start))?,
                    None => write(&mut writer, Event::End(end))?,
                }
            }
            Event::Eof => break,
            other => {
                flush(&mut writer, &mut pending)?;
                write(&mut writer, other)?;
            }
        }
    }

    if !seen_root {
        return Err(MinifyError::Empty);
    }
    if depth != 0 {
        return Err(MinifyError::Truncated);
    }

    String::from_utf8(writer.into_inner()).map_err(|e| MinifyError::Write(e.to_string()))
}

/// Adds [`COLOR_IMMUTABLE_CLASS`] to the root `<svg>` tag.
///
/// An existing `class` attribute gets the marker prepended to its value.
/// Content without an `<svg` tag is returned unchanged.
pub fn mark_color_immutable(svg: &str) -> String {
    let Some(tag_start) = svg.find("<svg") else {
        return svg.to_string();
    };
    let tag_end = svg[tag_start..]
        .find('>')
        .map_or(svg.len(), |i| tag_start + i);

    const CLASS_ATTR: &str = " class=\"";
    match svg[tag_start..tag_end].find(CLASS_ATTR) {
        Some(offset) => {
            let at = tag_start + offset + CLASS_ATTR.len();
            format!("{}{} {}", &svg[..at], COLOR_IMMUTABLE_CLASS, &svg[at..])
        }
        None => {
            let at = tag_start + "<svg".len();
            format!(
                "{} class=\"{}\"{}",
                &svg[..at],
                COLOR_IMMUTABLE_CLASS,
                &svg[at..]
            )
        }
    }
}

fn is_dropped(start: &BytesStart<'_>) -> bool {
    DROPPED_ELEMENTS.contains(&start.local_name().as_ref())
}

fn is_text_content(local_name: &[u8]) -> bool {
    TEXT_CONTENT_ELEMENTS.contains(&local_name)
}

fn is_collapsible(start: &BytesStart<'_>) -> bool {
    COLLAPSIBLE_CONTAINERS.contains(&start.local_name().as_ref())
        && start.attributes().next().is_none()
}

fn is_editor_attribute(key: &[u8]) -> bool {
    let key = key.strip_prefix(b"xmlns:").unwrap_or(key);
    let prefix = key.split(|&b| b == b':').next().unwrap_or(key);
    EDITOR_NAMESPACES.contains(&prefix)
}

fn check_root(start: &BytesStart<'_>, seen_root: &mut bool) -> Result<(), MinifyError> {
    if *seen_root {
        return Ok(());
    }
    *seen_root = true;
    if start.local_name().as_ref() == b"svg" {
        Ok(())
    } else {
        Err(MinifyError::NotSvg(
            String::from_utf8_lossy(start.name().as_ref()).into_owned(),
        ))
    }
}

/// Rebuilds a start tag without editor attributes and with single spaces
/// between attributes.
fn clean_start(start: &BytesStart<'_>) -> Result<BytesStart<'static>, MinifyError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut cleaned = BytesStart::new(name);

    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| MinifyError::Malformed {
            position: 0,
            message: e.to_string(),
        })?;
        if !is_editor_attribute(attribute.key.as_ref()) {
            cleaned.push_attribute(attribute);
        }
    }

    Ok(cleaned)
}

fn flush(
    writer: &mut Writer<Vec<u8>>,
    pending: &mut Option<BytesStart<'static>>,
) -> Result<(), MinifyError> {
    match pending.take() {
        Some(start) => write(writer, Event::Start(start)),
        None => Ok(()),
    }
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), MinifyError> {
    writer
        .write_event(event)
        .map_err(|e| MinifyError::Write(e.to_string()))
}
