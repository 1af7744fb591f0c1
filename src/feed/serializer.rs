//! RSS 2.0 output for the merged feed.

use std::borrow::Cow;
use std::io::Cursor;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::Deserialize;

use super::types::{ImageRef, NormalizedItem};

/// `pubDate` layout. RFC 2822 with a literal `GMT` zone, as HTTP dates are
/// written.
const HTTP_DATE: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Channel-level metadata for the published feed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChannelInfo {
    pub title: String,
    pub description: String,
    pub link: String,
}

impl Default for ChannelInfo {
    fn default() -> Self {
        Self {
            title: "Nigeria News Aggregator".to_string(),
            description: "Latest news from Nigerian sources".to_string(),
            link: "http://localhost:3000".to_string(),
        }
    }
}

/// Escapes the five XML-reserved characters. The apostrophe becomes
/// `&apos;`.
pub fn escape_xml(text: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(text)
}

/// Renders `items` as an RSS 2.0 document in the order given.
///
/// Items without a date get the current time. Items without an image get no
/// `<enclosure>`.
pub fn serialize(items: &[NormalizedItem], channel: &ChannelInfo) -> Result<String> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    let now = Utc::now();

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .context("Failed to write XML declaration")?;

    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    writer
        .write_event(Event::Start(rss))
        .context("Failed to write rss element")?;
    writer
        .write_event(Event::Start(BytesStart::new("channel")))
        .context("Failed to write channel element")?;

    write_text_element(&mut writer, "title", &channel.title)?;
    write_text_element(&mut writer, "description", &channel.description)?;
    write_text_element(&mut writer, "link", &channel.link)?;

    for item in items {
        write_item(&mut writer, item, now)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("channel")))
        .context("Failed to write channel end")?;
    writer
        .write_event(Event::End(BytesEnd::new("rss")))
        .context("Failed to write rss end")?;

    let result = writer.into_inner().into_inner();
    String::from_utf8(result).context("Generated feed contains invalid UTF-8")
}

fn write_item(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    item: &NormalizedItem,
    now: DateTime<Utc>,
) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new("item")))
        .context("Failed to write item element")?;

    write_text_element(writer, "title", &item.title)?;
    write_text_element(writer, "link", &item.link)?;
    write_cdata_element(writer, "description", item.display_description())?;

    let date = item.published.unwrap_or(now).format(HTTP_DATE).to_string();
    write_text_element(writer, "pubDate", &date)?;

    if let Some(image) = &item.image {
        write_enclosure(writer, image)?;
    }

    write_text_element(writer, "source", &item.source)?;

    writer
        .write_event(Event::End(BytesEnd::new("item")))
        .context("Failed to write item end")?;
    Ok(())
}

fn write_text_element(writer: &mut Writer<Cursor<Vec<u8>>>, name: &str, text: &str) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .with_context(|| format!("Failed to write {name} element"))?;
    writer
        .write_event(Event::Text(BytesText::from_escaped(escape_xml(text))))
        .with_context(|| format!("Failed to write {name} text"))?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .with_context(|| format!("Failed to write {name} end"))?;
    Ok(())
}

/// CDATA content is written verbatim. A `]]>` in the text would close the
/// section early, so the text is split there across adjacent sections.
fn write_cdata_element(writer: &mut Writer<Cursor<Vec<u8>>>, name: &str, text: &str) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .with_context(|| format!("Failed to write {name} element"))?;
    for section in cdata_sections(text) {
        writer
            .write_event(Event::CData(BytesCData::new(section)))
            .with_context(|| format!("Failed to write {name} CDATA"))?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .with_context(|| format!("Failed to write {name} end"))?;
    Ok(())
}

/// `"a]]>b"` becomes `["a]]", ">b"]`.
fn cdata_sections(text: &str) -> Vec<&str> {
    let mut sections = Vec::new();
    let mut rest = text;
    while let Some(pos) = rest.find("]]>") {
        sections.push(&rest[..pos + 2]);
        rest = &rest[pos + 2..];
    }
    sections.push(rest);
    sections
}

fn write_enclosure(writer: &mut Writer<Cursor<Vec<u8>>>, image: &ImageRef) -> Result<()> {
    let length = image.length.unwrap_or(0).to_string();
    let url = escape_xml(&image.url);
    let mime_type = escape_xml(&image.mime_type);

    let mut enclosure = BytesStart::new("enclosure");
    enclosure.push_attribute(Attribute::from(("url".as_bytes(), url.as_bytes())));
    enclosure.push_attribute(Attribute::from(("length".as_bytes(), length.as_bytes())));
    enclosure.push_attribute(Attribute::from(("type".as_bytes(), mime_type.as_bytes())));

    writer
        .write_event(Event::Empty(enclosure))
        .context("Failed to write enclosure element")?;
    Ok(())
}
