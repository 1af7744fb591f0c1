//! Parses the merged RSS document served by `/api/feed`.

use chrono::{DateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::ClientError;
use crate::feed::{ImageRef, NormalizedItem};

/// Source name for items that carry no `<source>` element.
pub const UNKNOWN_SOURCE: &str = "Unknown";

/// Item child elements we read. Anything else inside `<item>` is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    Description,
    PubDate,
    Source,
}

impl Field {
    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"title" => Some(Self::Title),
            b"link" => Some(Self::Link),
            b"description" => Some(Self::Description),
            b"pubDate" => Some(Self::PubDate),
            b"source" => Some(Self::Source),
            _ => None,
        }
    }
}

#[derive(Default)]
struct ItemBuilder {
    title: String,
    link: String,
    description: String,
    pub_date: String,
    source: String,
    image: Option<ImageRef>,
}

impl ItemBuilder {
    fn push(&mut self, field: Field, text: &str) {
        let target = match field {
            Field::Title => &mut self.title,
            Field::Link => &mut self.link,
            Field::Description => &mut self.description,
            Field::PubDate => &mut self.pub_date,
            Field::Source => &mut self.source,
        };
        target.push_str(text);
    }

    fn build(self) -> NormalizedItem {
        let source = self.source.trim();
        NormalizedItem {
            title: self.title.trim().to_string(),
            link: self.link.trim().to_string(),
            description: self.description.trim().to_string(),
            snippet: None,
            published: parse_date(&self.pub_date),
            image: self.image,
            source: if source.is_empty() {
                UNKNOWN_SOURCE.to_string()
            } else {
                source.to_string()
            },
        }
    }
}

/// Parses an RFC 2822 date. Anything else is `None`; dates are never
/// invented on this side.
pub fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc2822(text)
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

/// Reads every `<item>` in document order.
///
/// Absent elements default (empty strings, no date, no image, source
/// [`UNKNOWN_SOURCE`]). A document that is not well-formed XML, or has no
/// `<channel>`, is a [`ClientError::Parse`].
pub fn parse_document(xml: &str) -> Result<Vec<NormalizedItem>, ClientError> {
    let mut reader = Reader::from_str(xml);

    let mut items = Vec::new();
    let mut buf = Vec::new();
    let mut saw_channel = false;
    let mut current: Option<ItemBuilder> = None;
    let mut field: Option<Field> = None;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| ClientError::Parse(e.to_string()))?;
        match event {
            Event::Start(e) => match e.name().as_ref() {
                b"channel" => saw_channel = true,
                b"item" => current = Some(ItemBuilder::default()),
                b"enclosure" => read_enclosure(&e, &reader, current.as_mut()),
                name => {
                    if current.is_some() && field.is_none() {
                        field = Field::from_name(name);
                    }
                }
            },
            Event::Empty(e) if e.name().as_ref() == b"enclosure" => {
                read_enclosure(&e, &reader, current.as_mut());
            }
            Event::End(e) => match e.name().as_ref() {
                b"item" => {
                    if let Some(builder) = current.take() {
                        items.push(builder.build());
                    }
                    field = None;
                }
                name => {
                    if field.is_some() && Field::from_name(name) == field {
                        field = None;
                    }
                }
            },
            Event::Text(e) => {
                if let (Some(item), Some(f)) = (current.as_mut(), field) {
                    let text = e.unescape().map_err(|e| ClientError::Parse(e.to_string()))?;
                    item.push(f, &text);
                }
            }
            Event::CData(e) => {
                if let (Some(item), Some(f)) = (current.as_mut(), field) {
                    let text = reader
                        .decoder()
                        .decode(&e)
                        .map_err(|e| ClientError::Parse(e.to_string()))?;
                    item.push(f, &text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !saw_channel {
        return Err(ClientError::Parse("document has no <channel> element".to_string()));
    }

    Ok(items)
}

/// Records the first image enclosure of the current item. Malformed
/// attributes are skipped.
fn read_enclosure(e: &BytesStart<'_>, reader: &Reader<&[u8]>, item: Option<&mut ItemBuilder>) {
    let Some(item) = item else { return };
    if item.image.is_some() {
        return;
    }

    let mut url = None;
    let mut length = None;
    let mut mime_type = None;
    for attr in e.attributes().flatten() {
        let Ok(value) = attr.decode_and_unescape_value(reader.decoder()) else {
            continue;
        };
        match attr.key.as_ref() {
            b"url" => url = Some(value.trim().to_string()),
            b"length" => length = value.trim().parse::<u64>().ok(),
            b"type" => mime_type = Some(value.trim().to_string()),
            _ => {}
        }
    }

    let Some(url) = url.filter(|u| !u.is_empty()) else {
        return;
    };
    let mime_type = mime_type.unwrap_or_default();
    if !mime_type.is_empty() && !mime_type.starts_with("image/") {
        return;
    }
    item.image = Some(ImageRef {
        url,
        length: length.filter(|&n| n > 0),
        mime_type,
    });
}
