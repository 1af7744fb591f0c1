//! Picks a representative image for a feed entry.
//!
//! Structured media (RSS `<enclosure>`, `media:content`, `media:thumbnail`)
//! wins. Failing that, the entry's HTML is scanned for the first `<img>`.

use std::sync::LazyLock;

use feed_rs::model::Entry;
use regex::Regex;

use super::types::ImageRef;
use crate::util::decode_entities;

/// Finds the first image reference in a chunk of markup.
///
/// The resolver only depends on this trait, so the regex scanner can be
/// swapped for a real HTML parser without touching the pipeline.
pub trait ImageExtractor: Send + Sync {
    fn first_image(&self, html: &str) -> Option<String>;
}

/// Matches the `src` attribute of the first `<img>` tag, case-insensitive,
/// single or double quoted. Lazy-loading attributes like `data-src` are not
/// `src` and are skipped.
static IMG_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<img\b[^>]*?\ssrc\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("static regex is valid")
});

/// Default [`ImageExtractor`] backed by a regular expression.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegexImageExtractor;

impl ImageExtractor for RegexImageExtractor {
    fn first_image(&self, html: &str) -> Option<String> {
        IMG_SRC
            .captures_iter(html)
            .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
            .map(|m| decode_entities(m.as_str().trim()).into_owned())
            .find(|src| !src.is_empty())
    }
}

/// Resolves the image for `entry`, or `None` if it has none.
pub fn resolve_image(entry: &Entry, extractor: &dyn ImageExtractor) -> Option<ImageRef> {
    structured_image(entry)
        .or_else(|| thumbnail_image(entry))
        .or_else(|| extracted_image(entry, extractor))
}

/// Enclosure or `media:content` with an image (or undeclared) type.
fn structured_image(entry: &Entry) -> Option<ImageRef> {
    entry
        .media
        .iter()
        .flat_map(|media| media.content.iter())
        .find_map(|content| {
            let url = content.url.as_ref()?.to_string();
            let declared = content.content_type.as_ref().map(|m| m.to_string());
            if declared.as_deref().is_some_and(|m| !m.starts_with("image/")) {
                return None;
            }
            let mime_type = declared.unwrap_or_else(|| guess_mime_type(&url).to_string());
            Some(ImageRef {
                url,
                length: content.size,
                mime_type,
            })
        })
}

fn thumbnail_image(entry: &Entry) -> Option<ImageRef> {
    entry
        .media
        .iter()
        .flat_map(|media| media.thumbnails.iter())
        .map(|thumb| thumb.image.uri.trim())
        .find(|uri| !uri.is_empty())
        .map(|uri| ImageRef {
            url: uri.to_string(),
            length: None,
            mime_type: guess_mime_type(uri).to_string(),
        })
}

/// Scans full content first, then the summary.
fn extracted_image(entry: &Entry, extractor: &dyn ImageExtractor) -> Option<ImageRef> {
    let content = entry.content.as_ref().and_then(|c| c.body.as_deref());
    let summary = entry.summary.as_ref().map(|s| s.content.as_str());

    [content, summary]
        .into_iter()
        .flatten()
        .find_map(|html| extractor.first_image(html))
        .map(|url| ImageRef {
            mime_type: guess_mime_type(&url).to_string(),
            length: None,
            url,
        })
}

/// Guesses an image MIME type from the URL path's extension.
pub fn guess_mime_type(url: &str) -> &'static str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let ext = path
        .rsplit('/')
        .next()
        .and_then(|file| file.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase());

    match ext.as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("avif") => "image/avif",
        Some("bmp") => "image/bmp",
        _ => "image/jpeg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_entry(xml: &str) -> Entry {
        let feed = feed_rs::parser::parse(xml.as_bytes()).unwrap();
        feed.entries.into_iter().next().unwrap()
    }

    #[test]
    fn extracts_double_and_single_quoted_src() {
        let ex = RegexImageExtractor;
        assert_eq!(
            ex.first_image(r#"<p>hi</p><img class="x" src="https://a.test/1.jpg">"#).as_deref(),
            Some("https://a.test/1.jpg")
        );
        assert_eq!(
            ex.first_image("<IMG SRC='https://a.test/2.png' />").as_deref(),
            Some("https://a.test/2.png")
        );
    }

    #[test]
    fn extraction_takes_first_image_and_skips_data_src() {
        let ex = RegexImageExtractor;
        let html = r#"<img data-src="lazy.jpg" src="real.jpg"><img src="second.jpg">"#;
        assert_eq!(ex.first_image(html).as_deref(), Some("real.jpg"));
    }

    #[test]
    fn extraction_decodes_entities_in_src() {
        let ex = RegexImageExtractor;
        let html = r#"<img src="https://a.test/i.jpg?w=1&amp;h=2">"#;
        assert_eq!(
            ex.first_image(html).as_deref(),
            Some("https://a.test/i.jpg?w=1&h=2")
        );
    }

    #[test]
    fn extraction_without_img_is_none() {
        assert_eq!(RegexImageExtractor.first_image("<p>no pictures</p>"), None);
        assert_eq!(RegexImageExtractor.first_image("<img alt=\"x\">"), None);
    }

    #[test]
    fn guesses_mime_from_extension() {
        assert_eq!(guess_mime_type("https://a.test/x.PNG"), "image/png");
        assert_eq!(guess_mime_type("https://a.test/x.webp?w=300"), "image/webp");
        assert_eq!(guess_mime_type("https://a.test/image"), "image/jpeg");
        assert_eq!(guess_mime_type("https://cdn.a.test/photo"), "image/jpeg");
    }

    #[test]
    fn enclosure_wins_over_html() {
        let entry = first_entry(
            r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>t</title>
  <item>
    <title>With enclosure</title>
    <link>https://a.test/1</link>
    <description><![CDATA[<img src="https://a.test/inline.jpg">]]></description>
    <enclosure url="https://a.test/enc.png" length="1234" type="image/png"/>
  </item>
</channel></rss>"#,
        );

        let image = resolve_image(&entry, &RegexImageExtractor).unwrap();
        assert_eq!(image.url, "https://a.test/enc.png");
        assert_eq!(image.length, Some(1234));
        assert_eq!(image.mime_type, "image/png");
    }

    #[test]
    fn audio_enclosure_falls_back_to_html() {
        let entry = first_entry(
            r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>t</title>
  <item>
    <title>Podcast</title>
    <link>https://a.test/ep</link>
    <description><![CDATA[<p>Show notes <img src="https://a.test/cover.gif"></p>]]></description>
    <enclosure url="https://a.test/ep.mp3" length="99" type="audio/mpeg"/>
  </item>
</channel></rss>"#,
        );

        let image = resolve_image(&entry, &RegexImageExtractor).unwrap();
        assert_eq!(image.url, "https://a.test/cover.gif");
        assert_eq!(image.length, None);
        assert_eq!(image.mime_type, "image/gif");
    }

    #[test]
    fn full_content_preferred_over_summary() {
        let entry = first_entry(
            r#"<?xml version="1.0"?>
<rss version="2.0" xmlns:content="http://purl.org/rss/1.0/modules/content/"><channel><title>t</title>
  <item>
    <title>Both bodies</title>
    <link>https://a.test/2</link>
    <description><![CDATA[<img src="https://a.test/summary.jpg">]]></description>
    <content:encoded><![CDATA[<img src="https://a.test/content.jpg">]]></content:encoded>
  </item>
</channel></rss>"#,
        );

        let image = resolve_image(&entry, &RegexImageExtractor).unwrap();
        assert_eq!(image.url, "https://a.test/content.jpg");
    }

    #[test]
    fn no_image_anywhere_is_none() {
        let entry = first_entry(
            r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>t</title>
  <item><title>Plain</title><link>https://a.test/3</link><description>Just text</description></item>
</channel></rss>"#,
        );

        assert_eq!(resolve_image(&entry, &RegexImageExtractor), None);
    }

    struct FixedExtractor;

    impl ImageExtractor for FixedExtractor {
        fn first_image(&self, _html: &str) -> Option<String> {
            Some("https://a.test/fixed.svg".to_string())
        }
    }

    #[test]
    fn resolver_uses_injected_extractor() {
        let entry = first_entry(
            r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>t</title>
  <item><title>x</title><link>https://a.test/4</link><description>text</description></item>
</channel></rss>"#,
        );

        let image = resolve_image(&entry, &FixedExtractor).unwrap();
        assert_eq!(image.url, "https://a.test/fixed.svg");
        assert_eq!(image.mime_type, "image/svg+xml");
    }
}
