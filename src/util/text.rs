use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

static SCRIPT_OR_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b.*?</script\s*>|<style\b.*?</style\s*>")
        .expect("static regex is valid")
});
static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("static regex is valid"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("static regex is valid"));

/// Display width of a string in terminal columns.
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

const ELLIPSIS: &str = "...";
const ELLIPSIS_WIDTH: usize = 3;

/// Truncates `s` to at most `max_width` terminal columns, appending "..."
/// when text was cut.
///
/// Widths of 3 or less have no room for an ellipsis and return the prefix
/// that fits. Returns `Cow::Borrowed` when nothing was cut.
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if display_width(s) <= max_width {
        return Cow::Borrowed(s);
    }

    let budget = if max_width <= ELLIPSIS_WIDTH {
        max_width
    } else {
        max_width - ELLIPSIS_WIDTH
    };

    let mut width = 0;
    let mut cut = 0;
    for (idx, c) in s.char_indices() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if width + w > budget {
            break;
        }
        width += w;
        cut = idx + c.len_utf8();
    }

    if max_width <= ELLIPSIS_WIDTH {
        Cow::Owned(s[..cut].to_string())
    } else {
        Cow::Owned(format!("{}{}", &s[..cut], ELLIPSIS))
    }
}

/// Strip terminal control characters and ANSI escape sequences.
///
/// Feed text is attacker-controlled and ends up on the terminal. Tab,
/// newline and carriage return survive; CSI (`ESC [ ... final`) and OSC
/// (`ESC ] ... BEL|ST`) sequences are removed whole.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    let is_control = |c: char| c == '\x1b' || c == '\x7f' || (c < ' ' && !matches!(c, '\t' | '\n' | '\r'));

    if !s.chars().any(is_control) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\x1b' {
            if !is_control(c) {
                out.push(c);
            }
            continue;
        }
        match chars.peek() {
            Some('[') => {
                chars.next();
                for c in chars.by_ref() {
                    if ('\x40'..='\x7e').contains(&c) {
                        break;
                    }
                }
            }
            Some(']') => {
                chars.next();
                while let Some(c) = chars.next() {
                    if c == '\x07' {
                        break;
                    }
                    if c == '\x1b' && chars.peek() == Some(&'\\') {
                        chars.next();
                        break;
                    }
                }
            }
            _ => {}
        }
    }

    Cow::Owned(out)
}

/// Reduces an HTML fragment to a single line of plain text.
///
/// Drops `<script>`/`<style>` blocks and all tags, decodes character
/// references, and collapses whitespace. Returns `None` when no text is left.
pub fn html_to_snippet(html: &str) -> Option<String> {
    let without_code = SCRIPT_OR_STYLE.replace_all(html, " ");
    let without_tags = TAG.replace_all(&without_code, " ");
    let decoded = decode_entities(&without_tags);
    let collapsed = WHITESPACE.replace_all(&decoded, " ");
    let text = collapsed.trim();

    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Decodes HTML character references, numeric and named. Unknown names are
/// left untouched.
pub fn decode_entities(s: &str) -> Cow<'_, str> {
    html_escape::decode_html_entities(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_leaves_short_text_borrowed() {
        let result = truncate_to_width("Short", 10);
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result, "Short");
        assert_eq!(truncate_to_width("12345", 5), "12345");
    }

    #[test]
    fn truncate_appends_ellipsis() {
        assert_eq!(truncate_to_width("Hello World", 8), "Hello...");
        assert_eq!(truncate_to_width("Testing", 4), "T...");
    }

    #[test]
    fn truncate_counts_wide_chars() {
        // Each CJK char is two columns.
        assert_eq!(truncate_to_width("日本語テキスト", 7), "日本...");
        assert_eq!(truncate_to_width("日本", 1), "");
    }

    #[test]
    fn truncate_narrow_widths_skip_ellipsis() {
        assert_eq!(truncate_to_width("Test", 0), "");
        assert_eq!(truncate_to_width("Test", 1), "T");
        assert_eq!(truncate_to_width("Test", 3), "Tes");
    }

    #[test]
    fn strip_keeps_clean_text_borrowed() {
        let input = "line1\nline2\ttabbed\r\n";
        assert!(matches!(strip_control_chars(input), Cow::Borrowed(_)));
    }

    #[test]
    fn strip_removes_ansi_and_controls() {
        assert_eq!(strip_control_chars("\x1b[31mRed\x1b[0m"), "Red");
        assert_eq!(strip_control_chars("\x1b]0;title\x07safe"), "safe");
        assert_eq!(strip_control_chars("\x1b]0;title\x1b\\safe"), "safe");
        assert_eq!(strip_control_chars("he\x00ll\x07o\x7f"), "hello");
        assert_eq!(strip_control_chars("bare\x1besc"), "bareesc");
    }

    #[test]
    fn snippet_strips_tags_and_collapses_whitespace() {
        let html = "<p>Hello <b>world</b></p>\n\n<p>again</p>";
        assert_eq!(html_to_snippet(html).as_deref(), Some("Hello world again"));
    }

    #[test]
    fn snippet_drops_scripts_and_decodes_entities() {
        let html = "<script>alert('x')</script>Fish &amp; chips &#8211; &quot;hot&quot;";
        assert_eq!(
            html_to_snippet(html).as_deref(),
            Some("Fish & chips \u{2013} \"hot\"")
        );
    }

    #[test]
    fn snippet_of_markup_only_is_none() {
        assert_eq!(html_to_snippet("<img src=\"a.jpg\"/>  <br>"), None);
        assert_eq!(html_to_snippet(""), None);
    }

    #[test]
    fn decode_leaves_unknown_entities() {
        assert_eq!(decode_entities("a &bogus; b"), "a &bogus; b");
        assert_eq!(decode_entities("&#x41;&#66;"), "AB");
    }

    #[test]
    fn snippet_decodes_full_named_entity_set() {
        let html = "Caf&eacute; prices hit &pound;5 &ndash; Tinubu&rsquo;s &laquo;plan&raquo; &copy; Punch";
        assert_eq!(
            html_to_snippet(html).as_deref(),
            Some("Caf\u{e9} prices hit \u{a3}5 \u{2013} Tinubu\u{2019}s \u{ab}plan\u{bb} \u{a9} Punch")
        );
        assert_eq!(decode_entities("&Aacute;frica&hellip;"), "\u{c1}frica\u{2026}");
    }
}
