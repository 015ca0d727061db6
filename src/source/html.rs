//! Minimal HTML extraction for the authoritative verse page
//!
//! The page is server-rendered; the blocks we need are `<div>`s tagged with a
//! known class. We locate the opening tag, walk `<div>`/`</div>` pairs to its
//! matching close, then flatten the fragment to text.

use regex::{Captures, Regex};
use std::sync::OnceLock;

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).unwrap_or_else(|e| panic!("invalid pattern {pattern}: {e}")))
}

fn div_open_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r#"(?i)<div\b[^>]*\bclass\s*=\s*["']([^"']*)["'][^>]*>"#)
}

fn div_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"(?i)<(/?)div\b[^>]*>")
}

fn dropped_elements_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(
        &RE,
        r"(?is)<script\b.*?</script\s*>|<style\b.*?</style\s*>|<h[1-6]\b.*?</h[1-6]\s*>",
    )
}

fn block_break_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"(?i)</p\s*>|<br\s*/?>|</div\s*>|</li\s*>")
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"<[^>]*>")
}

fn entity_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);")
}

const PARAGRAPH: char = '\u{1}';

/// Inner HTML of the first `<div>` whose class list contains `class`.
pub fn extract_block<'a>(html: &'a str, class: &str) -> Option<&'a str> {
    let open = div_open_re().captures_iter(html).find(|caps| {
        caps.get(1)
            .is_some_and(|classes| classes.as_str().split_whitespace().any(|c| c == class))
    })?;
    let inner_start = open.get(0)?.end();

    let mut depth = 1usize;
    for tag in div_tag_re().captures_iter(&html[inner_start..]) {
        let whole = tag.get(0)?;
        if tag.get(1).is_some_and(|m| m.as_str() == "/") {
            depth -= 1;
            if depth == 0 {
                return Some(&html[inner_start..inner_start + whole.start()]);
            }
        } else {
            depth += 1;
        }
    }
    // unterminated block: take the rest of the document
    Some(&html[inner_start..])
}

/// Flatten an HTML fragment to text.
///
/// Inline tags are replaced by `inline_sep`; block boundaries become
/// paragraphs joined with `paragraph_sep`. Headings, scripts and styles are
/// dropped. Returns `None` when no text remains.
pub fn to_text(fragment: &str, inline_sep: &str, paragraph_sep: &str) -> Option<String> {
    let without_dropped = dropped_elements_re().replace_all(fragment, "");
    let marked = block_break_re().replace_all(&without_dropped, PARAGRAPH.to_string().as_str());
    let stripped = tag_re().replace_all(&marked, inline_sep);
    let decoded = decode_entities(&stripped);

    let paragraphs: Vec<String> = decoded
        .split(PARAGRAPH)
        .map(|p| p.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|p| !p.is_empty())
        .collect();

    if paragraphs.is_empty() {
        None
    } else {
        Some(paragraphs.join(paragraph_sep))
    }
}

/// Decode the character references that show up in verse pages.
pub fn decode_entities(text: &str) -> String {
    entity_re()
        .replace_all(text, |caps: &Captures| {
            let body = &caps[1];
            let decoded = if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = body.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match body {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some(' '),
                    "mdash" => Some('—'),
                    "ndash" => Some('–'),
                    "rsquo" => Some('’'),
                    "lsquo" => Some('‘'),
                    "rdquo" => Some('”'),
                    "ldquo" => Some('“'),
                    "hellip" => Some('…'),
                    _ => None,
                }
            };
            decoded.map(String::from).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Heuristic for bot-challenge interstitials served with a 200.
pub fn looks_like_challenge(html: &str) -> bool {
    const MARKERS: [&str; 4] = [
        "cf-chl",
        "challenge-platform",
        "<title>Just a moment...</title>",
        "Attention Required!",
    ];
    MARKERS.iter().any(|m| html.contains(m))
}
