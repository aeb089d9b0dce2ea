use std::sync::OnceLock;

use regex::Regex;

/// Default subject width in list views.
pub const SUBJECT_PREVIEW_CHARS: usize = 40;

fn document_chrome() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"(?i)<!DOCTYPE[^>]*>",
            r"(?i)</?html(\s[^>]*)?>",
            r"(?i)</?head(\s[^>]*)?>",
            r"(?i)</?body(\s[^>]*)?>",
            r"(?i)<meta(\s[^>]*)?/?>",
            r"(?is)<title[^>]*>.*?</title>",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("preview pattern is valid"))
        .collect()
    })
}

/// Strips document-level tags so a full email document can be embedded in a page.
/// The markup is passed through otherwise untouched.
pub fn preview_html(content: &str) -> String {
    document_chrome()
        .iter()
        .fold(content.to_string(), |html, pattern| {
            pattern.replace_all(&html, "").into_owned()
        })
}

/// Shortens a subject to `max_chars` characters, appending `...` when cut.
pub fn truncate_subject(subject: &str, max_chars: usize) -> String {
    match subject.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &subject[..cut]),
        None => subject.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_strips_document_chrome() {
        let doc = "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">\
                   <title>Intro</title></head><body><p>Hello <b>Ann</b></p></body></html>";
        assert_eq!(preview_html(doc), "<p>Hello <b>Ann</b></p>");
    }

    #[test]
    fn test_preview_leaves_fragments_alone() {
        let fragment = "<div><p>Hi there</p></div>";
        assert_eq!(preview_html(fragment), fragment);
    }

    #[test]
    fn test_preview_keeps_header_and_tbody() {
        let html = "<HEAD></HEAD><header>Top</header><table><tbody><tr><td>1</td></tr></tbody></table>";
        assert_eq!(
            preview_html(html),
            "<header>Top</header><table><tbody><tr><td>1</td></tr></tbody></table>"
        );
    }

    #[test]
    fn test_truncate_subject_on_char_boundary() {
        assert_eq!(truncate_subject("short", 40), "short");
        assert_eq!(truncate_subject("abcdef", 3), "abc...");
        assert_eq!(truncate_subject("héllo wörld", 4), "héll...");
        assert_eq!(truncate_subject("exactly", 7), "exactly");
    }
}
