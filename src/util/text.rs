use std::borrow::Cow;

use htmlescape::decode_html;

/// Longest entity body we try to decode (`&CounterClockwiseContourIntegral;` is 33 bytes)
const MAX_ENTITY_LEN: usize = 40;

/// Decodes HTML entities in feed text.
///
/// Feeds routinely double-escape their titles (`&amp;ldquo;`), so after the
/// XML layer has done its own unescaping the text can still contain named
/// or numeric HTML entities. This resolves them:
///
/// - `&amp;` → `&`
/// - `&#39;` → `'`
/// - `&ldquo;` → `“`
///
/// Bare ampersands and unknown entities are kept as written instead of
/// failing the whole string.
///
/// # Returns
///
/// `Cow::Borrowed(s)` when there is nothing to decode (no allocation).
///
/// # Examples
///
/// ```
/// use gator::util::unescape_html;
///
/// assert_eq!(unescape_html("A &amp; B"), "A & B");
/// assert_eq!(unescape_html("It&#39;s"), "It's");
/// assert_eq!(unescape_html("Fish & Chips"), "Fish & Chips");
/// assert_eq!(unescape_html("&bogus; &amp;"), "&bogus; &");
/// ```
pub fn unescape_html(s: &str) -> Cow<'_, str> {
    if !s.contains('&') {
        return Cow::Borrowed(s);
    }

    // Fast path: the whole string is well-formed
    if let Ok(decoded) = decode_html(s) {
        return Cow::Owned(decoded);
    }

    // Slow path: decode entity by entity, keeping anything that does not decode
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];

        if let Some(len) = entity_len(tail) {
            if let Ok(decoded) = decode_html(&tail[..len]) {
                out.push_str(&decoded);
                rest = &tail[len..];
                continue;
            }
        }

        out.push('&');
        rest = &tail[1..];
    }
    out.push_str(rest);

    Cow::Owned(out)
}

/// Byte length of the entity at the start of `tail` (which begins with `&`),
/// including the terminating `;`. `None` if no plausible entity starts here.
fn entity_len(tail: &str) -> Option<usize> {
    for (idx, c) in tail.char_indices().skip(1) {
        if idx > MAX_ENTITY_LEN {
            return None;
        }
        match c {
            ';' if idx > 1 => return Some(idx + 1),
            '#' if idx == 1 => {}
            c if c.is_ascii_alphanumeric() => {}
            _ => return None,
        }
    }
    None
}

/// Removes control characters (except newline and tab) from text that will
/// end up in a terminal.
///
/// Feed titles occasionally carry stray escape sequences; printing them raw
/// can garble the listing.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    if !s.chars().any(|c| c.is_control() && c != '\n' && c != '\t') {
        return Cow::Borrowed(s);
    }
    Cow::Owned(
        s.chars()
            .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_no_entities_borrows() {
        assert!(matches!(unescape_html("plain text"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_named_and_numeric_entities() {
        assert_eq!(unescape_html("A &amp; B"), "A & B");
        assert_eq!(unescape_html("It&#39;s"), "It's");
        assert_eq!(unescape_html("&#x27;hex&#x27;"), "'hex'");
        assert_eq!(unescape_html("&ldquo;quoted&rdquo;"), "\u{201c}quoted\u{201d}");
        assert_eq!(unescape_html("&lt;p&gt;"), "<p>");
    }

    #[test]
    fn test_bare_ampersand_preserved() {
        assert_eq!(unescape_html("Fish & Chips"), "Fish & Chips");
        assert_eq!(unescape_html("AT&T &amp; friends"), "AT&T & friends");
        assert_eq!(unescape_html("trailing &"), "trailing &");
    }

    #[test]
    fn test_unknown_entity_preserved() {
        assert_eq!(unescape_html("&notanentity; &amp;"), "&notanentity; &");
        assert_eq!(unescape_html("&;"), "&;");
    }

    #[test]
    fn test_entity_len() {
        assert_eq!(entity_len("&amp; rest"), Some(5));
        assert_eq!(entity_len("&#39;"), Some(5));
        assert_eq!(entity_len("& b"), None);
        assert_eq!(entity_len("&;"), None);
        assert_eq!(entity_len("&amp"), None);
    }

    #[test]
    fn test_strip_control_chars() {
        assert_eq!(strip_control_chars("clean\ttext\n"), "clean\ttext\n");
        assert_eq!(strip_control_chars("bad\x1b[31mred"), "bad[31mred");
    }

    proptest! {
        #[test]
        fn prop_text_without_ampersand_is_unchanged(s in "[^&]*") {
            prop_assert_eq!(unescape_html(&s), s.as_str());
        }

        #[test]
        fn prop_unescape_inverts_minimal_encoding(s in "\\PC*") {
            let encoded = htmlescape::encode_minimal(&s);
            prop_assert_eq!(unescape_html(&encoded), s.as_str());
        }

        #[test]
        fn prop_unescape_never_panics(s in "\\PC{0,64}") {
            let _ = unescape_html(&s);
        }
    }
}
