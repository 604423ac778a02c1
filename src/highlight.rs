//! Marks query occurrences inside suggestion values.
//!
//! A match counts only where a word starts: at the beginning of the value
//! or right after whitespace. Matching is case-insensitive, so the query
//! `japa` marks both `Japaneese` and `Japan` in
//! `"Japaneese lives in Japan and love non-japaneese"` but not the
//! `japa` inside `non-japaneese`.

use regex::Regex;

/// A run of text that either matched the query or did not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub matched: bool,
}

impl Segment {
    fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            matched: false,
        }
    }

    fn hit(text: &str) -> Self {
        Self {
            text: text.to_string(),
            matched: true,
        }
    }
}

/// Splits `value` into matched and unmatched segments for `query`.
///
/// An empty query yields the whole value as a single unmatched segment.
#[must_use]
pub fn highlight(value: &str, query: &str) -> Vec<Segment> {
    let query = query.trim();
    if value.is_empty() {
        return Vec::new();
    }
    if query.is_empty() {
        return vec![Segment::plain(value)];
    }

    let pattern = format!(r"(?i)(?:^|\s)({})", regex::escape(query));
    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(e) => {
            tracing::debug!("Highlight pattern rejected: {e}");
            return vec![Segment::plain(value)];
        }
    };

    let mut segments = Vec::new();
    let mut cursor = 0;
    for caps in re.captures_iter(value) {
        let Some(m) = caps.get(1) else { continue };
        if m.start() > cursor {
            segments.push(Segment::plain(&value[cursor..m.start()]));
        }
        segments.push(Segment::hit(m.as_str()));
        cursor = m.end();
    }
    if cursor < value.len() {
        segments.push(Segment::plain(&value[cursor..]));
    }
    segments
}

/// Renders segments as HTML, wrapping matches in `<strong>`.
#[must_use]
pub fn to_markup(segments: &[Segment]) -> String {
    let mut out = String::new();
    for segment in segments {
        if segment.matched {
            out.push_str("<strong>");
            push_escaped(&mut out, &segment.text);
            out.push_str("</strong>");
        } else {
            push_escaped(&mut out, &segment.text);
        }
    }
    out
}

fn push_escaped(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marks_word_starts_case_insensitively() {
        let value = "Japaneese lives in Japan and love non-japaneese";
        let markup = to_markup(&highlight(value, "japa"));
        assert_eq!(
            markup,
            "<strong>Japa</strong>neese lives in <strong>Japa</strong>n and love non-japaneese"
        );
    }

    #[test]
    fn test_segments_cover_whole_value() {
        let value = "Jamaica Jam";
        let segments = highlight(value, "jam");
        let joined: String = segments.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(joined, value);
        assert_eq!(segments.iter().filter(|s| s.matched).count(), 2);
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let segments = highlight("C++ (lang)", "c++");
        assert_eq!(segments[0], Segment::hit("C++"));
    }

    #[test]
    fn test_empty_query_is_unmatched() {
        let segments = highlight("Jamaica", "  ");
        assert_eq!(segments, vec![Segment::plain("Jamaica")]);
    }

    #[test]
    fn test_markup_escapes_html() {
        let markup = to_markup(&highlight("<b> & <i>", "<b>"));
        assert_eq!(markup, "<strong>&lt;b&gt;</strong> &amp; &lt;i&gt;");
    }
}
