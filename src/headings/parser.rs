use once_cell::sync::Lazy;
use regex::Regex;

// A numbered ("3.", "3)") or bulleted ("-", "*", "•", "+") list marker at the start of a line.
static LIST_MARKER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(?P<num>\d+)[.)]|[-*•+])").expect("Invalid list marker regex pattern")
});

/// Strip one leading list marker, returning the remainder.
///
/// A number followed directly by another digit ("2.5D imaging") and a bullet
/// not followed by whitespace ("*emphasis*") are not markers.
fn strip_marker(line: &str) -> Option<&str> {
    let captures = LIST_MARKER_REGEX.captures(line)?;
    let marker = captures.get(0)?;
    let rest = &line[marker.end()..];
    let next = rest.chars().next();

    let is_marker = if captures.name("num").is_some() {
        !matches!(next, Some(c) if c.is_ascii_digit())
    } else {
        matches!(next, None) || matches!(next, Some(c) if c.is_whitespace())
    };

    is_marker.then(|| rest.trim_start())
}

/// Remove wrapping quotes or backticks when both ends carry the same one.
fn strip_wrapping_quotes(text: &str) -> &str {
    for quote in ['"', '\'', '`', '“'] {
        let closing = if quote == '“' { '”' } else { quote };
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(closing) {
            let inner = &text[quote.len_utf8()..text.len() - closing.len_utf8()];
            return inner.trim();
        }
    }
    text
}

/// Parse a category list out of raw model output.
///
/// Each non-blank line is one candidate. Markdown bold is removed first, then
/// leading list markers are stripped (repeatedly, so "1. 1. Foo" yields
/// "Foo"). Wrapping quotes and trailing `:;,.` punctuation go last. When any
/// line carries a list marker, unmarked lines are treated as chatter around
/// the list and dropped; an unmarked line ending in a colon ("Categories:")
/// is always dropped.
pub fn parse_category_list(raw: &str) -> Vec<String> {
    let mut parsed: Vec<(bool, String)> = Vec::new();

    for line in raw.lines() {
        // Bold can wrap the marker ("**1. Foo**"), so it goes first.
        let unbolded = line.replace("**", "");
        let mut text = unbolded.trim();
        if text.is_empty() {
            continue;
        }

        let mut had_marker = false;
        while let Some(rest) = strip_marker(text) {
            had_marker = true;
            text = rest;
        }

        if !had_marker && text.ends_with(':') {
            continue;
        }

        let cleaned = strip_wrapping_quotes(text);
        let cleaned = cleaned
            .trim_end_matches(|c: char| matches!(c, ':' | ';' | ',' | '.') || c.is_whitespace())
            .trim();
        let cleaned = strip_wrapping_quotes(cleaned);

        if !cleaned.is_empty() {
            parsed.push((had_marker, cleaned.to_string()));
        }
    }

    let any_marked = parsed.iter().any(|(marked, _)| *marked);
    parsed
        .into_iter()
        .filter(|(marked, _)| *marked || !any_marked)
        .map(|(_, text)| text)
        .collect()
}

/// Cut a label to at most `max_chars` characters, dropping trailing whitespace.
pub fn truncate_label(label: &str, max_chars: usize) -> String {
    let truncated: String = label.chars().take(max_chars).collect();
    truncated.trim_end().to_string()
}
