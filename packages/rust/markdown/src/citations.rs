//! Inline citation markers.
//!
//! Search answers reference sources as bare `[n]` markers, 1-based into the
//! response's citation list. Rendering turns each into a Markdown link.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// `[`, digits, `]`, plus the character right after so existing links can be
/// recognised without look-ahead.
static MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\d+)\](\(?)").expect("valid regex"));

/// Replace every `[n]` with `[n](url)` where `url` is `citations[n - 1]`.
///
/// Markers are rewritten in place, so their order is preserved. Markers
/// with no matching citation (including `[0]`) and markers already followed
/// by `(` stay as they are.
pub fn substitute_citations(content: &str, citations: &[String]) -> String {
    if citations.is_empty() {
        return content.to_string();
    }

    MARKER_RE
        .replace_all(content, |caps: &Captures<'_>| {
            let whole = caps[0].to_string();
            if !caps[2].is_empty() {
                return whole;
            }

            let url = caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| citations.get(i));

            match url {
                Some(url) => format!("[{}]({url})", &caps[1]),
                None => whole,
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls() -> Vec<String> {
        vec!["https://a.example".into(), "https://b.example".into()]
    }

    #[test]
    fn markers_map_by_one_based_index() {
        let out = substitute_citations("Fined in 2021 [2], cleared later [1].", &urls());
        assert_eq!(
            out,
            "Fined in 2021 [2](https://b.example), cleared later [1](https://a.example)."
        );
    }

    #[test]
    fn unmatched_markers_are_kept() {
        let out = substitute_citations("See [1][3] and [0].", &urls());
        assert_eq!(out, "See [1](https://a.example)[3] and [0].");
    }

    #[test]
    fn existing_links_are_untouched() {
        let input = "Already linked [1](https://elsewhere.example).";
        assert_eq!(substitute_citations(input, &urls()), input);
    }

    #[test]
    fn no_citations_leaves_content_alone() {
        assert_eq!(substitute_citations("Text [1]", &[]), "Text [1]");
    }

    #[test]
    fn non_numeric_brackets_ignored() {
        let input = "Name: [Entity/Person] | [x] |";
        assert_eq!(substitute_citations(input, &urls()), input);
    }
}
