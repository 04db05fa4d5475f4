//! Cleanup passes for model-generated Markdown embedded in a report.
//!
//! Each cleanup pass is a function `&str -> String` applied in sequence.

use std::sync::LazyLock;

use regex::Regex;

/// Tidy one embedded section so it nests under a report heading of
/// level `parent_level`.
pub(crate) fn run_pipeline(md: &str, parent_level: usize) -> String {
    let mut result = md.trim().to_string();

    result = nest_headings(&result, parent_level);
    result = normalize_whitespace(&result);
    result = clean_blank_lines(&result);

    result
}

// ---------------------------------------------------------------------------
// Pass 1: Nest headings
// ---------------------------------------------------------------------------

/// Shift every heading below `parent_level`, capping at H6.
///
/// Lines inside fenced code blocks are left alone.
fn nest_headings(md: &str, parent_level: usize) -> String {
    static H_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.+)$").expect("valid regex"));

    let mut in_fence = false;
    let mut lines: Vec<String> = Vec::new();

    for line in md.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            lines.push(line.to_string());
            continue;
        }

        match H_RE.captures(line) {
            Some(caps) if !in_fence => {
                let level = (caps[1].len() + parent_level).min(6);
                lines.push(format!("{} {}", "#".repeat(level), &caps[2]));
            }
            _ => lines.push(line.to_string()),
        }
    }

    lines.join("\n")
}

// ---------------------------------------------------------------------------
// Pass 2: Normalize whitespace
// ---------------------------------------------------------------------------

/// Trim trailing whitespace on every line.
fn normalize_whitespace(md: &str) -> String {
    md.lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Pass 3: Clean up excessive blank lines
// ---------------------------------------------------------------------------

/// Collapse runs of blank lines into a single blank line.
fn clean_blank_lines(md: &str) -> String {
    static MULTI_BLANK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

    MULTI_BLANK_RE.replace_all(md, "\n\n").to_string()
}

/// Ensure the document ends with exactly one newline.
pub(crate) fn ensure_trailing_newline(md: &str) -> String {
    let trimmed = md.trim_end_matches('\n');
    format!("{trimmed}\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nest_headings_shifts_levels() {
        let input = "# Acme\n## Findings\nText";
        assert_eq!(nest_headings(input, 2), "### Acme\n#### Findings\nText");
    }

    #[test]
    fn nest_headings_caps_at_h6() {
        assert_eq!(nest_headings("##### Deep", 2), "###### Deep");
    }

    #[test]
    fn nest_headings_preserves_code_blocks() {
        let input = "```bash\n# not a heading\n```\n# Heading";
        let result = nest_headings(input, 2);
        assert!(result.contains("# not a heading\n```"));
        assert!(result.ends_with("### Heading"));
    }

    #[test]
    fn normalize_whitespace_trims_trailing() {
        let input = "Line 1   \nLine 2\t\nLine 3";
        assert_eq!(normalize_whitespace(input), "Line 1\nLine 2\nLine 3");
    }

    #[test]
    fn clean_blank_lines_collapses_runs() {
        assert_eq!(clean_blank_lines("a\n\n\n\n\nb"), "a\n\nb");
    }

    #[test]
    fn ensure_trailing_newline_normalizes_multiple() {
        assert_eq!(ensure_trailing_newline("Content"), "Content\n");
        assert_eq!(ensure_trailing_newline("Content\n\n\n"), "Content\n");
    }

    #[test]
    fn full_pipeline_tidies_section() {
        let input = "\n# Summary   \n\n\n\n| Risk Category | Findings (Yes/No) |\n";
        let result = run_pipeline(input, 2);
        assert_eq!(result, "### Summary\n\n| Risk Category | Findings (Yes/No) |");
    }
}
