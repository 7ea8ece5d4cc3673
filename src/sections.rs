//! Heuristic chapter/section detection over plain text.
//!
//! A line opens a new section when it looks like a heading: a chapter/part/
//! section/unit marker, a numbered title, one of the usual front/back-matter
//! words, or a short ALL-CAPS line. Recall is best-effort.
use crate::cancel::CancellationToken;
use crate::error::Result;
use crate::text::count_words;
use crate::types::Section;
use regex::Regex;
use std::sync::OnceLock;

/// ALL-CAPS lines at or beyond this many characters are treated as body text.
const MAX_CAPS_HEADING_CHARS: usize = 100;

/// Level assigned to a pattern-matched heading.
pub const PATTERN_LEVEL: usize = 0;
/// Level assigned to an ALL-CAPS heading.
pub const CAPS_LEVEL: usize = 1;

fn heading_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"(?i)^(chapter|part)\s+([0-9]+|[ivxlcdm]+|one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve)\b",
            r"(?i)^section\s+[0-9]+(\.[0-9]+)*\b",
            r"(?i)^unit\s+[0-9]+\b",
            r"^[0-9]+\.?\s+[A-Z][a-z]+",
            r"(?i)^(prologue|epilogue|introduction|preface|foreword|afterword|appendix|conclusion)\b",
        ]
        .iter()
        .map(|pattern| Regex::new(pattern).expect("valid heading pattern"))
        .collect()
    })
}

/// Heading level for `line` if it is a boundary candidate.
pub fn heading_level(line: &str) -> Option<usize> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if heading_patterns().iter().any(|re| re.is_match(line)) {
        return Some(PATTERN_LEVEL);
    }
    if is_caps_heading(line) {
        return Some(CAPS_LEVEL);
    }
    None
}

/// Short line with at least one uppercase letter and no lowercase ones.
/// Scripts without case never qualify.
fn is_caps_heading(line: &str) -> bool {
    line.chars().count() < MAX_CAPS_HEADING_CHARS
        && line.chars().any(char::is_uppercase)
        && !line.chars().any(char::is_lowercase)
}

struct OpenSection<'t> {
    title: String,
    level: usize,
    order: usize,
    start: usize,
    lines: Vec<&'t str>,
}

impl OpenSection<'_> {
    fn close(self, end: usize) -> Section {
        let content = self.lines.join("\n").trim().to_string();
        Section {
            id: format!("section-{}", self.order),
            word_count: count_words(&content),
            title: self.title,
            order: self.order,
            level: self.level,
            start_offset: self.start,
            end_offset: end,
            content,
        }
    }
}

/// Split `text` into sections at heading-like lines.
///
/// Each section starts at its heading line and ends where the next heading
/// starts (or at the end of the text). Text before the first heading belongs
/// to no section. When no heading is found the whole text becomes a single
/// "Main Content" section; blank input yields no sections.
pub fn detect_sections(text: &str, cancel: &CancellationToken) -> Result<Vec<Section>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut sections = Vec::new();
    let mut open: Option<OpenSection<'_>> = None;
    let mut offset = 0;

    for raw_line in text.split_inclusive('\n') {
        let line = raw_line.trim();
        if let Some(level) = heading_level(line) {
            cancel.check()?;
            if let Some(previous) = open.take() {
                sections.push(previous.close(offset));
            }
            open = Some(OpenSection {
                title: line.to_string(),
                level,
                order: sections.len() + 1,
                start: offset,
                lines: Vec::new(),
            });
        } else if let Some(current) = open.as_mut() {
            current.lines.push(line);
        }
        offset += raw_line.len();
    }

    if let Some(last) = open.take() {
        sections.push(last.close(text.len()));
    }

    if sections.is_empty() {
        sections.push(Section::main_content(text));
    }

    tracing::debug!(count = sections.len(), "Detected sections");
    Ok(sections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn detect(text: &str) -> Vec<Section> {
        detect_sections(text, &CancellationToken::new()).unwrap()
    }

    #[test]
    fn test_chapter_heading_opens_section() {
        let sections = detect("Chapter 1\n\nBody text. More body.");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, "Chapter 1");
        assert_eq!(sections[0].level, 0);
        assert_eq!(sections[0].content, "Body text. More body.");
        assert_eq!(sections[0].word_count, 4);
        assert_eq!(sections[0].start_offset, 0);
    }

    #[test]
    fn test_caps_line_is_level_one() {
        let sections = detect("SHORT ALLCAPS LINE\n\nSome content.");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, "SHORT ALLCAPS LINE");
        assert_eq!(sections[0].level, 1);
    }

    #[test]
    fn test_no_headings_yields_main_content() {
        let text = "just a paragraph\nwith two lines.";
        let sections = detect(text);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, "Main Content");
        assert_eq!(sections[0].start_offset, 0);
        assert_eq!(sections[0].end_offset, text.len());
    }

    #[test]
    fn test_caseless_scripts_are_not_caps_headings() {
        let sections = detect("这是第一段文字\n这是第二段文字\n这是第三段文字");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, "Main Content");

        assert_eq!(heading_level("שלום עולם"), None);
        assert_eq!(heading_level("مرحبا بالعالم"), None);
        assert_eq!(heading_level("ÉTÉ 1999"), Some(1));
    }

    #[test]
    fn test_empty_input_yields_nothing() {
        assert!(detect("").is_empty());
        assert!(detect("  \n \n").is_empty());
    }

    #[test]
    fn test_offsets_cover_heading_to_next_heading() {
        let text = "Preface\nopening words\nChapter 2\nsecond part\n";
        let sections = detect(text);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].start_offset, 0);
        assert_eq!(sections[0].end_offset, text.find("Chapter 2").unwrap());
        assert_eq!(sections[1].start_offset, sections[0].end_offset);
        assert_eq!(sections[1].end_offset, text.len());
        assert_eq!(sections[1].order, 2);
        assert_eq!(sections[1].id, "section-2");
    }

    #[test]
    fn test_heading_patterns() {
        for line in [
            "CHAPTER IV",
            "chapter twelve",
            "Part 2",
            "Section 3.1 Scope",
            "Unit 5",
            "1. Introduction",
            "12 Methods",
            "Epilogue",
            "appendix A",
        ] {
            assert_eq!(heading_level(line), Some(PATTERN_LEVEL), "{line}");
        }
    }

    #[test]
    fn test_non_headings() {
        for line in [
            "",
            "It was a dark and stormy night.",
            "1234",
            "12 apples",
            "Chapters were read aloud",
            "— 42 —",
        ] {
            assert_eq!(heading_level(line), None, "{line}");
        }
    }

    #[test]
    fn test_long_caps_line_is_body() {
        let line = "A".repeat(120);
        assert_eq!(heading_level(&line), None);
    }

    #[test]
    fn test_cancelled_token_stops_detection() {
        let token = CancellationToken::new();
        token.cancel();
        let result = detect_sections("Chapter 1\ntext", &token);
        assert!(matches!(result, Err(crate::error::ParseError::Cancelled)));
    }

    proptest! {
        #[test]
        fn prop_sections_ordered_and_disjoint(
            lines in proptest::collection::vec(
                prop_oneof![
                    Just("Chapter 1".to_string()),
                    Just("INTERLUDE".to_string()),
                    Just(String::new()),
                    "[a-z ]{1,30}",
                ],
                0..40,
            )
        ) {
            let text = lines.join("\n");
            let sections = detect(&text);
            for section in &sections {
                prop_assert!(section.start_offset <= section.end_offset);
                prop_assert!(section.end_offset <= text.len());
            }
            for pair in sections.windows(2) {
                prop_assert!(pair[0].order < pair[1].order);
                prop_assert!(pair[0].end_offset <= pair[1].start_offset);
            }
        }
    }
}
