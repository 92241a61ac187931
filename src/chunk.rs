//! Paragraph-boundary text sectioning.
//!
//! Splits extracted document text into [`Section`]s no longer than
//! `max_chars`. Splitting occurs on paragraph boundaries (`\n\n`) so that
//! each section reads as a unit; a single oversized paragraph is broken at
//! the last newline or space before the limit.

/// A contiguous run of paragraphs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub index: usize,
    pub text: String,
}

/// Split text into sections on paragraph boundaries, respecting `max_chars`.
/// Returns sections with contiguous indices starting at 0; empty input
/// yields no sections.
pub fn split_sections(text: &str, max_chars: usize) -> Vec<Section> {
    let max_chars = max_chars.max(1);
    let mut sections = Vec::new();
    let mut current_buf = String::new();

    for para in text.split("\n\n") {
        let trimmed = para.trim();
        if trimmed.is_empty() {
            continue;
        }

        // If adding this paragraph would exceed max, flush current buffer
        let would_be = if current_buf.is_empty() {
            trimmed.len()
        } else {
            current_buf.len() + 2 + trimmed.len()
        };

        if would_be > max_chars && !current_buf.is_empty() {
            push_section(&mut sections, &current_buf);
            current_buf.clear();
        }

        if trimmed.len() > max_chars {
            let mut remaining = trimmed;
            while !remaining.is_empty() {
                let split_at = split_point(remaining, max_chars);
                push_section(&mut sections, remaining[..split_at].trim());
                remaining = &remaining[split_at..];
            }
        } else {
            if !current_buf.is_empty() {
                current_buf.push_str("\n\n");
            }
            current_buf.push_str(trimmed);
        }
    }

    if !current_buf.is_empty() {
        push_section(&mut sections, &current_buf);
    }

    sections
}

/// Byte offset at which to cut `text` so the head stays within `max_bytes`,
/// preferring a newline or space and never splitting a character.
fn split_point(text: &str, max_bytes: usize) -> usize {
    if text.len() <= max_bytes {
        return text.len();
    }
    let mut limit = max_bytes;
    while !text.is_char_boundary(limit) {
        limit -= 1;
    }
    if limit == 0 {
        // The first character alone is wider than the limit.
        return text.chars().next().map_or(text.len(), char::len_utf8);
    }
    text[..limit]
        .rfind('\n')
        .or_else(|| text[..limit].rfind(' '))
        .map(|pos| pos + 1)
        .unwrap_or(limit)
}

fn push_section(sections: &mut Vec<Section>, text: &str) {
    if text.is_empty() {
        return;
    }
    sections.push(Section {
        index: sections.len(),
        text: text.to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_text_single_section() {
        let sections = split_sections("Hello, world!", 2800);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].index, 0);
        assert_eq!(sections[0].text, "Hello, world!");
    }

    #[test]
    fn empty_text_has_no_sections() {
        assert!(split_sections("", 100).is_empty());
        assert!(split_sections("\n\n  \n\n", 100).is_empty());
    }

    #[test]
    fn paragraphs_under_limit_stay_together() {
        let text = "First paragraph.\n\nSecond paragraph.\n\nThird paragraph.";
        let sections = split_sections(text, 2800);
        assert_eq!(sections.len(), 1);
        assert!(sections[0].text.contains("First paragraph."));
        assert!(sections[0].text.contains("Third paragraph."));
    }

    #[test]
    fn paragraphs_over_limit_split() {
        let text = "This is paragraph one.\n\nThis is paragraph two.\n\nThis is paragraph three.";
        let sections = split_sections(text, 20 + 10);
        assert!(sections.len() > 1);
        for (i, s) in sections.iter().enumerate() {
            assert_eq!(s.index, i);
        }
    }

    #[test]
    fn oversized_paragraph_is_hard_split() {
        let text = "word ".repeat(100);
        let sections = split_sections(&text, 42);
        assert!(sections.len() > 1);
        for s in &sections {
            assert!(s.text.len() <= 42, "section too long: {}", s.text.len());
            assert!(!s.text.starts_with(' '));
        }
    }

    #[test]
    fn multibyte_text_never_splits_characters() {
        let text = "é".repeat(50);
        let sections = split_sections(&text, 7);
        let rejoined: String = sections.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(rejoined, text);
    }

    #[test]
    fn deterministic() {
        let text = "Alpha\n\nBeta\n\nGamma\n\nDelta";
        assert_eq!(split_sections(text, 20), split_sections(text, 20));
    }
}
