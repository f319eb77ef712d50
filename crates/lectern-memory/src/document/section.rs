//! Best-effort section title inference from the top of a page.

use std::sync::LazyLock;

use regex::Regex;

use super::types::UNKNOWN_SECTION;

/// Number of non-empty lines inspected at the top of each page.
const SCAN_LINES: usize = 10;
/// Short lines below this many characters may be headings.
const MAX_HEADING_CHARS: usize = 60;

static NUMBERED_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(chapter|section|part|unit)\s+\d+").expect("valid heading regex")
});

/// Infer a section title for a page.
///
/// The first of the leading non-empty lines that is either a numbered heading
/// ("Chapter 3", "UNIT 12 ...") or a short upper-case / title-case line wins.
#[must_use]
pub fn detect_section_title(page_text: &str) -> String {
    page_text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(SCAN_LINES)
        .find(|line| is_heading(line))
        .map_or_else(|| UNKNOWN_SECTION.to_owned(), str::to_owned)
}

fn is_heading(line: &str) -> bool {
    if NUMBERED_HEADING.is_match(line) {
        return true;
    }
    line.chars().count() < MAX_HEADING_CHARS && (is_upper(line) || is_title(line))
}

/// At least one cased character and no lower-case ones.
fn is_upper(s: &str) -> bool {
    let mut cased = false;
    for c in s.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            cased = true;
        }
    }
    cased
}

/// Every run of cased characters starts upper-case and continues lower-case.
fn is_title(s: &str) -> bool {
    let mut cased = false;
    let mut previous_cased = false;
    for c in s.chars() {
        if c.is_uppercase() {
            if previous_cased {
                return false;
            }
            previous_cased = true;
            cased = true;
        } else if c.is_lowercase() {
            if !previous_cased {
                return false;
            }
            previous_cased = true;
            cased = true;
        } else {
            previous_cased = false;
        }
    }
    cased
}
