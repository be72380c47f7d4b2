use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

use crate::config::ZoneType;
use crate::toc::types::HeadingRecord;

lazy_static! {
    static ref NON_SLUG_CHARS: Regex = Regex::new(r"[^a-z0-9]+").unwrap();
    static ref PLACEHOLDER: Regex = Regex::new(r"\{(num|text|raw)\}").unwrap();
}

/// Section counters kept per top-level anchor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SectionCounters {
    pub sec2: usize,
    pub sec3: usize,
    pub sec4: usize,
}

/// Anchor id and display text produced for one heading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub anchor_id: String,
    pub display_text: String,
}

/// Run-scoped numbering state. Created for one generation run and dropped with it.
///
/// Counters only ever grow, so headings have to be numbered in the order they
/// appear in the spine.
#[derive(Debug, Default)]
pub struct NumberingContext {
    pub chapter_counter: usize,
    pub part_counter: usize,
    pub appendix_counter: usize,
    pub frontmatter_counter: usize,
    pub backmatter_counter: usize,
    section_counters: HashMap<String, SectionCounters>,
}

impl NumberingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counters for the headings below `parent_anchor`, created on first use
    pub fn section_counters(&mut self, parent_anchor: &str) -> &mut SectionCounters {
        self.section_counters
            .entry(parent_anchor.to_string())
            .or_default()
    }

    /// Number one heading.
    ///
    /// `parent_anchor` is the anchor of the nearest preceding level-1 heading;
    /// a level 2+ heading without one is an orphan and gets `None`.
    pub fn assign(&mut self, record: &HeadingRecord, parent_anchor: Option<&str>) -> Option<Assignment> {
        if record.level <= 1 {
            Some(self.assign_top_level(record))
        } else {
            let parent = parent_anchor?;
            Some(self.assign_section(record.level, parent, &record.raw_text))
        }
    }

    fn assign_top_level(&mut self, record: &HeadingRecord) -> Assignment {
        let raw = record.raw_text.as_str();
        let (number_token, clean_title) = decompose(raw, &record.pattern);
        let template = record.display_template.as_str();

        match record.zone_type {
            ZoneType::Chapter => {
                self.chapter_counter += 1;
                let counter = self.chapter_counter.to_string();
                // Chapter {num} falls back to the running counter when group 1 is missing or empty
                let num = if number_token.is_empty() { counter.clone() } else { number_token };
                let display_text = if template.is_empty() {
                    format!("Chapter {}", counter)
                } else {
                    render_template(template, &num, &clean_title, raw)
                };
                Assignment { anchor_id: counter, display_text }
            }
            ZoneType::Part => {
                self.part_counter += 1;
                let roman = int_to_roman(self.part_counter);
                let display_text = if template.is_empty() {
                    raw.to_string()
                } else {
                    render_template(template, &roman, &clean_title, raw)
                };
                Assignment {
                    anchor_id: format!("part-{}", roman.to_lowercase()),
                    display_text,
                }
            }
            ZoneType::Appendix => {
                self.appendix_counter += 1;
                let letter = appendix_letter(self.appendix_counter);
                let display_text = if template.is_empty() {
                    format!("Appendix {}", letter)
                } else {
                    render_template(template, &letter, &clean_title, raw)
                };
                Assignment {
                    anchor_id: format!("app-{}", letter.to_lowercase()),
                    display_text,
                }
            }
            ZoneType::Frontmatter | ZoneType::Backmatter => {
                if record.zone_type == ZoneType::Frontmatter {
                    self.frontmatter_counter += 1;
                } else {
                    self.backmatter_counter += 1;
                }
                let display_text = if template.is_empty() {
                    raw.to_string()
                } else {
                    render_template(template, &number_token, &clean_title, raw)
                };
                Assignment {
                    anchor_id: format!("{}-{}", record.zone_type.prefix(), safe_id_from_text(raw)),
                    display_text,
                }
            }
        }
    }

    fn assign_section(&mut self, level: usize, parent: &str, raw: &str) -> Assignment {
        let counters = self.section_counters(parent);
        let anchor_id = match level {
            2 => {
                counters.sec2 += 1;
                format!("{}-{}", parent, counters.sec2)
            }
            3 => {
                counters.sec3 += 1;
                format!("{}-s{}", parent, counters.sec3)
            }
            _ => {
                counters.sec4 += 1;
                format!("{}-ss{}", parent, counters.sec4)
            }
        };
        Assignment {
            anchor_id,
            display_text: raw.to_string(),
        }
    }
}

/// Split heading text into (number token, clean title) using the rule's capture groups.
/// Group 1 is the number, group 2 (when present and non-empty) the title.
pub fn decompose(raw: &str, pattern: &Regex) -> (String, String) {
    let Some(caps) = pattern.captures(raw) else {
        return (String::new(), raw.trim().to_string());
    };
    let number = caps
        .get(1)
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();
    let title = caps
        .get(2)
        .map(|m| m.as_str().trim())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| raw.trim())
        .to_string();
    (number, title)
}

/// Substitute `{num}`, `{text}` and `{raw}` in one pass over the template.
/// Substituted values are not scanned again; any other braces are left as written.
pub fn render_template(template: &str, num: &str, text: &str, raw: &str) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &regex::Captures| match &caps[1] {
            "num" => num.to_string(),
            "text" => text.to_string(),
            _ => raw.to_string(),
        })
        .into_owned()
}

/// Roman numeral using subtractive pairs. There is no upper bound.
pub fn int_to_roman(mut num: usize) -> String {
    const VALUES: [(usize, &str); 13] = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];

    let mut roman = String::new();
    for (value, symbol) in VALUES {
        while num >= value {
            roman.push_str(symbol);
            num -= value;
        }
    }
    roman
}

/// Appendix letter for a 1-based counter: A..Z, then AA, AB, ... like spreadsheet columns
pub fn appendix_letter(counter: usize) -> String {
    let mut n = counter.max(1);
    let mut letters = Vec::new();
    while n > 0 {
        n -= 1;
        letters.push((b'A' + (n % 26) as u8) as char);
        n /= 26;
    }
    letters.iter().rev().collect()
}

/// Lowercase, collapse every run of non `[a-z0-9]` characters into one hyphen
/// and trim hyphens. Empty results become `toc-item`.
pub fn safe_id_from_text(text: &str) -> String {
    let lowered = text.to_lowercase();
    let slug = NON_SLUG_CHARS.replace_all(&lowered, "-");
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "toc-item".to_string()
    } else {
        slug.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::Document;
    use crate::toc::matcher::compile_text_pattern;
    use crate::toc::types::{Classification, ElementRef};

    fn record(level: usize, zone_type: ZoneType, text: &str, pattern: &str, template: &str) -> HeadingRecord {
        let doc = Document::parse("<h1/>").unwrap();
        let node = doc.document_element().unwrap();
        HeadingRecord::new(
            Classification {
                rule_index: 0,
                level,
                text: text.to_string(),
                zone_type,
                display_template: template.to_string(),
                pattern: compile_text_pattern(pattern, true).unwrap(),
            },
            "ch1.xhtml",
            ElementRef { document: 0, node },
        )
    }

    #[test]
    fn test_int_to_roman() {
        assert_eq!(int_to_roman(1), "I");
        assert_eq!(int_to_roman(4), "IV");
        assert_eq!(int_to_roman(9), "IX");
        assert_eq!(int_to_roman(40), "XL");
        assert_eq!(int_to_roman(90), "XC");
        assert_eq!(int_to_roman(1994), "MCMXCIV");
        assert_eq!(int_to_roman(4000), "MMMM");
    }

    #[test]
    fn test_appendix_letter() {
        assert_eq!(appendix_letter(1), "A");
        assert_eq!(appendix_letter(2), "B");
        assert_eq!(appendix_letter(26), "Z");
        assert_eq!(appendix_letter(27), "AA");
        assert_eq!(appendix_letter(28), "AB");
        assert_eq!(appendix_letter(52), "AZ");
        assert_eq!(appendix_letter(53), "BA");
    }

    #[test]
    fn test_safe_id_from_text() {
        assert_eq!(safe_id_from_text("Hello, World!"), "hello-world");
        assert_eq!(safe_id_from_text("!!! ??? ..."), "toc-item");
        assert_eq!(safe_id_from_text(""), "toc-item");
        assert_eq!(safe_id_from_text("  Preface  "), "preface");
        assert_eq!(safe_id_from_text("Café au lait"), "caf-au-lait");
    }

    #[test]
    fn test_decompose() {
        let pattern = compile_text_pattern(r"^Chapter\s+(\d+)[\s:\-–]*(.*)", true).unwrap();
        assert_eq!(
            decompose("Chapter 1: Introduction", &pattern),
            ("1".to_string(), "Introduction".to_string())
        );
        // Empty title group falls back to the raw text
        assert_eq!(
            decompose("Chapter 2", &pattern),
            ("2".to_string(), "Chapter 2".to_string())
        );
        // No match degrades to the raw text
        assert_eq!(
            decompose(" Prologue ", &pattern),
            (String::new(), "Prologue".to_string())
        );
        // No capture groups at all
        let bare = compile_text_pattern(r"Chapter\s+\d+:", true).unwrap();
        assert_eq!(
            decompose("Chapter 4: Intro", &bare),
            (String::new(), "Chapter 4: Intro".to_string())
        );
    }

    #[test]
    fn test_chapter_with_template() {
        let mut ctx = NumberingContext::new();
        let rec = record(
            1,
            ZoneType::Chapter,
            "Chapter 1: Introduction",
            r"^Chapter\s+(\d+)[\s:\-–]*(.*)",
            "Lesson {num}: {text}",
        );
        let assignment = ctx.assign(&rec, None).unwrap();
        assert_eq!(assignment.anchor_id, "1");
        assert_eq!(assignment.display_text, "Lesson 1: Introduction");
    }

    #[test]
    fn test_chapter_default_display_uses_counter() {
        let mut ctx = NumberingContext::new();
        let rec = record(1, ZoneType::Chapter, "Chapter 7: Late start", r"^Chapter\s+(\d+)(.*)", "");
        let first = ctx.assign(&rec, None).unwrap();
        let second = ctx.assign(&rec, None).unwrap();
        assert_eq!(first, Assignment { anchor_id: "1".into(), display_text: "Chapter 1".into() });
        assert_eq!(second.anchor_id, "2");
        assert_eq!(ctx.chapter_counter, 2);
    }

    #[test]
    fn test_chapter_template_without_number_group_uses_counter() {
        let mut ctx = NumberingContext::new();
        let rec = record(1, ZoneType::Chapter, "Chapter 4: Intro", r"Chapter\s+\d+:", "{num}. {raw}");
        assert_eq!(ctx.assign(&rec, None).unwrap().display_text, "1. Chapter 4: Intro");
    }

    #[test]
    fn test_part_numbering() {
        let mut ctx = NumberingContext::new();
        let plain = record(1, ZoneType::Part, "Part I: Basics", r"^Part\s+([IVX]+):?\s*(.*)", "");
        let templated = record(1, ZoneType::Part, "Part II: More", r"^Part\s+([IVX]+):?\s*(.*)", "Part {num} - {text}");
        let first = ctx.assign(&plain, None).unwrap();
        assert_eq!(first.anchor_id, "part-i");
        assert_eq!(first.display_text, "Part I: Basics");
        let second = ctx.assign(&templated, None).unwrap();
        assert_eq!(second.anchor_id, "part-ii");
        assert_eq!(second.display_text, "Part II - More");
    }

    #[test]
    fn test_appendix_numbering() {
        let mut ctx = NumberingContext::new();
        let rec = record(1, ZoneType::Appendix, "Appendix Q: Tables", r"^Appendix\s+([A-Z]):?\s*(.*)", "");
        let first = ctx.assign(&rec, None).unwrap();
        assert_eq!(first.anchor_id, "app-a");
        assert_eq!(first.display_text, "Appendix A");

        let templated = record(1, ZoneType::Appendix, "Appendix Q: Tables", r"^Appendix\s+([A-Z]):?\s*(.*)", "App. {num} ({text})");
        let second = ctx.assign(&templated, None).unwrap();
        assert_eq!(second.anchor_id, "app-b");
        assert_eq!(second.display_text, "App. B (Tables)");
    }

    #[test]
    fn test_front_and_back_matter() {
        let mut ctx = NumberingContext::new();
        let preface = record(1, ZoneType::Frontmatter, "Preface", r"^(Preface|Foreword)()", "");
        let index = record(1, ZoneType::Backmatter, "Index", r"^(Glossary|Index)$", "{num}!");
        assert_eq!(
            ctx.assign(&preface, None).unwrap(),
            Assignment { anchor_id: "fron-preface".into(), display_text: "Preface".into() }
        );
        assert_eq!(
            ctx.assign(&index, None).unwrap(),
            Assignment { anchor_id: "back-index".into(), display_text: "Index!".into() }
        );
        // Zone counters do not touch chapter numbering
        assert_eq!(ctx.chapter_counter, 0);
    }

    #[test]
    fn test_section_counters_are_per_parent() {
        let mut ctx = NumberingContext::new();
        let sec = record(2, ZoneType::Chapter, "A section", ".*", "ignored {num}");
        assert_eq!(ctx.assign(&sec, Some("1")).unwrap().anchor_id, "1-1");
        assert_eq!(ctx.assign(&sec, Some("1")).unwrap().anchor_id, "1-2");
        assert_eq!(ctx.assign(&sec, Some("2")).unwrap().anchor_id, "2-1");
        assert_eq!(ctx.assign(&sec, Some("2")).unwrap().anchor_id, "2-2");
        // Templates do not apply below level 1
        assert_eq!(ctx.assign(&sec, Some("2")).unwrap().display_text, "A section");
    }

    #[test]
    fn test_deep_levels_share_the_sec4_counter() {
        let mut ctx = NumberingContext::new();
        let l3 = record(3, ZoneType::Chapter, "Sub", ".*", "");
        let l4 = record(4, ZoneType::Chapter, "Subsub", ".*", "");
        let l6 = record(6, ZoneType::Chapter, "Deeper", ".*", "");
        assert_eq!(ctx.assign(&l3, Some("app-a")).unwrap().anchor_id, "app-a-s1");
        assert_eq!(ctx.assign(&l4, Some("app-a")).unwrap().anchor_id, "app-a-ss1");
        assert_eq!(ctx.assign(&l6, Some("app-a")).unwrap().anchor_id, "app-a-ss2");
        assert_eq!(
            *ctx.section_counters("app-a"),
            SectionCounters { sec2: 0, sec3: 1, sec4: 2 }
        );
    }

    #[test]
    fn test_orphan_section_is_dropped() {
        let mut ctx = NumberingContext::new();
        let sec = record(2, ZoneType::Chapter, "Lost", ".*", "");
        assert!(ctx.assign(&sec, None).is_none());
    }

    #[test]
    fn test_unknown_placeholders_are_kept() {
        assert_eq!(render_template("{num}/{title}/{raw}", "1", "T", "R"), "1/{title}/R");
    }

    #[test]
    fn test_substituted_text_is_not_expanded_again() {
        assert_eq!(
            render_template(
                "Lesson {num}: {text}",
                "3",
                "Using {raw} in templates",
                "Chapter 3: Using {raw} in templates"
            ),
            "Lesson 3: Using {raw} in templates"
        );
        assert_eq!(render_template("{raw} {num}", "{text}", "T", "{num}"), "{num} {text}");
    }

    #[test]
    fn test_braces_in_heading_title() {
        let mut ctx = NumberingContext::new();
        let rec = record(
            1,
            ZoneType::Chapter,
            "Chapter 3: Using {raw} in templates",
            r"^Chapter\s+(\d+)[\s:]*(.*)",
            "Lesson {num}: {text}",
        );
        assert_eq!(ctx.assign(&rec, None).unwrap().display_text, "Lesson 3: Using {raw} in templates");
    }
}
