use indexmap::IndexMap;

use crate::config::types::{AttrMap, MatchMode, Rule, ZoneType};

/// Text pattern used when a rule does not provide one
pub fn default_text_pattern() -> String {
    ".*".to_string()
}

/// Element names scanned by default
pub fn default_tags() -> Vec<String> {
    [
        "span", "div", "h1", "h2", "h3", "p", "i", "em", "b", "strong", "u", "small", "a",
        "blockquote", "header", "section", "footer", "nav", "article",
    ]
    .iter()
    .map(|t| t.to_string())
    .collect()
}

/// Link attributes per level in the generated TOC page
pub fn default_style() -> IndexMap<String, AttrMap> {
    let mut style = IndexMap::new();
    for (level, class) in [("1", "calibre13"), ("2", "calibre12"), ("3", "calibre14")] {
        style.insert(level.to_string(), attrs(&[("class", class)]));
    }
    style
}

fn attrs(pairs: &[(&str, &str)]) -> AttrMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn blank_attrs() -> Option<AttrMap> {
    Some(attrs(&[("class", ""), ("id", "")]))
}

fn h1_rule(pattern: &str, zone_type: ZoneType, template: &str, description: &str) -> Rule {
    Rule {
        level: 1,
        element: "h1".to_string(),
        parent_attrs: blank_attrs(),
        child_element: String::new(),
        child_attrs: blank_attrs(),
        text_pattern: pattern.to_string(),
        case_insensitive: true,
        zone_type,
        display_template: template.to_string(),
        description: description.to_string(),
        match_mode: MatchMode::Auto,
        class: None,
        child_class: None,
    }
}

fn calibre_rule(level: usize, parent_class: &str, child_class: &str, pattern: &str, case_insensitive: bool, description: &str) -> Rule {
    Rule {
        level,
        element: "div".to_string(),
        parent_attrs: Some(attrs(&[("class", parent_class)])),
        child_element: "span".to_string(),
        child_attrs: Some(attrs(&[("class", child_class)])),
        text_pattern: pattern.to_string(),
        case_insensitive,
        zone_type: ZoneType::Chapter,
        display_template: String::new(),
        description: description.to_string(),
        match_mode: MatchMode::Auto,
        class: None,
        child_class: None,
    }
}

/// The rule set shipped with the tool: plain `h1` headings for each zone
/// followed by the div/span structure Calibre conversions produce
pub fn default_rules() -> Vec<Rule> {
    vec![
        h1_rule(
            r"^(Preface|Foreword|Acknowledgements)()",
            ZoneType::Frontmatter,
            "",
            "Preface, foreword and acknowledgements",
        ),
        h1_rule(r"^Part\s+([IVX]+):?\s*(.*)", ZoneType::Part, "Part {num}", "Parts"),
        h1_rule(
            r"^Chapter\s+(\d+)[\s:\-–]*(.*)",
            ZoneType::Chapter,
            "Lesson {num}: {text}",
            "Chapters",
        ),
        h1_rule(
            r"^Appendix\s+([A-Z]):?\s*(.*)",
            ZoneType::Appendix,
            "Appendix {num}: {text}",
            "Appendices",
        ),
        h1_rule(
            r"^(Glossary|Index|Bibliography)$",
            ZoneType::Backmatter,
            "",
            "Index and references",
        ),
        calibre_rule(1, "calibre5", "calibre6", r"^Chapter\s+\d+:", true, "Calibre level 1: Chapter X: in a span"),
        calibre_rule(2, "calibre10", "calibre9", ".*", false, "Calibre level 2"),
        calibre_rule(3, "calibre10", "calibre16", ".*", false, "Calibre level 3"),
    ]
}
