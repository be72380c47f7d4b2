use regex::{Regex, RegexBuilder};

use crate::config::{AttrMap, MatchMode, Rule, ZoneType};
use crate::markup::{Document, NodeId};
use crate::toc::types::Classification;
use crate::utils::error::Result;

/// Compile a rule's text pattern so that it only matches at the start of the text
pub fn compile_text_pattern(pattern: &str, case_insensitive: bool) -> Result<Regex> {
    let anchored = format!("^(?:{})", pattern);
    Ok(RegexBuilder::new(&anchored)
        .case_insensitive(case_insensitive)
        .build()?)
}

/// How one required attribute is tested
#[derive(Debug, Clone)]
enum AttrTest {
    /// Blank value in the configuration: no constraint
    Any,
    Exact(String),
    Substring(String),
    /// `None` when the configured pattern does not compile; it never matches
    Pattern(Option<Regex>),
}

impl AttrTest {
    fn new(expected: &str, mode: MatchMode) -> Self {
        if expected.is_empty() {
            return AttrTest::Any;
        }
        let mode = match mode {
            MatchMode::Auto if looks_like_pattern(expected) => MatchMode::Pattern,
            MatchMode::Auto => MatchMode::Substring,
            other => other,
        };
        match mode {
            MatchMode::Exact => AttrTest::Exact(expected.to_string()),
            MatchMode::Pattern => AttrTest::Pattern(Regex::new(expected).ok()),
            _ => AttrTest::Substring(expected.to_string()),
        }
    }

    fn matches(&self, actual: &str) -> bool {
        match self {
            AttrTest::Any => true,
            AttrTest::Exact(expected) => actual == expected,
            AttrTest::Substring(expected) => actual.contains(expected.as_str()),
            AttrTest::Pattern(Some(re)) => re.is_match(actual),
            AttrTest::Pattern(None) => false,
        }
    }
}

/// Values that start with `^`, end with `$` or contain `.*` are treated as patterns
fn looks_like_pattern(value: &str) -> bool {
    value.starts_with('^') || value.ends_with('$') || value.contains(".*")
}

#[derive(Debug, Clone)]
struct AttrRequirements {
    tests: Vec<(String, AttrTest)>,
}

impl AttrRequirements {
    fn new(required: &AttrMap, mode: MatchMode) -> Self {
        Self {
            tests: required
                .iter()
                .map(|(key, expected)| (key.clone(), AttrTest::new(expected, mode)))
                .collect(),
        }
    }

    fn matches(&self, doc: &Document, id: NodeId) -> bool {
        self.matches_lookup(|key| doc.attr(id, key))
    }

    /// Every test holds against the values `lookup` returns; missing attributes compare as ""
    fn matches_lookup<'a>(&self, lookup: impl Fn(&str) -> Option<&'a str>) -> bool {
        self.tests
            .iter()
            .all(|(key, test)| test.matches(&normalize_value(key, lookup(key).unwrap_or_default())))
    }
}

/// The multi-valued `class` list is joined with single spaces
fn normalize_value(key: &str, value: &str) -> String {
    if key == "class" {
        value.split_whitespace().collect::<Vec<_>>().join(" ")
    } else {
        value.to_string()
    }
}

/// Check an attribute list against required values (auto match mode)
pub fn attrs_match(actual: &[(String, String)], required: &AttrMap) -> bool {
    attrs_match_with_mode(actual, required, MatchMode::Auto)
}

/// Check an attribute list against required values with an explicit match mode
pub fn attrs_match_with_mode(actual: &[(String, String)], required: &AttrMap, mode: MatchMode) -> bool {
    AttrRequirements::new(required, mode).matches_lookup(|key| {
        actual
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    })
}

#[derive(Debug, Clone)]
struct CompiledRule {
    level: usize,
    element: String,
    parent: AttrRequirements,
    child_element: Option<String>,
    child: AttrRequirements,
    pattern: Regex,
    zone_type: ZoneType,
    display_template: String,
}

impl CompiledRule {
    fn compile(rule: &Rule) -> Result<Self> {
        let child_element = rule.child_element.trim();
        Ok(Self {
            level: rule.level,
            element: rule.element.trim().to_string(),
            parent: AttrRequirements::new(&rule.required_parent_attrs(), rule.match_mode),
            child_element: (!child_element.is_empty()).then(|| child_element.to_string()),
            child: AttrRequirements::new(&rule.required_child_attrs(), rule.match_mode),
            pattern: compile_text_pattern(&rule.text_pattern, rule.case_insensitive)?,
            zone_type: rule.zone_type,
            display_template: rule.display_template.clone(),
        })
    }

    /// Text the pattern is tested against, or `None` when the structure does not fit
    fn extract_text(&self, doc: &Document, id: NodeId) -> Option<String> {
        if doc.tag_name(id) != Some(self.element.as_str()) {
            return None;
        }
        if !self.parent.matches(doc, id) {
            return None;
        }

        match &self.child_element {
            Some(child_element) => {
                let children: Vec<NodeId> = doc
                    .children(id)
                    .iter()
                    .copied()
                    .filter(|c| !doc.is_blank_text(*c))
                    .collect();
                let [child] = children.as_slice() else {
                    return None;
                };
                if doc.tag_name(*child) != Some(child_element.as_str()) {
                    return None;
                }
                if !self.child.matches(doc, *child) {
                    return None;
                }
                Some(doc.text_content(*child).trim().to_string())
            }
            None => Some(doc.text_content(id).trim().to_string()),
        }
    }
}

/// Evaluates the ordered rule list against elements. The first satisfied rule wins.
#[derive(Debug, Clone)]
pub struct RuleMatcher {
    rules: Vec<CompiledRule>,
}

impl RuleMatcher {
    pub fn new(rules: &[Rule]) -> Result<Self> {
        Ok(Self {
            rules: rules.iter().map(CompiledRule::compile).collect::<Result<_>>()?,
        })
    }

    /// Classify one element, or `None` when no rule matches
    pub fn classify(&self, doc: &Document, id: NodeId) -> Option<Classification> {
        self.rules.iter().enumerate().find_map(|(rule_index, rule)| {
            let text = rule.extract_text(doc, id)?;
            if !rule.pattern.is_match(&text) {
                return None;
            }
            Some(Classification {
                rule_index,
                level: rule.level,
                text,
                zone_type: rule.zone_type,
                display_template: rule.display_template.clone(),
                pattern: rule.pattern.clone(),
            })
        })
    }
}
