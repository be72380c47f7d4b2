use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::defaults;

/// Attribute name -> required value (or pattern)
pub type AttrMap = IndexMap<String, String>;

/// Structural category of a top-level heading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ZoneType {
    #[default]
    Chapter,
    Part,
    Appendix,
    Frontmatter,
    Backmatter,
}

impl ZoneType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneType::Chapter => "chapter",
            ZoneType::Part => "part",
            ZoneType::Appendix => "appendix",
            ZoneType::Frontmatter => "frontmatter",
            ZoneType::Backmatter => "backmatter",
        }
    }

    /// Four-letter prefix used in slug-based anchors (`fron-preface`)
    pub fn prefix(&self) -> &'static str {
        &self.as_str()[..4]
    }
}

/// How a required attribute value is compared with the element's value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Values starting with `^`, ending with `$` or containing `.*` are
    /// regex searches, everything else is a substring test
    #[default]
    Auto,
    Exact,
    Substring,
    Pattern,
}

/// A single heading rule. Rules are evaluated in the order they are listed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    /// Heading level (1 = top level)
    pub level: usize,

    /// Tag name of the heading element
    pub element: String,

    /// Attributes required on the heading element
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_attrs: Option<AttrMap>,

    /// Tag name of the single child carrying the heading text
    #[serde(default)]
    pub child_element: String,

    /// Attributes required on the child element
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_attrs: Option<AttrMap>,

    /// Regex matched at the start of the heading text.
    /// Group 1 is the number token, group 2 the clean title.
    #[serde(default = "defaults::default_text_pattern")]
    pub text_pattern: String,

    #[serde(default)]
    pub case_insensitive: bool,

    #[serde(default)]
    pub zone_type: ZoneType,

    /// Display template with `{num}`, `{text}` and `{raw}` placeholders
    #[serde(default)]
    pub display_template: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub match_mode: MatchMode,

    /// Older configurations store a bare class instead of `parent_attrs`
    #[serde(default, skip_serializing)]
    pub class: Option<String>,

    /// Older configurations store a bare class instead of `child_attrs`
    #[serde(default, skip_serializing)]
    pub child_class: Option<String>,
}

impl Rule {
    /// Attributes required on the heading element, honouring the legacy `class` key
    pub fn required_parent_attrs(&self) -> AttrMap {
        resolve_attrs(self.parent_attrs.as_ref(), self.class.as_deref())
    }

    /// Attributes required on the child element, honouring the legacy `child_class` key
    pub fn required_child_attrs(&self) -> AttrMap {
        resolve_attrs(self.child_attrs.as_ref(), self.child_class.as_deref())
    }

    /// One-line summary used in run logs
    pub fn summary(&self) -> String {
        let parent = selector_string(&self.required_parent_attrs());
        let child = selector_string(&self.required_child_attrs());
        format!(
            "{}: {} > {}: {} + '{}'",
            self.element, parent, self.child_element, child, self.text_pattern
        )
    }
}

fn resolve_attrs(map: Option<&AttrMap>, legacy_class: Option<&str>) -> AttrMap {
    match map {
        Some(map) => map.clone(),
        None => {
            let mut attrs = AttrMap::new();
            if let Some(class) = legacy_class.map(str::trim).filter(|c| !c.is_empty()) {
                attrs.insert("class".to_string(), class.to_string());
            }
            attrs
        }
    }
}

/// `key="value"` pairs for every non-empty value, space separated
pub fn attr_string(attrs: &AttrMap) -> String {
    attrs
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| format!("{}=\"{}\"", k, v))
        .collect::<Vec<_>>()
        .join(" ")
}

fn selector_string(attrs: &AttrMap) -> String {
    attrs
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| format!("{}.{}", k, v))
        .collect::<Vec<_>>()
        .join("|")
}

/// Everything a generation run needs: rules, scanned tags and per-level link styles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Criteria {
    /// Ordered rule list (first match wins)
    #[serde(default = "defaults::default_rules")]
    pub rules: Vec<Rule>,

    /// Element names to scan; an empty list scans every element
    #[serde(default = "defaults::default_tags")]
    pub tags: Vec<String>,

    /// Level (as a string) -> attributes placed on the TOC links of that level
    #[serde(default = "defaults::default_style")]
    pub style: IndexMap<String, AttrMap>,
}

impl Default for Criteria {
    fn default() -> Self {
        Criteria {
            rules: defaults::default_rules(),
            tags: defaults::default_tags(),
            style: defaults::default_style(),
        }
    }
}

impl Criteria {
    /// Attribute string per level, built from the non-empty `key="value"` pairs
    pub fn style_by_level(&self) -> IndexMap<usize, String> {
        self.style
            .iter()
            .filter_map(|(level, attrs)| {
                level
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .map(|l| (l, attr_string(attrs)))
            })
            .collect()
    }

    /// Whether elements with this tag are scanned at all
    pub fn scans_tag(&self, tag: &str) -> bool {
        self.tags.is_empty() || self.tags.iter().any(|t| t == tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_class_keys() {
        let rule: Rule = serde_yaml::from_str(
            "level: 1\nelement: div\nclass: calibre5\nchild_element: span\nchild_class: calibre6\n",
        )
        .unwrap();
        assert_eq!(rule.required_parent_attrs().get("class").map(String::as_str), Some("calibre5"));
        assert_eq!(rule.required_child_attrs().get("class").map(String::as_str), Some("calibre6"));
        assert_eq!(rule.zone_type, ZoneType::Chapter);
        assert_eq!(rule.match_mode, MatchMode::Auto);
        assert_eq!(rule.text_pattern, ".*");
    }

    #[test]
    fn test_explicit_attrs_win_over_legacy_class() {
        let rule: Rule = serde_yaml::from_str(
            "level: 2\nelement: h2\nparent_attrs: {}\nclass: ignored\n",
        )
        .unwrap();
        assert!(rule.required_parent_attrs().is_empty());
    }

    #[test]
    fn test_style_by_level_skips_empty_values() {
        let mut criteria = Criteria::default();
        criteria.style.clear();
        let mut level1 = AttrMap::new();
        level1.insert("class".to_string(), "calibre13".to_string());
        level1.insert("id".to_string(), String::new());
        level1.insert("style".to_string(), "color: red".to_string());
        criteria.style.insert("1".to_string(), level1);

        let styles = criteria.style_by_level();
        assert_eq!(styles.get(&1).map(String::as_str), Some("class=\"calibre13\" style=\"color: red\""));
        assert!(styles.get(&2).is_none());
    }

    #[test]
    fn test_zone_prefix() {
        assert_eq!(ZoneType::Frontmatter.prefix(), "fron");
        assert_eq!(ZoneType::Backmatter.prefix(), "back");
    }

    #[test]
    fn test_scans_tag() {
        let mut criteria = Criteria::default();
        criteria.tags = vec!["h1".to_string()];
        assert!(criteria.scans_tag("h1"));
        assert!(!criteria.scans_tag("p"));
        criteria.tags.clear();
        assert!(criteria.scans_tag("p"));
    }
}
