//! A small CSS-subset selector engine.
//!
//! Supports exactly what the pattern registry and the media probe need:
//! tag names, `*`, `#id`, `.class` (compoundable), attribute predicates
//! (`[attr]`, `[attr="v"]`, `[attr*="v"]`), descendant combinators and
//! comma-separated selector lists. Anything else is a parse error so a
//! typo in a pattern fails loudly instead of silently matching nothing.

use std::collections::BTreeMap;

/// A parsed selector list. Matches when any branch matches.
#[derive(Clone, Debug, PartialEq)]
pub struct Selector {
    pub(crate) branches: Vec<ComplexSelector>,
}

/// Descendant chain, outermost ancestor first, subject last.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ComplexSelector {
    pub(crate) compounds: Vec<Compound>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Compound {
    /// `*`: matches any element.
    pub(crate) universal: bool,
    pub(crate) tag: Option<String>,
    pub(crate) id: Option<String>,
    pub(crate) classes: Vec<String>,
    pub(crate) attrs: Vec<AttrPredicate>,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct AttrPredicate {
    pub(crate) name: String,
    pub(crate) op: AttrOp,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum AttrOp {
    Exists,
    Equals(String),
    Contains(String),
}

impl Selector {
    pub fn parse(input: &str) -> Result<Self, String> {
        let branches = split_top_level(input)
            .into_iter()
            .map(|branch| parse_complex(branch.trim()))
            .collect::<Result<Vec<_>, _>>()?;
        if branches.is_empty() {
            return Err("empty selector".into());
        }
        Ok(Self { branches })
    }
}

/// Split a selector list on commas that are not inside brackets or quotes.
fn split_top_level(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0usize;
    for (idx, ch) in input.char_indices() {
        match (ch, quote) {
            (q, Some(active)) if q == active => quote = None,
            (_, Some(_)) => {}
            ('"', None) | ('\'', None) => quote = Some(ch),
            ('[', None) => depth += 1,
            (']', None) => depth = depth.saturating_sub(1),
            (',', None) if depth == 0 => {
                parts.push(&input[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

fn parse_complex(input: &str) -> Result<ComplexSelector, String> {
    let compounds = split_compounds(input)
        .into_iter()
        .map(parse_compound)
        .collect::<Result<Vec<_>, _>>()?;
    if compounds.is_empty() {
        return Err("empty selector branch".into());
    }
    Ok(ComplexSelector { compounds })
}

/// Split a branch into compounds on whitespace that is not inside brackets
/// or quotes, so `[aria-label="Audio & Subtitles"]` stays one compound.
fn split_compounds(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start: Option<usize> = None;
    for (idx, ch) in input.char_indices() {
        match (ch, quote) {
            (q, Some(active)) if q == active => quote = None,
            (_, Some(_)) => {}
            ('"', None) | ('\'', None) => quote = Some(ch),
            ('[', None) => depth += 1,
            (']', None) => depth = depth.saturating_sub(1),
            _ => {}
        }
        if ch.is_whitespace() && depth == 0 && quote.is_none() {
            if let Some(from) = start.take() {
                parts.push(&input[from..idx]);
            }
        } else if start.is_none() {
            start = Some(idx);
        }
    }
    if let Some(from) = start {
        parts.push(&input[from..]);
    }
    parts
}

fn parse_compound(input: &str) -> Result<Compound, String> {
    let mut compound = Compound::default();
    let chars: Vec<char> = input.chars().collect();
    let mut pos = 0usize;

    let read_name = |chars: &[char], pos: &mut usize| -> String {
        let start = *pos;
        while *pos < chars.len() {
            let ch = chars[*pos];
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                *pos += 1;
            } else {
                break;
            }
        }
        chars[start..*pos].iter().collect()
    };

    // Optional leading tag name or universal selector.
    if pos < chars.len() {
        if chars[pos] == '*' {
            compound.universal = true;
            pos += 1;
        } else if chars[pos].is_ascii_alphabetic() {
            let tag = read_name(&chars, &mut pos);
            compound.tag = Some(tag.to_ascii_lowercase());
        }
    }

    while pos < chars.len() {
        match chars[pos] {
            '.' => {
                pos += 1;
                let class = read_name(&chars, &mut pos);
                if class.is_empty() {
                    return Err(format!("dangling `.` in `{input}`"));
                }
                compound.classes.push(class);
            }
            '#' => {
                pos += 1;
                let id = read_name(&chars, &mut pos);
                if id.is_empty() {
                    return Err(format!("dangling `#` in `{input}`"));
                }
                compound.id = Some(id);
            }
            '[' => {
                pos += 1;
                let name = read_name(&chars, &mut pos);
                if name.is_empty() {
                    return Err(format!("attribute predicate without a name in `{input}`"));
                }
                let op = parse_attr_op(&chars, &mut pos, input)?;
                compound.attrs.push(AttrPredicate { name, op });
            }
            other => return Err(format!("unsupported token `{other}` in `{input}`")),
        }
    }

    if compound == Compound::default() {
        return Err(format!("`{input}` selects nothing"));
    }
    Ok(compound)
}

fn parse_attr_op(chars: &[char], pos: &mut usize, input: &str) -> Result<AttrOp, String> {
    match chars.get(*pos) {
        Some(']') => {
            *pos += 1;
            Ok(AttrOp::Exists)
        }
        Some('=') => {
            *pos += 1;
            let value = parse_attr_value(chars, pos, input)?;
            Ok(AttrOp::Equals(value))
        }
        Some('*') if chars.get(*pos + 1) == Some(&'=') => {
            *pos += 2;
            let value = parse_attr_value(chars, pos, input)?;
            Ok(AttrOp::Contains(value))
        }
        _ => Err(format!("unterminated attribute predicate in `{input}`")),
    }
}

fn parse_attr_value(chars: &[char], pos: &mut usize, input: &str) -> Result<String, String> {
    let quote = match chars.get(*pos) {
        Some(&q @ ('"' | '\'')) => {
            *pos += 1;
            Some(q)
        }
        _ => None,
    };
    let start = *pos;
    while *pos < chars.len() {
        let ch = chars[*pos];
        match quote {
            Some(q) if ch == q => break,
            None if ch == ']' => break,
            _ => *pos += 1,
        }
    }
    let value: String = chars[start..*pos].iter().collect();
    if let Some(q) = quote {
        if chars.get(*pos) != Some(&q) {
            return Err(format!("unterminated quoted value in `{input}`"));
        }
        *pos += 1;
    }
    match chars.get(*pos) {
        Some(']') => {
            *pos += 1;
            Ok(value)
        }
        _ => Err(format!("unterminated attribute predicate in `{input}`")),
    }
}

impl Compound {
    /// Check this compound against one element's tag and attribute map.
    pub(crate) fn matches(&self, tag: &str, attrs: &BTreeMap<String, String>) -> bool {
        if let Some(expected) = &self.tag {
            if !tag.eq_ignore_ascii_case(expected) {
                return false;
            }
        }
        if let Some(expected) = &self.id {
            if attrs.get("id").map(String::as_str) != Some(expected.as_str()) {
                return false;
            }
        }
        if !self.classes.is_empty() {
            let class_attr = attrs.get("class").map(String::as_str).unwrap_or("");
            let tokens: Vec<&str> = class_attr.split_whitespace().collect();
            if !self
                .classes
                .iter()
                .all(|class| tokens.contains(&class.as_str()))
            {
                return false;
            }
        }
        self.attrs.iter().all(|predicate| {
            let value = attrs.get(&predicate.name);
            match (&predicate.op, value) {
                (AttrOp::Exists, Some(_)) => true,
                (AttrOp::Equals(expected), Some(actual)) => actual == expected,
                (AttrOp::Contains(fragment), Some(actual)) => actual.contains(fragment.as_str()),
                (_, None) => false,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn parses_compound_classes() {
        let selector = Selector::parse(".nf-modal.interstitial-full-screen").unwrap();
        assert_eq!(selector.branches.len(), 1);
        let compound = &selector.branches[0].compounds[0];
        assert_eq!(compound.classes, vec!["nf-modal", "interstitial-full-screen"]);
    }

    #[test]
    fn parses_attribute_predicates() {
        let selector = Selector::parse("[data-uia=\"interrupt-pane\"]").unwrap();
        let compound = &selector.branches[0].compounds[0];
        assert_eq!(compound.attrs.len(), 1);
        assert!(matches!(compound.attrs[0].op, AttrOp::Equals(ref v) if v == "interrupt-pane"));
    }

    #[test]
    fn parses_descendant_and_list() {
        let selector =
            Selector::parse("video track[kind=\"subtitles\"], [class*=\"overlay\"]").unwrap();
        assert_eq!(selector.branches.len(), 2);
        assert_eq!(selector.branches[0].compounds.len(), 2);
    }

    #[test]
    fn quoted_values_may_contain_spaces() {
        let selector = Selector::parse("[aria-label=\"Audio & Subtitles\"]").unwrap();
        assert_eq!(selector.branches[0].compounds.len(), 1);
        let compound = &selector.branches[0].compounds[0];
        assert!(compound.matches("button", &attrs(&[("aria-label", "Audio & Subtitles")])));
    }

    #[test]
    fn universal_selector_matches_everything() {
        let selector = Selector::parse("*").unwrap();
        let compound = &selector.branches[0].compounds[0];
        assert!(compound.matches("div", &attrs(&[])));
        assert!(compound.matches("video", &attrs(&[("class", "anything")])));
    }

    #[test]
    fn rejects_unsupported_syntax() {
        assert!(Selector::parse("div > span").is_err());
        assert!(Selector::parse("a:hover").is_err());
        assert!(Selector::parse("").is_err());
    }

    #[test]
    fn compound_matching() {
        let selector = Selector::parse("div.modal[data-uia*=\"pane\"]").unwrap();
        let compound = &selector.branches[0].compounds[0];
        assert!(compound.matches("div", &attrs(&[("class", "modal wide"), ("data-uia", "interrupt-pane")])));
        assert!(!compound.matches("span", &attrs(&[("class", "modal"), ("data-uia", "pane")])));
        assert!(!compound.matches("div", &attrs(&[("class", "modality"), ("data-uia", "pane")])));
    }

    #[test]
    fn substring_attribute_match_hits_raw_value() {
        let selector = Selector::parse("[class*=\"overlay\"]").unwrap();
        let compound = &selector.branches[0].compounds[0];
        assert!(compound.matches("div", &attrs(&[("class", "playback-unified-overlay")])));
        assert!(!compound.matches("div", &attrs(&[("class", "player-controls")])));
    }
}
