//! Route pattern parsing.
//!
//! # Syntax
//! - `{name}` matches one path segment (`[^/]+`)
//! - `{name:regex}` matches `regex`, which may not contain capturing groups
//! - `[...]` marks an optional trailing part; optional parts may nest
//!   (`/engines[/{engine}[/{page}]]`) but can only close at the end
//!
//! # Design Decisions
//! - A pattern expands into one variant per optional depth, shortest first
//! - Variants without placeholders are static and matched by exact lookup
//! - Placeholder regexes are anchored and checked when the route is declared

use regex::Regex;

use crate::routing::RoutingError;

/// Regex used by placeholders that do not specify their own.
pub const DEFAULT_PLACEHOLDER_REGEX: &str = "[^/]+";

/// One piece of a parsed pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Placeholder { name: String, regex: String },
}

/// A pattern with its optional parts resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternVariant {
    segments: Vec<Segment>,
}

impl PatternVariant {
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns true if the variant contains no placeholders.
    pub fn is_static(&self) -> bool {
        self.segments
            .iter()
            .all(|s| matches!(s, Segment::Literal(_)))
    }

    /// The literal path of a static variant.
    pub fn static_path(&self) -> Option<String> {
        if !self.is_static() {
            return None;
        }
        Some(
            self.segments
                .iter()
                .filter_map(|s| match s {
                    Segment::Literal(text) => Some(text.as_str()),
                    Segment::Placeholder { .. } => None,
                })
                .collect(),
        )
    }

    /// Anchored regex with one capture group per placeholder.
    pub fn regex(&self) -> String {
        let mut out = String::from("^");
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(&regex::escape(text)),
                Segment::Placeholder { regex, .. } => {
                    out.push('(');
                    out.push_str(regex);
                    out.push(')');
                }
            }
        }
        out.push('$');
        out
    }

    /// Placeholder names in capture order.
    pub fn param_names(&self) -> Vec<String> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Placeholder { name, .. } => Some(name.clone()),
                Segment::Literal(_) => None,
            })
            .collect()
    }
}

/// Parse a route pattern into its variants.
pub fn parse_pattern(pattern: &str) -> Result<Vec<PatternVariant>, RoutingError> {
    let invalid = |reason: String| RoutingError::InvalidPattern {
        pattern: pattern.to_string(),
        reason,
    };

    if !pattern.starts_with('/') {
        return Err(invalid("pattern must start with '/'".into()));
    }

    let without_closing = pattern.trim_end_matches(']');
    let optional_count = pattern.len() - without_closing.len();
    let parts = split_optional(without_closing).map_err(invalid)?;

    if parts.len() - 1 != optional_count {
        return Err(invalid(
            "number of opening '[' and closing ']' does not match".into(),
        ));
    }

    let mut current = String::with_capacity(without_closing.len());
    let mut variants = Vec::with_capacity(parts.len());
    for (i, part) in parts.iter().enumerate() {
        if i > 0 && part.is_empty() {
            return Err(invalid("empty optional part".into()));
        }
        current.push_str(part);
        variants.push(parse_placeholders(&current).map_err(invalid)?);
    }

    Ok(variants)
}

/// Split on `[` outside of placeholders.
fn split_optional(route: &str) -> Result<Vec<&str>, String> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in route.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| format!("unexpected '}}' at offset {i}"))?;
            }
            '[' if depth == 0 => {
                parts.push(&route[start..i]);
                start = i + 1;
            }
            ']' if depth == 0 => {
                return Err("optional segments can only occur at the end of a route".into());
            }
            _ => {}
        }
    }

    if depth != 0 {
        return Err("unclosed '{' in placeholder".into());
    }

    parts.push(&route[start..]);
    Ok(parts)
}

fn parse_placeholders(route: &str) -> Result<PatternVariant, String> {
    let mut segments = Vec::new();
    let mut names: Vec<String> = Vec::new();
    let mut literal = String::new();
    let mut rest = route;

    while let Some(open) = rest.find('{') {
        literal.push_str(&rest[..open]);
        let close = matching_brace(&rest[open..])
            .map(|offset| open + offset)
            .ok_or_else(|| "unclosed '{' in placeholder".to_string())?;
        let (name, regex) = parse_placeholder(&rest[open + 1..close])?;

        if names.contains(&name) {
            return Err(format!("cannot use the same placeholder `{name}` twice"));
        }
        names.push(name.clone());

        if !literal.is_empty() {
            segments.push(Segment::Literal(std::mem::take(&mut literal)));
        }
        segments.push(Segment::Placeholder { name, regex });
        rest = &rest[close + 1..];
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }

    Ok(PatternVariant { segments })
}

/// Offset of the `}` closing the `{` at the start of `s`.
fn matching_brace(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_placeholder(body: &str) -> Result<(String, String), String> {
    let (name, regex) = match body.split_once(':') {
        Some((name, regex)) => (name.trim(), regex.trim()),
        None => (body.trim(), DEFAULT_PLACEHOLDER_REGEX),
    };

    let mut chars = name.chars();
    let valid_name = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid_name {
        return Err(format!("invalid placeholder name `{name}`"));
    }

    if regex.is_empty() {
        return Err(format!("empty regex for placeholder `{name}`"));
    }

    let compiled = Regex::new(&format!("^(?:{regex})$"))
        .map_err(|e| format!("invalid regex for placeholder `{name}`: {e}"))?;
    if compiled.captures_len() > 1 {
        return Err(format!(
            "regex `{regex}` for placeholder `{name}` contains a capturing group"
        ));
    }

    Ok((name.to_string(), regex.to_string()))
}
