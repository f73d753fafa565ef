//! Textual rule grammar.
//!
//! ```text
//! rule        := antecedents "->" consequent [reliability]
//! antecedents := atom ("&" atom)*
//! reliability := decimal in [0, 1], default 1
//! ```
//!
//! The parser is stateless; it only splits text. Atom interning happens in
//! [`crate::FactStore`].

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::ValidationError;
use crate::rule::Reliability;

/// A parsed, not yet interned, rule.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSpec {
    /// Left-hand side atoms, in textual order.
    pub antecedents: Vec<String>,
    /// Right-hand side atom.
    pub consequent: String,
    /// Rule weight.
    pub reliability: Reliability,
}

impl RuleSpec {
    /// Build a spec from already-split parts.
    ///
    /// # Errors
    ///
    /// Fails if there are no antecedents, an atom is empty or contains
    /// whitespace, or the reliability is out of range.
    pub fn new<I, S>(antecedents: I, consequent: impl Into<String>, reliability: f64) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let antecedents: Vec<String> = antecedents.into_iter().map(Into::into).collect();
        let consequent = consequent.into();
        if antecedents.is_empty() {
            return Err(ValidationError::MalformedRule {
                rule: format!("-> {consequent}"),
                reason: "a rule needs at least one antecedent".to_string(),
            });
        }
        for atom in antecedents.iter().chain(std::iter::once(&consequent)) {
            validate_atom(atom)?;
        }
        Ok(Self {
            antecedents,
            consequent,
            reliability: Reliability::new(reliability)?,
        })
    }
}

fn validate_atom(atom: &str) -> Result<(), ValidationError> {
    if atom.is_empty() {
        return Err(ValidationError::EmptyAtom);
    }
    if atom.chars().any(|c| c.is_whitespace() || c == '&') || atom.contains("->") {
        return Err(ValidationError::MalformedRule {
            rule: atom.to_string(),
            reason: format!("'{atom}' is not a valid atom"),
        });
    }
    Ok(())
}

fn consequent_pattern() -> Result<&'static Regex, ValidationError> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    if let Some(re) = PATTERN.get() {
        return Ok(re);
    }
    let compiled = Regex::new(r"^(?P<atom>[^\s&]+)(?:\s+(?P<rel>[0-9]*\.?[0-9]+))?$").map_err(|e| {
        ValidationError::InvalidConfig {
            reason: format!("invalid consequent pattern: {e}"),
        }
    })?;
    Ok(PATTERN.get_or_init(|| compiled))
}

/// Parse one rule line such as `a & non-b -> c .7`.
///
/// # Errors
///
/// Returns `ValidationError::MalformedRule` when the line does not follow the grammar.
pub fn parse_rule(line: &str) -> Result<RuleSpec, ValidationError> {
    let malformed = |reason: &str| ValidationError::MalformedRule {
        rule: line.trim().to_string(),
        reason: reason.to_string(),
    };

    let mut sides = line.split("->");
    let (Some(left), Some(right), None) = (sides.next(), sides.next(), sides.next()) else {
        return Err(malformed("expected exactly one '->'"));
    };

    let antecedents: Vec<String> = left.split('&').map(|a| a.trim().to_string()).collect();
    if antecedents.iter().any(String::is_empty) {
        return Err(malformed("empty antecedent"));
    }

    let right = right.trim();
    if right.is_empty() {
        return Err(malformed("missing consequent"));
    }
    let caps = consequent_pattern()?
        .captures(right)
        .ok_or_else(|| malformed("consequent must be a single atom optionally followed by a reliability"))?;
    let consequent = caps
        .name("atom")
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| malformed("missing consequent"))?;
    let reliability = match caps.name("rel") {
        Some(m) => m
            .as_str()
            .parse::<f64>()
            .map_err(|e| malformed(&format!("bad reliability: {e}")))?,
        None => 1.0,
    };

    RuleSpec::new(antecedents, consequent, reliability)
}

/// Parse a multi-line rule set. Blank lines and lines starting with `#` are skipped.
///
/// # Errors
///
/// Fails on the first malformed line; the reason names its line number.
pub fn parse_rule_set(text: &str) -> Result<Vec<RuleSpec>, ValidationError> {
    let mut specs = Vec::new();
    for (n, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let spec = parse_rule(trimmed).map_err(|e| match e {
            ValidationError::MalformedRule { rule, reason } => ValidationError::MalformedRule {
                rule,
                reason: format!("line {}: {reason}", n + 1),
            },
            other => other,
        })?;
        specs.push(spec);
    }
    Ok(specs)
}

/// All atoms mentioned by a rule set.
#[must_use]
pub fn vocabulary(specs: &[RuleSpec]) -> BTreeSet<String> {
    specs
        .iter()
        .flat_map(|s| s.antecedents.iter().chain(std::iter::once(&s.consequent)))
        .cloned()
        .collect()
}
