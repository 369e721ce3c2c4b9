//! # Validator Rule Grammar
//!
//! Parses the compact rule grammar carried by `#[apivalidator = "..."]` field
//! attributes into a [`RuleSet`].
//!
//! ## Grammar
//!
//! A tag is a comma-separated list of entries, evaluated left to right:
//!
//! | entry            | effect                                      |
//! |------------------|---------------------------------------------|
//! | `required`       | value must be present and non-empty         |
//! | `default=V`      | value used when the parameter is absent     |
//! | `enum=A\|B\|C`   | value must be one of the listed literals    |
//! | `min=N`, `>=N`   | value (or string length) must be `>= N`     |
//! | `max=N`, `<=N`   | value (or string length) must be `<= N`     |
//! | `>N`             | value (or string length) must be `> N`      |
//! | `<N`             | value (or string length) must be `< N`      |
//! | `paramname=NAME` | external binding key (default: field name lower-cased) |
//!
//! A later entry for the same behavior overwrites an earlier one. The tag
//! value `-` excludes the field entirely and is handled by [`parse_tag`]
//! before the grammar is consulted.
//!
//! ```rust
//! use apigen::validator::{RuleKind, RuleSet};
//!
//! let rules = RuleSet::parse("required,>=0").unwrap();
//! assert!(rules.has(RuleKind::Required));
//! assert_eq!(rules.literal(RuleKind::Min), Some("0"));
//! ```

use std::collections::BTreeMap;
use std::fmt;

use crate::spec::Kind;

/// Tag value that removes a field from binding and validation.
pub const EXCLUDE_TAG: &str = "-";

/// One validator behavior. The declaration order is the order in which the
/// emitted validation applies the rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RuleKind {
    Required,
    Default,
    Enum,
    Min,
    Max,
    Greater,
    Less,
}

impl RuleKind {
    /// Name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            RuleKind::Required => "required",
            RuleKind::Default => "default",
            RuleKind::Enum => "enum",
            RuleKind::Min => "min",
            RuleKind::Max => "max",
            RuleKind::Greater => "greater",
            RuleKind::Less => "less",
        }
    }

    /// Comparison operator of the bound rules.
    pub fn operator(self) -> Option<&'static str> {
        match self {
            RuleKind::Min => Some(">="),
            RuleKind::Max => Some("<="),
            RuleKind::Greater => Some(">"),
            RuleKind::Less => Some("<"),
            _ => None,
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Operand attached to an active rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    None,
    Literal(String),
    List(Vec<String>),
}

/// Composed validator behaviors of one field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: BTreeMap<RuleKind, Operand>,
    param_name: Option<String>,
}

/// An entry the grammar does not recognize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRule {
    pub entry: String,
}

impl fmt::Display for UnknownRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: unknown rule", self.entry)
    }
}

impl std::error::Error for UnknownRule {}

/// Parse a raw tag value.
///
/// Returns `Ok(None)` when the field is excluded (`-`), an empty rule set for
/// an empty value, and the parsed rules otherwise.
pub fn parse_tag(tag: &str) -> Result<Option<RuleSet>, UnknownRule> {
    if tag == EXCLUDE_TAG {
        return Ok(None);
    }
    if tag.is_empty() {
        return Ok(Some(RuleSet::default()));
    }
    RuleSet::parse(tag).map(Some)
}

impl RuleSet {
    /// Parse a comma-separated list of rule entries.
    pub fn parse(s: &str) -> Result<Self, UnknownRule> {
        let mut set = RuleSet::default();

        for entry in s.split(',') {
            if let Some(name) = entry.strip_prefix("paramname=") {
                set.param_name = Some(name.to_string()).filter(|n| !n.is_empty());
            } else if entry == "required" {
                set.rules.insert(RuleKind::Required, Operand::None);
            } else if let Some(v) = entry.strip_prefix("default=") {
                set.set_literal(RuleKind::Default, v);
            } else if let Some(v) = entry.strip_prefix("enum=") {
                let values = v.split('|').map(str::to_string).collect();
                set.rules.insert(RuleKind::Enum, Operand::List(values));
            } else if let Some(v) = entry.strip_prefix("min=") {
                set.set_literal(RuleKind::Min, v);
            } else if let Some(v) = entry.strip_prefix("max=") {
                set.set_literal(RuleKind::Max, v);
            } else if let Some(v) = entry.strip_prefix(">=") {
                set.set_literal(RuleKind::Min, v);
            } else if let Some(v) = entry.strip_prefix("<=") {
                set.set_literal(RuleKind::Max, v);
            } else if let Some(v) = entry.strip_prefix('>') {
                set.set_literal(RuleKind::Greater, v);
            } else if let Some(v) = entry.strip_prefix('<') {
                set.set_literal(RuleKind::Less, v);
            } else {
                return Err(UnknownRule {
                    entry: entry.to_string(),
                });
            }
        }

        Ok(set)
    }

    fn set_literal(&mut self, kind: RuleKind, value: &str) {
        self.rules.insert(kind, Operand::Literal(value.to_string()));
    }

    pub fn has(&self, kind: RuleKind) -> bool {
        self.rules.contains_key(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Active rules in application order.
    pub fn kinds(&self) -> impl Iterator<Item = RuleKind> + '_ {
        self.rules.keys().copied()
    }

    /// Scalar operand of `kind`, if that rule is active.
    pub fn literal(&self, kind: RuleKind) -> Option<&str> {
        match self.rules.get(&kind) {
            Some(Operand::Literal(v)) => Some(v),
            _ => None,
        }
    }

    /// Allowed values of the enum rule.
    pub fn enum_values(&self) -> Option<&[String]> {
        match self.rules.get(&RuleKind::Enum) {
            Some(Operand::List(values)) => Some(values),
            _ => None,
        }
    }

    pub fn param_name(&self) -> Option<&str> {
        self.param_name.as_deref()
    }

    /// Required without a default: the only case where absence is an error.
    pub fn is_required_without_default(&self) -> bool {
        self.has(RuleKind::Required) && !self.has(RuleKind::Default)
    }
}

/// Check every active rule of `rules` against the field kind.
///
/// Returns the first mismatch as a message such as
/// `enum rule not applicable for float64 type`.
pub fn check_rules(kind: Kind, rules: &RuleSet) -> Result<(), String> {
    for rule in rules.kinds() {
        match rule {
            RuleKind::Required => {}
            RuleKind::Default => {
                let v = rules.literal(rule).unwrap_or_default();
                kind.literal(v)
                    .map_err(|e| format!("default rule: {e}"))?;
            }
            RuleKind::Enum => {
                if !kind.supports_enum() {
                    return Err(format!("enum rule not applicable for {kind} type"));
                }
                for v in rules.enum_values().unwrap_or_default() {
                    kind.literal(v).map_err(|e| format!("enum rule: {e}"))?;
                }
            }
            RuleKind::Min | RuleKind::Max | RuleKind::Greater | RuleKind::Less => {
                let v = rules.literal(rule).unwrap_or_default();
                kind.bound(v).map_err(|e| format!("{rule} rule: {e}"))?;
            }
        }
    }
    Ok(())
}
