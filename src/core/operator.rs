//! Canonical comparison operators and their shorthand aliases

use serde::{Serialize, Serializer};
use std::fmt;

/// A canonical query operator
///
/// | Canonical       | Alias |
/// |-----------------|-------|
/// | `$exists`       | `~`   |
/// | `$equal`        | `==`  |
/// | `$diff`         | `!=`  |
/// | `$less`         | `<`   |
/// | `$lessEqual`    | `<=`  |
/// | `$greater`      | `>`   |
/// | `$greaterEqual` | `>=`  |
/// | `$contains`     |       |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operator {
    Exists,
    Equal,
    Diff,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Contains,
}

impl Operator {
    pub const ALL: [Operator; 8] = [
        Operator::Exists,
        Operator::Equal,
        Operator::Diff,
        Operator::Less,
        Operator::LessEqual,
        Operator::Greater,
        Operator::GreaterEqual,
        Operator::Contains,
    ];

    /// Full operator name as used in canonical queries
    pub fn canonical_name(self) -> &'static str {
        match self {
            Operator::Exists => "$exists",
            Operator::Equal => "$equal",
            Operator::Diff => "$diff",
            Operator::Less => "$less",
            Operator::LessEqual => "$lessEqual",
            Operator::Greater => "$greater",
            Operator::GreaterEqual => "$greaterEqual",
            Operator::Contains => "$contains",
        }
    }

    /// Shorthand alias, if the operator has one
    pub fn alias(self) -> Option<&'static str> {
        match self {
            Operator::Exists => Some("~"),
            Operator::Equal => Some("=="),
            Operator::Diff => Some("!="),
            Operator::Less => Some("<"),
            Operator::LessEqual => Some("<="),
            Operator::Greater => Some(">"),
            Operator::GreaterEqual => Some(">="),
            Operator::Contains => None,
        }
    }

    pub fn from_canonical(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.canonical_name() == key)
    }

    pub fn from_alias(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.alias() == Some(key))
    }

    /// Ordering operators require a numeric or date operand
    pub fn is_ordering(self) -> bool {
        matches!(
            self,
            Operator::Less | Operator::LessEqual | Operator::Greater | Operator::GreaterEqual
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

impl Serialize for Operator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.canonical_name())
    }
}
