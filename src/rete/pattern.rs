//! Pattern IR: the compiled-from representation of one rule condition.
//!
//! A pattern names a fact type, a set of intra-fact constraints against
//! literals, and a set of variable bindings. Bindings that reuse a variable
//! from an earlier pattern become join keys in the beta network.

use crate::types::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Comparison operators usable in intra-fact constraints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintOp {
    /// Equality
    Eq,
    /// Inequality
    Ne,
    /// Less than
    Lt,
    /// Less than or equal
    Lte,
    /// Greater than
    Gt,
    /// Greater than or equal
    Gte,
    /// Membership in a literal array
    In,
}

impl ConstraintOp {
    /// Parse an operator from its symbolic or mnemonic spelling
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "==" | "eq" => Some(ConstraintOp::Eq),
            "!=" | "ne" => Some(ConstraintOp::Ne),
            "<" | "lt" => Some(ConstraintOp::Lt),
            "<=" | "lte" => Some(ConstraintOp::Lte),
            ">" | "gt" => Some(ConstraintOp::Gt),
            ">=" | "gte" => Some(ConstraintOp::Gte),
            "in" => Some(ConstraintOp::In),
            _ => None,
        }
    }

    /// Symbolic spelling
    pub fn symbol(&self) -> &'static str {
        match self {
            ConstraintOp::Eq => "==",
            ConstraintOp::Ne => "!=",
            ConstraintOp::Lt => "<",
            ConstraintOp::Lte => "<=",
            ConstraintOp::Gt => ">",
            ConstraintOp::Gte => ">=",
            ConstraintOp::In => "in",
        }
    }

    /// Whether this operator requires an ordered field type
    pub fn is_ordering(&self) -> bool {
        matches!(
            self,
            ConstraintOp::Lt | ConstraintOp::Lte | ConstraintOp::Gt | ConstraintOp::Gte
        )
    }

    /// Stable rank used when canonicalizing constraint sets
    pub(crate) fn rank(&self) -> u8 {
        match self {
            ConstraintOp::Eq => 0,
            ConstraintOp::Ne => 1,
            ConstraintOp::Lt => 2,
            ConstraintOp::Lte => 3,
            ConstraintOp::Gt => 4,
            ConstraintOp::Gte => 5,
            ConstraintOp::In => 6,
        }
    }
}

impl fmt::Display for ConstraintOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// One intra-fact constraint: `field op literal`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    /// Field name on the pattern's fact type
    pub field: String,
    /// Comparison operator
    pub op: ConstraintOp,
    /// Literal to compare against (an `Array` for `In`)
    pub value: Value,
}

impl Constraint {
    /// Create a constraint
    pub fn new(field: impl Into<String>, op: ConstraintOp, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }
}

/// A variable binding: the value of `field` on the matching fact is bound to
/// `variable`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    /// Field name on the pattern's fact type
    pub field: String,
    /// Variable name (conventionally `$`-prefixed, but any string works)
    pub variable: String,
}

/// One rule condition: fact type + constraints + bindings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    /// Fact type this pattern matches
    pub fact_type: String,
    /// Intra-fact constraints, all of which must hold
    pub constraints: Vec<Constraint>,
    /// Variable bindings extracted from the matching fact
    pub bindings: Vec<Binding>,
}

impl Pattern {
    /// Start a pattern for a fact type
    pub fn new(fact_type: impl Into<String>) -> Self {
        Self {
            fact_type: fact_type.into(),
            constraints: Vec::new(),
            bindings: Vec::new(),
        }
    }

    /// Builder: add a constraint `field op value`
    pub fn where_field(
        mut self,
        field: impl Into<String>,
        op: ConstraintOp,
        value: impl Into<Value>,
    ) -> Self {
        self.constraints.push(Constraint::new(field, op, value));
        self
    }

    /// Builder: bind a field's value to a variable
    pub fn bind(mut self, field: impl Into<String>, variable: impl Into<String>) -> Self {
        self.bindings.push(Binding {
            field: field.into(),
            variable: variable.into(),
        });
        self
    }

    /// Variables bound by this pattern
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().map(|b| b.variable.as_str())
    }
}
