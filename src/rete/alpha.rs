//! Alpha network: single-fact discrimination.
//!
//! An alpha memory holds the ids of every fact that passes one
//! `(fact type, canonical constraint set)` filter. Memories are shared: two
//! rules filtering the same type with semantically equal constraints feed
//! from one memory. Sharing is enforced by the network's canonical-key
//! interning map.

use crate::rete::pattern::ConstraintOp;
use crate::rete::wme::FactId;
use crate::schema::TypeId;
use crate::types::Value;
use std::collections::HashSet;

/// A compiled intra-fact constraint: field position, operator, literal.
///
/// The literal has already been widened to the declared field type, so
/// evaluation never coerces.
#[derive(Debug, Clone)]
pub(crate) struct AlphaTest {
    pub field: usize,
    pub op: ConstraintOp,
    pub value: Value,
}

impl AlphaTest {
    /// Evaluate against a fact's positional values
    pub fn eval(&self, values: &[Value]) -> bool {
        let actual = &values[self.field];
        match self.op {
            ConstraintOp::Eq => actual == &self.value,
            ConstraintOp::Ne => actual != &self.value,
            ConstraintOp::Lt => actual.ordered_cmp(&self.value).is_some_and(|o| o.is_lt()),
            ConstraintOp::Lte => actual.ordered_cmp(&self.value).is_some_and(|o| o.is_le()),
            ConstraintOp::Gt => actual.ordered_cmp(&self.value).is_some_and(|o| o.is_gt()),
            ConstraintOp::Gte => actual.ordered_cmp(&self.value).is_some_and(|o| o.is_ge()),
            ConstraintOp::In => match &self.value {
                Value::Array(items) => items.contains(actual),
                _ => false,
            },
        }
    }
}

/// One shared alpha memory: filter + member set + outgoing join nodes
#[derive(Debug)]
pub(crate) struct AlphaMemory {
    pub type_id: TypeId,
    pub tests: Vec<AlphaTest>,
    pub facts: HashSet<FactId>,
    /// Join nodes whose right input is this memory
    pub subscribers: Vec<usize>,
}

impl AlphaMemory {
    pub fn new(type_id: TypeId, tests: Vec<AlphaTest>) -> Self {
        Self {
            type_id,
            tests,
            facts: HashSet::new(),
            subscribers: Vec::new(),
        }
    }

    /// Whether a fact's values pass every test
    pub fn matches(&self, values: &[Value]) -> bool {
        self.tests.iter().all(|t| t.eval(values))
    }

    pub fn insert(&mut self, id: FactId) {
        self.facts.insert(id);
    }

    pub fn remove(&mut self, id: FactId) -> bool {
        self.facts.remove(&id)
    }

    pub fn clear(&mut self) {
        self.facts.clear();
    }
}
