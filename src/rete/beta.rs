//! Beta network: tokens, beta memories, and hash-indexed join nodes.
//!
//! Each rule compiles to a linear chain of join nodes. A join node pairs the
//! tokens at its left input with the facts of its right alpha memory, using
//! hash indexes keyed on the values of the binding variables shared between
//! the two sides. An empty join key puts everything in one bucket, which
//! degenerates to the Cartesian product.

use crate::rete::wme::FactId;
use std::collections::HashMap;

/// An ordered tuple of fact ids representing a partial or complete match of
/// a rule's patterns. Tokens are value-equal iff their id tuples are equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Token {
    facts: Vec<FactId>,
}

impl Token {
    /// The dummy top token: matches zero patterns
    pub(crate) fn empty() -> Self {
        Self::default()
    }

    /// Extend with one more matched fact
    pub(crate) fn extend(&self, id: FactId) -> Self {
        let mut facts = self.facts.clone();
        facts.push(id);
        Self { facts }
    }

    /// Matched fact ids, in pattern order
    pub fn facts(&self) -> &[FactId] {
        &self.facts
    }

    /// Whether this token includes the given fact
    pub fn contains(&self, id: FactId) -> bool {
        self.facts.contains(&id)
    }

    /// Number of patterns matched so far
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    /// True for the dummy top token
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}

/// Join key: canonical renderings of the shared-variable values, in key-var
/// order
pub(crate) type JoinKey = Vec<String>;

/// Token store at a join node's left input, hash-indexed by the node's join
/// key
#[derive(Debug, Default)]
pub(crate) struct BetaMemory {
    tokens: HashMap<JoinKey, Vec<Token>>,
}

impl BetaMemory {
    pub fn insert(&mut self, key: JoinKey, token: Token) {
        self.tokens.entry(key).or_default().push(token);
    }

    pub fn matching(&self, key: &JoinKey) -> &[Token] {
        self.tokens.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Withdraw every token that includes the given fact
    pub fn remove_containing(&mut self, id: FactId) {
        for bucket in self.tokens.values_mut() {
            bucket.retain(|t| !t.contains(id));
        }
        self.tokens.retain(|_, bucket| !bucket.is_empty());
    }

    pub fn clear(&mut self) {
        self.tokens.clear();
    }
}

/// Where a join node's extended tokens flow next
#[derive(Debug, Clone, Copy)]
pub(crate) enum JoinOutput {
    /// Left input of the next join node in the chain
    Join(usize),
    /// Terminal node of the rule
    Terminal(usize),
}

/// One join node: left beta memory, right alpha memory, shared-variable key
#[derive(Debug)]
pub(crate) struct JoinNode {
    /// Owning rule
    pub rule: usize,
    /// Pattern position within the rule (0-based)
    pub position: usize,
    /// Right input: alpha memory index
    pub alpha: usize,
    /// Shared variables, in canonical (sorted) order
    pub key_vars: Vec<String>,
    /// Per key var: (token position, field index) resolving it on the left
    pub left_fields: Vec<(usize, usize)>,
    /// Per key var: field index resolving it on the right fact
    pub right_fields: Vec<usize>,
    /// Left input memory
    pub left: BetaMemory,
    /// Right-side hash index over the alpha memory, keyed like the left
    pub right_index: HashMap<JoinKey, Vec<FactId>>,
    /// Downstream edge
    pub output: JoinOutput,
}

impl JoinNode {
    pub fn insert_right(&mut self, key: JoinKey, id: FactId) {
        self.right_index.entry(key).or_default().push(id);
    }

    pub fn matching_right(&self, key: &JoinKey) -> &[FactId] {
        self.right_index.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Drop a retracted fact from the right index
    pub fn remove_right(&mut self, id: FactId) {
        for bucket in self.right_index.values_mut() {
            bucket.retain(|f| *f != id);
        }
        self.right_index.retain(|_, bucket| !bucket.is_empty());
    }

    pub fn clear(&mut self) {
        self.left.clear();
        self.right_index.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_extension_and_equality() {
        let base = Token::empty();
        assert!(base.is_empty());
        let a = base.extend(FactId::new(1)).extend(FactId::new(2));
        let b = Token::empty().extend(FactId::new(1)).extend(FactId::new(2));
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
        assert!(a.contains(FactId::new(2)));
        assert!(!a.contains(FactId::new(3)));
    }

    #[test]
    fn test_beta_memory_buckets() {
        let mut memory = BetaMemory::default();
        let key: JoinKey = vec!["i:1".to_string()];
        memory.insert(key.clone(), Token::empty().extend(FactId::new(1)));
        memory.insert(key.clone(), Token::empty().extend(FactId::new(2)));
        let other: JoinKey = vec!["i:2".to_string()];
        memory.insert(other.clone(), Token::empty().extend(FactId::new(3)));

        assert_eq!(memory.matching(&key).len(), 2);
        assert_eq!(memory.matching(&other).len(), 1);

        memory.remove_containing(FactId::new(1));
        assert_eq!(memory.matching(&key).len(), 1);
        assert_eq!(memory.matching(&other).len(), 1);
    }

    #[test]
    fn test_empty_key_shares_one_bucket() {
        let mut memory = BetaMemory::default();
        memory.insert(Vec::new(), Token::empty().extend(FactId::new(1)));
        memory.insert(Vec::new(), Token::empty().extend(FactId::new(2)));
        assert_eq!(memory.matching(&Vec::new()).len(), 2);
    }
}
