//! Rule definitions: patterns plus salience plus an action.

use crate::engine::Engine;
use crate::errors::Result;
use crate::rete::pattern::Pattern;
use crate::rete::wme::MatchedFact;

/// Index of a registered rule within one engine
pub type RuleId = usize;

/// A rule action: called with the engine and the tuple of matched facts, one
/// per pattern, in pattern order. Actions may declare, retract, and halt on
/// the engine they receive.
pub type RuleAction = Box<dyn FnMut(&mut Engine, &[MatchedFact]) -> Result<()>>;

/// A rule definition ready for registration
pub struct Rule {
    /// Rule name, used in errors and logs
    pub name: String,
    /// Priority; higher fires first (default 0)
    pub salience: i32,
    /// Patterns, all of which must match (at least one required)
    pub patterns: Vec<Pattern>,
    pub(crate) action: Option<RuleAction>,
}

impl Rule {
    /// Start a rule definition
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            salience: 0,
            patterns: Vec::new(),
            action: None,
        }
    }

    /// Builder: set the salience
    pub fn salience(mut self, salience: i32) -> Self {
        self.salience = salience;
        self
    }

    /// Builder: append a pattern
    pub fn when(mut self, pattern: Pattern) -> Self {
        self.patterns.push(pattern);
        self
    }

    /// Builder: set the action. A rule registered without one gets a no-op.
    pub fn then<F>(mut self, action: F) -> Self
    where
        F: FnMut(&mut Engine, &[MatchedFact]) -> Result<()> + 'static,
    {
        self.action = Some(Box::new(action));
        self
    }

    pub(crate) fn take_action(&mut self) -> RuleAction {
        self.action.take().unwrap_or_else(|| Box::new(|_, _| Ok(())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rete::pattern::{ConstraintOp, Pattern};

    #[test]
    fn test_rule_builder() {
        let rule = Rule::new("tachycardia")
            .salience(100)
            .when(Pattern::new("Patient").where_field("heartbeat", ConstraintOp::Gt, 120i64));
        assert_eq!(rule.name, "tachycardia");
        assert_eq!(rule.salience, 100);
        assert_eq!(rule.patterns.len(), 1);
        assert!(rule.action.is_none());
    }

    #[test]
    fn test_take_action_consumes_the_action() {
        let mut rule = Rule::new("noisy").then(|_, _| Ok(()));
        assert!(rule.action.is_some());
        let _action = rule.take_action();
        assert!(rule.action.is_none());
    }
}
