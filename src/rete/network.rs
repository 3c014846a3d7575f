//! The compiled Rete network: shared alpha memories, per-rule join chains,
//! terminal nodes, and incremental assert/retract propagation.
//!
//! Compilation is two-phase: a pattern list is first planned against the
//! schema registry (all errors surface here, with nothing installed), then
//! the plan is installed into the arenas. Alpha memories are interned by
//! `(fact type, canonical constraint set)` so semantically equal filters are
//! shared across rules; join chains are per-rule.

use crate::errors::{EngineError, Result};
use crate::rete::agenda::Agenda;
use crate::rete::alpha::{AlphaMemory, AlphaTest};
use crate::rete::beta::{BetaMemory, JoinKey, JoinNode, JoinOutput, Token};
use crate::rete::pattern::{ConstraintOp, Pattern};
use crate::rete::rule::RuleId;
use crate::rete::wme::{FactId, WorkingMemory};
use crate::schema::{coerce, TypeId, TypeRegistry};
use crate::types::{FieldType, Value};
use log::debug;
use std::collections::{HashMap, HashSet};

/// Terminal node: owns the rule's complete matches and their agenda entries
#[derive(Debug)]
pub(crate) struct TerminalNode {
    pub rule: RuleId,
    pub salience: i32,
    /// Live complete tokens and the sequence number of their activation
    pub activations: HashMap<Token, u64>,
}

/// Planned (not yet installed) compilation of one pattern
struct PatternPlan {
    type_id: TypeId,
    tests: Vec<AlphaTest>,
    canonical: String,
    key_vars: Vec<String>,
    left_fields: Vec<(usize, usize)>,
    right_fields: Vec<usize>,
}

/// The discrimination network shared by all rules of one engine
#[derive(Debug, Default)]
pub(crate) struct ReteNetwork {
    alphas: Vec<AlphaMemory>,
    /// Interning map enforcing alpha memory sharing
    alpha_index: HashMap<(TypeId, String), usize>,
    /// Per fact type: alpha memories to test on assert
    type_subscribers: HashMap<TypeId, Vec<usize>>,
    joins: Vec<JoinNode>,
    terminals: Vec<TerminalNode>,
    /// First join node of each rule's chain, indexed by rule id
    entry_joins: Vec<usize>,
}

impl ReteNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alpha_memory_count(&self) -> usize {
        self.alphas.len()
    }

    pub fn rule_count(&self) -> usize {
        self.terminals.len()
    }

    // ---------------------------------------------------------------- compile

    /// Compile and install one rule. On error nothing is installed.
    pub fn compile_rule(
        &mut self,
        registry: &TypeRegistry,
        rule_id: RuleId,
        name: &str,
        salience: i32,
        patterns: &[Pattern],
    ) -> Result<()> {
        let plans = plan_patterns(registry, name, patterns)?;

        let terminal_id = self.terminals.len();
        let mut join_ids = Vec::with_capacity(plans.len());
        for (position, plan) in plans.into_iter().enumerate() {
            let alpha = self.intern_alpha(plan.type_id, plan.canonical, plan.tests);
            let join_id = self.joins.len();
            self.joins.push(JoinNode {
                rule: rule_id,
                position,
                alpha,
                key_vars: plan.key_vars,
                left_fields: plan.left_fields,
                right_fields: plan.right_fields,
                left: BetaMemory::default(),
                right_index: HashMap::new(),
                output: JoinOutput::Terminal(terminal_id),
            });
            self.alphas[alpha].subscribers.push(join_id);
            join_ids.push(join_id);
        }
        for pair in join_ids.windows(2) {
            self.joins[pair[0]].output = JoinOutput::Join(pair[1]);
        }
        for &join_id in &join_ids {
            let join = &self.joins[join_id];
            debug!(
                "rule {} '{}': join {} keyed on {:?}",
                join.rule, name, join.position, join.key_vars
            );
        }
        self.terminals.push(TerminalNode {
            rule: rule_id,
            salience,
            activations: HashMap::new(),
        });
        self.entry_joins.push(join_ids[0]);
        Ok(())
    }

    fn intern_alpha(&mut self, type_id: TypeId, canonical: String, tests: Vec<AlphaTest>) -> usize {
        if let Some(&existing) = self.alpha_index.get(&(type_id, canonical.clone())) {
            return existing;
        }
        let id = self.alphas.len();
        self.alphas.push(AlphaMemory::new(type_id, tests));
        self.alpha_index.insert((type_id, canonical), id);
        self.type_subscribers.entry(type_id).or_default().push(id);
        id
    }

    fn rule_chain(&self, rule_id: RuleId) -> Vec<usize> {
        let mut chain = vec![self.entry_joins[rule_id]];
        loop {
            match self.joins[*chain.last().unwrap()].output {
                JoinOutput::Join(next) => chain.push(next),
                JoinOutput::Terminal(_) => return chain,
            }
        }
    }

    /// Bring a freshly compiled rule up to date with working memory:
    /// backfill its alpha memberships and right indexes, then seed the dummy
    /// top token so existing matches flow to the agenda.
    pub fn activate_rule(&mut self, wm: &WorkingMemory, agenda: &mut Agenda, rule_id: RuleId) {
        let chain = self.rule_chain(rule_id);
        for &join_id in &chain {
            let alpha = self.joins[join_id].alpha;
            let type_id = self.alphas[alpha].type_id;
            for fact_id in wm.ids_of_type(type_id) {
                if let Some(wme) = wm.get(fact_id) {
                    if self.alphas[alpha].matches(&wme.values) {
                        self.alphas[alpha].insert(fact_id);
                    }
                }
            }
            let members: Vec<FactId> = self.alphas[alpha].facts.iter().copied().collect();
            for fact_id in members {
                if let Some(wme) = wm.get(fact_id) {
                    let key = self.right_key(join_id, &wme.values);
                    self.joins[join_id].insert_right(key, fact_id);
                }
            }
        }
        self.left_activate(wm, agenda, chain[0], Token::empty());
    }

    // -------------------------------------------------------------- propagate

    /// Push a newly declared fact through the alpha network and any joins it
    /// unlocks.
    pub fn assert_fact(&mut self, wm: &WorkingMemory, agenda: &mut Agenda, id: FactId) {
        let Some(wme) = wm.get(id) else { return };
        let Some(candidates) = self.type_subscribers.get(&wme.type_id).cloned() else {
            return;
        };
        for alpha in candidates {
            if !self.alphas[alpha].matches(&wme.values) {
                continue;
            }
            self.alphas[alpha].insert(id);
            debug!("fact {} entered alpha memory {}", id, alpha);
            let joins = self.alphas[alpha].subscribers.clone();
            for join_id in joins {
                self.right_activate(wm, agenda, join_id, id);
            }
        }
    }

    /// Withdraw a retracted fact: alpha memberships, right indexes, every
    /// token built on it, and the activations those tokens supported.
    pub fn retract_fact(&mut self, agenda: &mut Agenda, id: FactId) {
        for alpha in &mut self.alphas {
            alpha.remove(id);
        }
        for join in &mut self.joins {
            join.remove_right(id);
            join.left.remove_containing(id);
        }
        for terminal in &mut self.terminals {
            let withdrawn: Vec<Token> = terminal
                .activations
                .keys()
                .filter(|t| t.contains(id))
                .cloned()
                .collect();
            for token in withdrawn {
                terminal.activations.remove(&token);
                agenda.remove(terminal.rule, &token);
                debug!("withdrew activation of rule {} on {:?}", terminal.rule, token);
            }
        }
    }

    /// Clear every memory and terminal, then reseed the dummy tokens.
    /// Network wiring (and therefore compiled rules) survives.
    pub fn reset(&mut self, wm: &WorkingMemory, agenda: &mut Agenda) {
        for alpha in &mut self.alphas {
            alpha.clear();
        }
        for join in &mut self.joins {
            join.clear();
        }
        for terminal in &mut self.terminals {
            terminal.activations.clear();
        }
        let entries = self.entry_joins.clone();
        for join_id in entries {
            self.left_activate(wm, agenda, join_id, Token::empty());
        }
    }

    fn right_key(&self, join_id: usize, values: &[Value]) -> JoinKey {
        self.joins[join_id]
            .right_fields
            .iter()
            .map(|&field| values[field].index_key())
            .collect()
    }

    fn left_key(&self, wm: &WorkingMemory, join_id: usize, token: &Token) -> Option<JoinKey> {
        let join = &self.joins[join_id];
        let mut key = Vec::with_capacity(join.left_fields.len());
        for &(position, field) in &join.left_fields {
            let id = *token.facts().get(position)?;
            let wme = wm.get(id)?;
            key.push(wme.values[field].index_key());
        }
        Some(key)
    }

    /// A fact arrived in this join's right alpha memory
    fn right_activate(&mut self, wm: &WorkingMemory, agenda: &mut Agenda, join_id: usize, id: FactId) {
        let Some(wme) = wm.get(id) else { return };
        let key = self.right_key(join_id, &wme.values);
        self.joins[join_id].insert_right(key.clone(), id);
        let matched: Vec<Token> = self.joins[join_id].left.matching(&key).to_vec();
        let output = self.joins[join_id].output;
        for token in matched {
            self.propagate(wm, agenda, output, token.extend(id));
        }
    }

    /// A token arrived from upstream at this join's left input
    fn left_activate(&mut self, wm: &WorkingMemory, agenda: &mut Agenda, join_id: usize, token: Token) {
        let Some(key) = self.left_key(wm, join_id, &token) else {
            return;
        };
        self.joins[join_id].left.insert(key.clone(), token.clone());
        let matched: Vec<FactId> = self.joins[join_id].matching_right(&key).to_vec();
        let output = self.joins[join_id].output;
        for id in matched {
            self.propagate(wm, agenda, output, token.extend(id));
        }
    }

    fn propagate(&mut self, wm: &WorkingMemory, agenda: &mut Agenda, output: JoinOutput, token: Token) {
        match output {
            JoinOutput::Join(next) => self.left_activate(wm, agenda, next, token),
            JoinOutput::Terminal(terminal_id) => {
                let terminal = &mut self.terminals[terminal_id];
                if !terminal.activations.contains_key(&token) {
                    let sequence = agenda.insert(terminal.rule, token.clone(), terminal.salience);
                    terminal.activations.insert(token, sequence);
                }
            }
        }
    }
}

// ------------------------------------------------------------------ planning

fn plan_patterns(
    registry: &TypeRegistry,
    rule_name: &str,
    patterns: &[Pattern],
) -> Result<Vec<PatternPlan>> {
    if patterns.is_empty() {
        return Err(EngineError::InvalidConstraint {
            message: format!("rule '{}' has no patterns", rule_name),
        });
    }

    // variable -> (pattern position, field index, field type) of its binder
    let mut bound: HashMap<String, (usize, usize, FieldType)> = HashMap::new();
    let mut plans = Vec::with_capacity(patterns.len());

    for (position, pattern) in patterns.iter().enumerate() {
        let type_id = registry
            .get(&pattern.fact_type)
            .ok_or_else(|| EngineError::UnknownFactType {
                name: pattern.fact_type.clone(),
            })?;
        let schema = registry.schema(type_id);

        let mut tests = Vec::with_capacity(pattern.constraints.len());
        for constraint in &pattern.constraints {
            let field = schema.field_index(&constraint.field).ok_or_else(|| {
                EngineError::UnknownField {
                    fact_type: pattern.fact_type.clone(),
                    field: constraint.field.clone(),
                }
            })?;
            let field_ty = schema.field_type(field);
            let value = check_literal(&pattern.fact_type, &constraint.field, field_ty, constraint)?;
            tests.push(AlphaTest {
                field,
                op: constraint.op,
                value,
            });
        }
        tests.sort_by(|a, b| {
            (a.field, a.op.rank(), a.value.index_key()).cmp(&(
                b.field,
                b.op.rank(),
                b.value.index_key(),
            ))
        });
        let canonical = tests
            .iter()
            .map(|t| format!("{}#{}#{}", t.field, t.op.rank(), t.value.index_key()))
            .collect::<Vec<_>>()
            .join("&");

        let mut seen = HashSet::new();
        let mut joins: Vec<(String, (usize, usize), usize)> = Vec::new();
        let mut fresh: Vec<(String, usize, FieldType)> = Vec::new();
        for binding in &pattern.bindings {
            let field = schema.field_index(&binding.field).ok_or_else(|| {
                EngineError::UnknownField {
                    fact_type: pattern.fact_type.clone(),
                    field: binding.field.clone(),
                }
            })?;
            let field_ty = schema.field_type(field);
            if !seen.insert(binding.variable.clone()) {
                return Err(EngineError::InvalidConstraint {
                    message: format!(
                        "variable '{}' bound twice in one pattern of rule '{}'",
                        binding.variable, rule_name
                    ),
                });
            }
            match bound.get(&binding.variable) {
                Some(&(binder_pos, binder_field, binder_ty)) => {
                    // shared variable: becomes part of this pattern's join key
                    if binder_ty != field_ty {
                        return Err(EngineError::TypeMismatch {
                            expected: binder_ty.name().to_string(),
                            actual: field_ty.name().to_string(),
                        });
                    }
                    joins.push((binding.variable.clone(), (binder_pos, binder_field), field));
                }
                None => fresh.push((binding.variable.clone(), field, field_ty)),
            }
        }
        // canonical join-key order: sorted by variable name
        joins.sort_by(|a, b| a.0.cmp(&b.0));

        let mut key_vars = Vec::with_capacity(joins.len());
        let mut left_fields = Vec::with_capacity(joins.len());
        let mut right_fields = Vec::with_capacity(joins.len());
        for (variable, left, right) in joins {
            key_vars.push(variable);
            left_fields.push(left);
            right_fields.push(right);
        }

        plans.push(PatternPlan {
            type_id,
            tests,
            canonical,
            key_vars,
            left_fields,
            right_fields,
        });

        for (variable, field, field_ty) in fresh {
            bound.insert(variable, (position, field, field_ty));
        }
    }
    Ok(plans)
}

/// Validate a constraint literal against the field's declared type and widen
/// it where admissible.
fn check_literal(
    fact_type: &str,
    field: &str,
    field_ty: FieldType,
    constraint: &crate::rete::pattern::Constraint,
) -> Result<Value> {
    let op = constraint.op;
    let value = &constraint.value;

    if op.is_ordering() {
        if !field_ty.is_ordered() {
            return Err(EngineError::InvalidConstraint {
                message: format!(
                    "ordering operator '{}' on {} field '{}.{}'",
                    op,
                    field_ty,
                    fact_type,
                    field
                ),
            });
        }
        let compatible = match field_ty {
            FieldType::String => matches!(value, Value::String(_)),
            _ => value.as_number().is_some(),
        };
        if !compatible {
            return Err(EngineError::TypeMismatch {
                expected: field_ty.name().to_string(),
                actual: value.type_name().to_string(),
            });
        }
        return Ok(coerce(field_ty, value.clone()));
    }

    if op == ConstraintOp::In {
        let Value::Array(items) = value else {
            return Err(EngineError::InvalidConstraint {
                message: format!(
                    "'in' literal for '{}.{}' must be an array, got {}",
                    fact_type,
                    field,
                    value.type_name()
                ),
            });
        };
        let mut widened = Vec::with_capacity(items.len());
        for item in items {
            if !field_ty.accepts(item) {
                return Err(EngineError::TypeMismatch {
                    expected: field_ty.name().to_string(),
                    actual: item.type_name().to_string(),
                });
            }
            widened.push(coerce(field_ty, item.clone()));
        }
        return Ok(Value::Array(widened));
    }

    // Eq / Ne
    if !field_ty.accepts(value) {
        return Err(EngineError::TypeMismatch {
            expected: field_ty.name().to_string(),
            actual: value.type_name().to_string(),
        });
    }
    Ok(coerce(field_ty, value.clone()))
}
