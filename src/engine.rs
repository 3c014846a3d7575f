//! Engine facade: working memory, network, and agenda wired together behind
//! declare / retract / run / reset.

use crate::errors::{EngineError, Result};
use crate::rete::agenda::Agenda;
use crate::rete::network::ReteNetwork;
use crate::rete::rule::{Rule, RuleAction};
use crate::rete::wme::{FactId, MatchedFact, Wme, WorkingMemory};
use crate::schema::{FactSchema, TypeRegistry};
use crate::types::Fact;
use log::{debug, info, warn};
use std::fmt;

/// What to do when a rule action returns an error mid-run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Abort the run, surface the error; working memory and agenda stay
    /// consistent and the failed activation is consumed
    #[default]
    Abort,
    /// Log the failure and keep firing
    SkipAndContinue,
}

/// Configuration options for the engine
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Default fire budget for `run` (None = unbounded)
    pub max_fires: Option<usize>,
    /// Action failure policy
    pub error_policy: ErrorPolicy,
}

/// Summary counters for one engine instance
#[derive(Debug, Clone)]
pub struct EngineStats {
    /// Registered fact types
    pub fact_types: usize,
    /// Registered rules
    pub rules: usize,
    /// Facts currently in working memory
    pub facts: usize,
    /// Shared alpha memories in the network
    pub alpha_memories: usize,
    /// Activations waiting on the agenda
    pub pending_activations: usize,
}

impl fmt::Display for EngineStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Engine Stats: {} fact types, {} rules, {} facts, {} alpha memories, {} pending activations",
            self.fact_types, self.rules, self.facts, self.alpha_memories, self.pending_activations
        )
    }
}

struct RegisteredRule {
    name: String,
    action: Option<RuleAction>,
}

/// A forward-chaining production-rule engine.
///
/// One instance is fully self-contained: its own fact-id counter, working
/// memory, compiled network, and agenda. Instances are single-threaded; rule
/// actions receive `&mut Engine` and may declare, retract, and halt, but not
/// re-enter `run`.
#[derive(Default)]
pub struct Engine {
    registry: TypeRegistry,
    config: EngineConfig,
    wm: WorkingMemory,
    network: ReteNetwork,
    rules: Vec<RegisteredRule>,
    agenda: Agenda,
    halt_requested: bool,
    running: bool,
}

impl Engine {
    /// Create an engine with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with the given configuration
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Register a fact type. Patterns and facts may only use registered
    /// types.
    pub fn register_fact_type(&mut self, schema: FactSchema) -> Result<()> {
        let name = schema.name().to_string();
        self.registry.register(schema)?;
        info!("registered fact type '{}'", name);
        Ok(())
    }

    /// Compile and register a rule.
    ///
    /// Only allowed while the engine is quiescent (not inside `run`). If
    /// working memory is non-empty, existing facts are matched against the
    /// new rule immediately.
    pub fn register_rule(&mut self, mut rule: Rule) -> Result<()> {
        if self.running {
            return Err(EngineError::Reentrancy {
                message: format!("register_rule('{}') called from within a rule action", rule.name),
            });
        }
        let rule_id = self.rules.len();
        self.network
            .compile_rule(&self.registry, rule_id, &rule.name, rule.salience, &rule.patterns)?;
        let action = rule.take_action();
        self.rules.push(RegisteredRule {
            name: rule.name,
            action: Some(action),
        });
        self.network.activate_rule(&self.wm, &mut self.agenda, rule_id);
        info!("registered rule '{}'", self.rules[rule_id].name);
        Ok(())
    }

    /// Validate a fact, store it, and propagate it through the network.
    /// Returns the assigned fact id. Declaring the same value twice yields
    /// two independent ids.
    pub fn declare(&mut self, fact: Fact) -> Result<FactId> {
        let (type_id, values) = self.registry.validate(&fact)?;
        let id = self.wm.insert(type_id, values);
        debug!("declared {} as {}", fact.fact_type, id);
        self.network.assert_fact(&self.wm, &mut self.agenda, id);
        Ok(id)
    }

    /// Remove a fact and withdraw every activation built on it
    pub fn retract(&mut self, id: FactId) -> Result<()> {
        if !self.wm.contains(id) {
            return Err(EngineError::UnknownFact { id: id.id() });
        }
        self.network.retract_fact(&mut self.agenda, id);
        self.wm.remove(id);
        debug!("retracted {}", id);
        Ok(())
    }

    /// Empty working memory, all network memories, and the agenda. Compiled
    /// rules and registered fact types survive; the fact-id counter
    /// restarts.
    pub fn reset(&mut self) {
        self.wm.clear();
        self.agenda.clear();
        self.network.reset(&self.wm, &mut self.agenda);
        self.halt_requested = false;
    }

    /// Ask the current `run` loop to stop after the current action returns
    pub fn halt(&mut self) {
        self.halt_requested = true;
    }

    /// Fire pending activations in salience order until the agenda empties,
    /// `halt` is called, or the configured fire budget is exhausted. Returns
    /// the number of actions invoked.
    pub fn run(&mut self) -> Result<usize> {
        let limit = self.config.max_fires;
        self.run_inner(limit)
    }

    /// Like `run`, with an explicit fire budget
    pub fn run_with_limit(&mut self, max_fires: usize) -> Result<usize> {
        self.run_inner(Some(max_fires))
    }

    fn run_inner(&mut self, max_fires: Option<usize>) -> Result<usize> {
        if self.running {
            return Err(EngineError::Reentrancy {
                message: "run called from within a rule action".to_string(),
            });
        }
        self.running = true;
        self.halt_requested = false;
        let outcome = self.fire_loop(max_fires);
        self.running = false;
        outcome
    }

    fn fire_loop(&mut self, max_fires: Option<usize>) -> Result<usize> {
        let mut fired = 0usize;
        loop {
            if let Some(limit) = max_fires {
                if fired >= limit {
                    break;
                }
            }
            let Some(activation) = self.agenda.pop() else { break };
            let Some(facts) = self.resolve_tuple(&activation.token) else {
                // should not occur while the invariants hold
                warn!(
                    "discarding activation of rule '{}': supporting fact gone",
                    self.rules[activation.rule].name
                );
                continue;
            };
            let mut action = match self.rules[activation.rule].action.take() {
                Some(action) => action,
                None => continue,
            };
            debug!("firing rule '{}'", self.rules[activation.rule].name);
            let result = action(self, &facts);
            self.rules[activation.rule].action = Some(action);
            fired += 1;
            if let Err(source) = result {
                match self.config.error_policy {
                    ErrorPolicy::Abort => {
                        return Err(EngineError::Action {
                            rule: self.rules[activation.rule].name.clone(),
                            message: source.to_string(),
                        });
                    }
                    ErrorPolicy::SkipAndContinue => {
                        warn!(
                            "rule '{}' action failed, continuing: {}",
                            self.rules[activation.rule].name, source
                        );
                    }
                }
            }
            if self.halt_requested {
                break;
            }
        }
        Ok(fired)
    }

    fn resolve_tuple(&self, token: &crate::rete::Token) -> Option<Vec<MatchedFact>> {
        token
            .facts()
            .iter()
            .map(|&id| {
                self.wm.get(id).map(|wme| MatchedFact {
                    id,
                    fact: self.snapshot(wme),
                })
            })
            .collect()
    }

    fn snapshot(&self, wme: &Wme) -> Fact {
        let schema = self.registry.schema(wme.type_id);
        let mut fact = Fact::new(schema.name());
        for (def, value) in schema.fields().iter().zip(&wme.values) {
            fact.set(def.name.clone(), value.clone());
        }
        fact
    }

    /// Snapshot of a live fact by id
    pub fn fact(&self, id: FactId) -> Option<Fact> {
        self.wm.get(id).map(|wme| self.snapshot(wme))
    }

    /// Whether a fact id is live in working memory
    pub fn contains_fact(&self, id: FactId) -> bool {
        self.wm.contains(id)
    }

    /// Number of facts in working memory
    pub fn fact_count(&self) -> usize {
        self.wm.len()
    }

    /// Number of activations waiting on the agenda
    pub fn pending_activations(&self) -> usize {
        self.agenda.len()
    }

    /// Summary counters
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            fact_types: self.registry.len(),
            rules: self.rules.len(),
            facts: self.wm.len(),
            alpha_memories: self.network.alpha_memory_count(),
            pending_activations: self.agenda.len(),
        }
    }
}
