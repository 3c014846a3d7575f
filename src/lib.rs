//! # rete-core
//!
//! A typed forward-chaining production-rule engine built on the RETE
//! algorithm.
//!
//! ## Features
//!
//! - **Typed facts**: fact types declare named, typed fields; every fact is
//!   validated once at the boundary and stored positionally
//! - **Shared alpha network**: semantically equal single-fact filters share
//!   one memory across rules
//! - **Hash-indexed joins**: multi-pattern rules join on shared binding
//!   variables through hash indexes on both sides
//! - **Salience agenda**: higher salience fires first, FIFO among equals
//! - **Incremental**: declare and retract propagate through the network and
//!   keep the agenda consistent between fires
//! - **Compile-time checks**: unknown fields, unordered comparisons, and
//!   mismatched join types are rejected at rule registration
//!
//! ## Quick Start
//!
//! ```rust
//! use rete_core::{ConstraintOp, Engine, Fact, FactSchema, FieldType, Pattern, Rule};
//!
//! fn main() -> rete_core::Result<()> {
//!     let mut engine = Engine::new();
//!
//!     engine.register_fact_type(
//!         FactSchema::new("Patient")
//!             .field("name", FieldType::String)
//!             .field("heartbeat", FieldType::Integer),
//!     )?;
//!
//!     engine.register_rule(
//!         Rule::new("tachycardia")
//!             .salience(100)
//!             .when(Pattern::new("Patient").where_field("heartbeat", ConstraintOp::Gt, 120))
//!             .then(|_engine, facts| {
//!                 println!("elevated heart rate on {}", facts[0].id);
//!                 Ok(())
//!             }),
//!     )?;
//!
//!     engine.declare(Fact::new("Patient").with("name", "A").with("heartbeat", 145))?;
//!     let fired = engine.run()?;
//!     assert_eq!(fired, 1);
//!     Ok(())
//! }
//! ```
//!
//! ## Joins with variable binding
//!
//! Patterns that bind the same variable are joined on it:
//!
//! ```rust
//! # use rete_core::{ConstraintOp, Engine, Fact, FactSchema, FieldType, Pattern, Rule};
//! # fn main() -> rete_core::Result<()> {
//! # let mut engine = Engine::new();
//! engine.register_fact_type(
//!     FactSchema::new("Client")
//!         .field("id", FieldType::Integer)
//!         .field("status", FieldType::String),
//! )?;
//! engine.register_fact_type(
//!     FactSchema::new("Txn")
//!         .field("client_id", FieldType::Integer)
//!         .field("amount", FieldType::Float),
//! )?;
//!
//! engine.register_rule(
//!     Rule::new("vip-large-txn")
//!         .when(
//!             Pattern::new("Client")
//!                 .where_field("status", ConstraintOp::Eq, "VIP")
//!                 .bind("id", "$client"),
//!         )
//!         .when(
//!             Pattern::new("Txn")
//!                 .where_field("amount", ConstraintOp::Gt, 5000.0)
//!                 .bind("client_id", "$client"),
//!         ),
//! )?;
//!
//! engine.declare(Fact::new("Client").with("id", 1).with("status", "VIP"))?;
//! engine.declare(Fact::new("Txn").with("client_id", 1).with("amount", 6000.0))?;
//! assert_eq!(engine.run()?, 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Components
//!
//! - [`Engine`]: facade wiring working memory, network, and agenda
//! - [`FactSchema`] / [`TypeRegistry`]: declared fact types, the validation
//!   boundary
//! - [`Pattern`]: one rule condition (fact type + constraints + bindings)
//! - [`Rule`]: patterns + salience + action
//! - [`Fact`] / [`Value`]: the data a rule matches and an action receives

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Engine facade and configuration
pub mod engine;
/// Error types and result handling
pub mod errors;
/// RETE network core
pub mod rete;
/// Fact type schemas and validation
pub mod schema;
/// Core value and fact data model
pub mod types;

pub use engine::{Engine, EngineConfig, EngineStats, ErrorPolicy};
pub use errors::{EngineError, Result};
pub use rete::{
    Activation, Binding, Constraint, ConstraintOp, FactId, MatchedFact, Pattern, Rule, RuleAction,
    RuleId, Token,
};
pub use schema::{FactSchema, FieldDef, TypeId, TypeRegistry};
pub use types::{Fact, FieldType, Value};
