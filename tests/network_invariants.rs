//! Invariant and round-trip properties of the network, agenda, and reset.

use rete_core::{
    ConstraintOp, Engine, Fact, FactSchema, FieldType, Pattern, Rule,
};
use std::cell::RefCell;
use std::rc::Rc;

fn sensor_engine() -> Engine {
    let mut engine = Engine::new();
    engine
        .register_fact_type(
            FactSchema::new("Sensor")
                .field("zone", FieldType::String)
                .field("reading", FieldType::Integer),
        )
        .unwrap();
    engine
}

fn hot_rule() -> Rule {
    Rule::new("hot").when(Pattern::new("Sensor").where_field("reading", ConstraintOp::Gt, 100))
}

#[test]
fn test_agenda_tracks_derivable_matches() {
    let mut engine = sensor_engine();
    engine.register_rule(hot_rule()).unwrap();

    let mut hot = Vec::new();
    for reading in [50, 150, 200, 80, 120] {
        let id = engine
            .declare(Fact::new("Sensor").with("zone", "a").with("reading", reading as i64))
            .unwrap();
        if reading > 100 {
            hot.push(id);
        }
    }
    assert_eq!(engine.pending_activations(), hot.len());

    engine.retract(hot[0]).unwrap();
    assert_eq!(engine.pending_activations(), hot.len() - 1);
}

#[test]
fn test_declare_retract_roundtrip_restores_state() {
    let mut engine = sensor_engine();
    engine.register_rule(hot_rule()).unwrap();

    engine
        .declare(Fact::new("Sensor").with("zone", "a").with("reading", 150i64))
        .unwrap();
    let baseline = (engine.fact_count(), engine.pending_activations());

    let id = engine
        .declare(Fact::new("Sensor").with("zone", "b").with("reading", 180i64))
        .unwrap();
    engine.retract(id).unwrap();

    assert_eq!((engine.fact_count(), engine.pending_activations()), baseline);
    assert!(!engine.contains_fact(id));
}

#[test]
fn test_equal_fact_values_are_independent_matches() {
    let mut engine = sensor_engine();
    engine.register_rule(hot_rule()).unwrap();

    let fact = Fact::new("Sensor").with("zone", "a").with("reading", 150i64);
    let first = engine.declare(fact.clone()).unwrap();
    let second = engine.declare(fact).unwrap();

    assert_ne!(first, second);
    assert_eq!(engine.pending_activations(), 2);
    assert_eq!(engine.run().unwrap(), 2);

    // retracting one copy leaves the other fact alone
    engine.retract(first).unwrap();
    assert!(engine.contains_fact(second));
}

#[test]
fn test_reset_is_idempotent_and_total() {
    let mut engine = sensor_engine();
    engine.register_rule(hot_rule()).unwrap();

    engine.reset();
    for reading in [150, 160, 170] {
        engine
            .declare(Fact::new("Sensor").with("zone", "a").with("reading", reading as i64))
            .unwrap();
    }
    engine.reset();

    let stats = engine.stats();
    assert_eq!(stats.facts, 0);
    assert_eq!(stats.pending_activations, 0);
    assert_eq!(stats.rules, 1);
    assert_eq!(engine.run().unwrap(), 0);

    // the network still works after a double reset
    engine
        .declare(Fact::new("Sensor").with("zone", "a").with("reading", 150i64))
        .unwrap();
    assert_eq!(engine.run().unwrap(), 1);
}

#[test]
fn test_distinct_salience_fires_strictly_descending() {
    let mut engine = sensor_engine();
    let order = Rc::new(RefCell::new(Vec::new()));

    for (name, salience) in [("low", -5), ("high", 50), ("mid", 10)] {
        let sink = order.clone();
        engine
            .register_rule(
                Rule::new(name)
                    .salience(salience)
                    .when(Pattern::new("Sensor").where_field("reading", ConstraintOp::Gt, 0))
                    .then(move |_, _| {
                        sink.borrow_mut().push(name);
                        Ok(())
                    }),
            )
            .unwrap();
    }

    engine
        .declare(Fact::new("Sensor").with("zone", "a").with("reading", 1i64))
        .unwrap();

    assert_eq!(engine.run().unwrap(), 3);
    assert_eq!(*order.borrow(), vec!["high", "mid", "low"]);
}

#[test]
fn test_equal_salience_fires_in_creation_order() {
    let mut engine = sensor_engine();
    let order = Rc::new(RefCell::new(Vec::new()));
    let sink = order.clone();
    engine
        .register_rule(
            Rule::new("log")
                .when(Pattern::new("Sensor").where_field("reading", ConstraintOp::Gt, 100).bind("zone", "$z"))
                .then(move |_, facts| {
                    sink.borrow_mut().push(facts[0].id);
                    Ok(())
                }),
        )
        .unwrap();

    let mut declared = Vec::new();
    for zone in ["a", "b", "c", "d"] {
        declared.push(
            engine
                .declare(Fact::new("Sensor").with("zone", zone).with("reading", 150i64))
                .unwrap(),
        );
    }

    assert_eq!(engine.run().unwrap(), 4);
    assert_eq!(*order.borrow(), declared);
}

#[test]
fn test_fired_match_rederives_after_retract_and_redeclare() {
    let mut engine = sensor_engine();
    let fires = Rc::new(RefCell::new(0usize));
    let sink = fires.clone();
    engine
        .register_rule(
            Rule::new("hot")
                .when(Pattern::new("Sensor").where_field("reading", ConstraintOp::Gt, 100))
                .then(move |_, _| {
                    *sink.borrow_mut() += 1;
                    Ok(())
                }),
        )
        .unwrap();

    let fact = Fact::new("Sensor").with("zone", "a").with("reading", 150i64);
    let id = engine.declare(fact.clone()).unwrap();
    assert_eq!(engine.run().unwrap(), 1);
    assert_eq!(engine.run().unwrap(), 0);

    // destroying and reforming the tuple makes it eligible again
    engine.retract(id).unwrap();
    engine.declare(fact).unwrap();
    assert_eq!(engine.run().unwrap(), 1);
    assert_eq!(*fires.borrow(), 2);
}

#[test]
fn test_equal_filters_share_alpha_memories_across_rules() {
    let mut engine = sensor_engine();
    engine.register_rule(hot_rule()).unwrap();
    engine
        .register_rule(
            Rule::new("also-hot")
                .salience(5)
                .when(Pattern::new("Sensor").where_field("reading", ConstraintOp::Gt, 100)),
        )
        .unwrap();

    // one shared memory, but each rule still activates independently
    assert_eq!(engine.stats().alpha_memories, 1);
    engine
        .declare(Fact::new("Sensor").with("zone", "a").with("reading", 150i64))
        .unwrap();
    assert_eq!(engine.pending_activations(), 2);
}

#[test]
fn test_three_pattern_chain_joins_incrementally() {
    let mut engine = Engine::new();
    engine
        .register_fact_type(
            FactSchema::new("Order")
                .field("id", FieldType::Integer)
                .field("customer", FieldType::String),
        )
        .unwrap();
    engine
        .register_fact_type(
            FactSchema::new("Payment")
                .field("order_id", FieldType::Integer)
                .field("settled", FieldType::Boolean),
        )
        .unwrap();
    engine
        .register_fact_type(
            FactSchema::new("Shipment")
                .field("order_id", FieldType::Integer)
                .field("dispatched", FieldType::Boolean),
        )
        .unwrap();

    let completed = Rc::new(RefCell::new(Vec::new()));
    let sink = completed.clone();
    engine
        .register_rule(
            Rule::new("order-complete")
                .when(Pattern::new("Order").bind("id", "$order"))
                .when(
                    Pattern::new("Payment")
                        .where_field("settled", ConstraintOp::Eq, true)
                        .bind("order_id", "$order"),
                )
                .when(
                    Pattern::new("Shipment")
                        .where_field("dispatched", ConstraintOp::Eq, true)
                        .bind("order_id", "$order"),
                )
                .then(move |_, facts| {
                    sink.borrow_mut().push(facts[0].id);
                    Ok(())
                }),
        )
        .unwrap();

    let order = engine
        .declare(Fact::new("Order").with("id", 7).with("customer", "acme"))
        .unwrap();
    engine
        .declare(Fact::new("Payment").with("order_id", 7).with("settled", true))
        .unwrap();
    // unrelated order's shipment must not complete the chain
    engine
        .declare(Fact::new("Shipment").with("order_id", 8).with("dispatched", true))
        .unwrap();
    assert_eq!(engine.pending_activations(), 0);

    engine
        .declare(Fact::new("Shipment").with("order_id", 7).with("dispatched", true))
        .unwrap();
    assert_eq!(engine.pending_activations(), 1);
    assert_eq!(engine.run().unwrap(), 1);
    assert_eq!(*completed.borrow(), vec![order]);
}

#[test]
fn test_retract_middle_of_chain_withdraws_token() {
    let mut engine = Engine::new();
    engine
        .register_fact_type(FactSchema::new("Left").field("k", FieldType::Integer))
        .unwrap();
    engine
        .register_fact_type(FactSchema::new("Right").field("k", FieldType::Integer))
        .unwrap();
    engine
        .register_rule(
            Rule::new("pair")
                .when(Pattern::new("Left").bind("k", "$k"))
                .when(Pattern::new("Right").bind("k", "$k")),
        )
        .unwrap();

    engine.declare(Fact::new("Left").with("k", 1)).unwrap();
    let right = engine.declare(Fact::new("Right").with("k", 1)).unwrap();
    engine.declare(Fact::new("Left").with("k", 2)).unwrap();
    assert_eq!(engine.pending_activations(), 1);

    engine.retract(right).unwrap();
    assert_eq!(engine.pending_activations(), 0);

    // the surviving Left still joins a future Right
    engine.declare(Fact::new("Right").with("k", 2)).unwrap();
    assert_eq!(engine.pending_activations(), 1);
}
