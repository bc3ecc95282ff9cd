use cortex::{Cortex, SlotValue};

#[test]
fn test_append_never_mutates_receiver() {
    let cortex = Cortex::new();
    let name = cortex.name("env.region").unwrap();

    let empty = cortex.state();
    let one = empty.with(name.clone(), "eu-west");

    assert!(empty.is_empty(), "receiver must be untouched by append");
    assert_eq!(one.len(), 1);
    assert_eq!(one.value(&name, SlotValue::Str("?".into())), SlotValue::Str("eu-west".into()));
}

#[test]
fn test_compact_keeps_latest_write_per_name() {
    let cortex = Cortex::new();
    let a = cortex.name("a").unwrap();
    let b = cortex.name("b").unwrap();

    // [(A,1),(B,2),(A,3)] compacts to [(B,2),(A,3)]
    let state = cortex
        .state()
        .with(a.clone(), 1i64)
        .with(b.clone(), 2i64)
        .with(a.clone(), 3i64);

    let compacted = state.compact();
    assert_eq!(compacted.len(), 2);
    assert_eq!(compacted.slots()[0].name(), &b);
    assert_eq!(compacted.slots()[0].value(), &SlotValue::Int(2));
    assert_eq!(compacted.slots()[1].name(), &a);
    assert_eq!(compacted.slots()[1].value(), &SlotValue::Int(3));

    // The source state is unchanged.
    assert_eq!(state.len(), 3);
}

#[test]
fn test_value_falls_back_to_default() {
    let cortex = Cortex::new();
    let missing = cortex.name("not.there").unwrap();

    let state = cortex.state();
    assert_eq!(
        state.value(&missing, SlotValue::Int(42)),
        SlotValue::Int(42),
        "absent names read as the caller-supplied default"
    );
}

#[test]
fn test_values_lists_every_write_in_order() {
    let cortex = Cortex::new();
    let n = cortex.name("n").unwrap();

    let state = cortex
        .state()
        .with(n.clone(), 1i64)
        .with(n.clone(), 2i64)
        .with(n.clone(), 3i64);

    assert_eq!(
        state.values(&n),
        vec![SlotValue::Int(1), SlotValue::Int(2), SlotValue::Int(3)]
    );

    // Latest write wins for the single-value read.
    assert_eq!(state.value(&n, SlotValue::Int(0)), SlotValue::Int(3));
}
