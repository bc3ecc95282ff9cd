//! Immutable, ordered, named metadata records.
//!
//! `State` never mutates in place: every write returns a new value. This is
//! the only way state composes safely with the rest of the substrate, where
//! slots may be read from arbitrary threads after being attached.

use serde::Serialize;

use crate::name::Name;

/// The closed set of value types a slot can carry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SlotValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Name(Name),
}

impl From<bool> for SlotValue {
    fn from(v: bool) -> Self {
        SlotValue::Bool(v)
    }
}

impl From<i64> for SlotValue {
    fn from(v: i64) -> Self {
        SlotValue::Int(v)
    }
}

impl From<f64> for SlotValue {
    fn from(v: f64) -> Self {
        SlotValue::Float(v)
    }
}

impl From<&str> for SlotValue {
    fn from(v: &str) -> Self {
        SlotValue::Str(v.to_string())
    }
}

impl From<String> for SlotValue {
    fn from(v: String) -> Self {
        SlotValue::Str(v)
    }
}

impl From<Name> for SlotValue {
    fn from(v: Name) -> Self {
        SlotValue::Name(v)
    }
}

/// A named, typed value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slot {
    name: Name,
    value: SlotValue,
}

impl Slot {
    pub fn new(name: Name, value: impl Into<SlotValue>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn value(&self) -> &SlotValue {
        &self.value
    }
}

/// An immutable, ordered list of slots.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct State {
    slots: Vec<Slot>,
}

impl State {
    /// The empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new state with `slot` appended. The receiver is untouched.
    pub fn state(&self, slot: Slot) -> State {
        let mut slots = self.slots.clone();
        slots.push(slot);
        State { slots }
    }

    /// Convenience append by name and value.
    pub fn with(&self, name: Name, value: impl Into<SlotValue>) -> State {
        self.state(Slot::new(name, value))
    }

    /// Returns a new state retaining only the most-recently-added slot per
    /// name. Survivors keep their relative order, so
    /// `[(A,1),(B,2),(A,3)]` compacts to `[(B,2),(A,3)]`.
    pub fn compact(&self) -> State {
        let slots = self
            .slots
            .iter()
            .enumerate()
            .filter(|(i, slot)| {
                !self.slots[i + 1..].iter().any(|later| later.name == slot.name)
            })
            .map(|(_, slot)| slot.clone())
            .collect();
        State { slots }
    }

    /// Reads the latest value for `name`, or `default` when absent.
    pub fn value(&self, name: &Name, default: SlotValue) -> SlotValue {
        self.slots
            .iter()
            .rev()
            .find(|slot| &slot.name == name)
            .map(|slot| slot.value.clone())
            .unwrap_or(default)
    }

    /// Every value recorded for `name`, oldest first.
    pub fn values(&self, name: &Name) -> Vec<SlotValue> {
        self.slots
            .iter()
            .filter(|slot| &slot.name == name)
            .map(|slot| slot.value.clone())
            .collect()
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
