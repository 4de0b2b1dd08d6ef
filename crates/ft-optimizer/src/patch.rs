//! Turns a trial's overrides into a nested config patch.

use serde_json::{Map, Value};

use ft_types::TrialDefinition;

/// Nested object mirroring each override's dotted path, with the override's
/// parameters merged in at the leaf.
///
/// Overrides sharing a leaf are shallow-merged; the later override wins on
/// conflicting keys. A path segment that currently holds a non-object value
/// is replaced by an object.
pub fn build_patch(trial: &TrialDefinition) -> Value {
    let mut root = Map::new();

    for mod_override in &trial.overrides {
        let mut node = &mut root;
        for segment in mod_override.segments() {
            let slot = node
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            node = match slot {
                Value::Object(map) => map,
                _ => unreachable!("slot was just made an object"),
            };
        }
        for (name, value) in &mod_override.parameters {
            node.insert(name.clone(), value.to_json());
        }
    }

    Value::Object(root)
}
