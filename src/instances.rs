//! Instance store and the builder that seeds new instances.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

use crate::model::{ClassDefinition, InstanceRecord};
use crate::value::Value;

const BOOLEAN_WORDS: &[&str] = &[
    "active", "enabled", "disabled", "visible", "hidden", "done", "completed", "checked",
    "selected", "open", "closed", "valid", "locked", "finished", "archived", "flag",
];
const COUNT_WORDS: &[&str] = &[
    "count", "number", "age", "priority", "total", "amount", "quantity", "score", "level",
    "index", "size", "width", "height", "x", "y", "price", "progress",
];
const COLLECTION_WORDS: &[&str] = &[
    "items", "children", "list", "tags", "elements", "entries", "members", "tasks", "values",
    "options", "messages", "todos",
];

/// Default for a field declared without one, inferred from its name.
pub fn smart_default(field_name: &str) -> Value {
    let lower = field_name.to_lowercase();
    if has_predicate_prefix(field_name) || BOOLEAN_WORDS.contains(&lower.as_str()) {
        return Value::Bool(false);
    }
    if COUNT_WORDS.contains(&lower.as_str())
        || ["count", "number", "total"]
            .iter()
            .any(|suffix| lower.ends_with(suffix))
    {
        return Value::Number(0.0);
    }
    if COLLECTION_WORDS.contains(&lower.as_str())
        || ["items", "list", "children", "tags"]
            .iter()
            .any(|suffix| lower.ends_with(suffix))
    {
        return Value::List(Vec::new());
    }
    Value::string("")
}

/// `isActive`, `hasChildren`, `canEdit`, `shouldSync`.
fn has_predicate_prefix(name: &str) -> bool {
    ["is", "has", "can", "should"].iter().any(|prefix| {
        name.strip_prefix(prefix)
            .and_then(|rest| rest.chars().next())
            .is_some_and(char::is_uppercase)
    })
}

/// Builds an instance: class defaults first, then explicit properties on top.
///
/// An unknown class is valid and contributes no fields.
pub fn create_instance(
    name: &str,
    class_name: &str,
    class: Option<&ClassDefinition>,
    explicit: impl IntoIterator<Item = (String, Value)>,
) -> InstanceRecord {
    let mut properties = BTreeMap::new();
    if let Some(class) = class {
        for field in &class.fields {
            let value = field
                .default_value
                .clone()
                .unwrap_or_else(|| smart_default(&field.name));
            properties.insert(field.name.clone(), value);
        }
    }
    properties.extend(explicit);
    InstanceRecord {
        name: name.to_string(),
        class_name: class_name.to_string(),
        properties,
    }
}

/// Instances keyed by name, backed by a name -> slot index.
#[derive(Debug, Clone, Default)]
pub struct InstanceStore {
    records: Vec<InstanceRecord>,
    slots: FxHashMap<String, usize>,
}

impl InstanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = InstanceRecord>) -> Self {
        let mut store = Self::new();
        for record in records {
            store.upsert(record);
        }
        store
    }

    pub fn get(&self, name: &str) -> Option<&InstanceRecord> {
        self.slots.get(name).map(|&slot| &self.records[slot])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut InstanceRecord> {
        self.slots.get(name).map(|&slot| &mut self.records[slot])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Replaces the record with the same name in place, or appends it.
    pub fn upsert(&mut self, record: InstanceRecord) {
        match self.slots.get(&record.name) {
            Some(&slot) => self.records[slot] = record,
            None => {
                self.slots.insert(record.name.clone(), self.records.len());
                self.records.push(record);
            }
        }
    }

    pub fn records(&self) -> &[InstanceRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<InstanceRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Next free `<class>N` name, e.g. `person3` for the third `Person`.
    pub fn next_auto_name(&self, class_name: &str) -> String {
        let mut chars = class_name.chars();
        let stem = match chars.next() {
            Some(first) => first.to_lowercase().chain(chars).collect::<String>(),
            None => "instance".to_string(),
        };
        let existing = self
            .records
            .iter()
            .filter(|record| record.class_name == class_name)
            .count();
        let mut ordinal = existing + 1;
        loop {
            let candidate = format!("{stem}{ordinal}");
            if !self.contains(&candidate) {
                return candidate;
            }
            ordinal += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldDefinition;

    #[test]
    fn smart_defaults_follow_field_names() {
        assert_eq!(smart_default("isActive"), Value::Bool(false));
        assert_eq!(smart_default("completed"), Value::Bool(false));
        assert_eq!(smart_default("count"), Value::Number(0.0));
        assert_eq!(smart_default("itemCount"), Value::Number(0.0));
        assert_eq!(smart_default("items"), Value::List(Vec::new()));
        assert_eq!(smart_default("todoList"), Value::List(Vec::new()));
        assert_eq!(smart_default("title"), Value::string(""));
        assert_eq!(smart_default("island"), Value::string(""));
    }

    #[test]
    fn explicit_properties_override_defaults() {
        let mut class = ClassDefinition::new("Task");
        class.fields.push(FieldDefinition {
            name: "title".to_string(),
            default_value: Some(Value::string("untitled")),
        });
        class.fields.push(FieldDefinition {
            name: "isDone".to_string(),
            default_value: None,
        });

        let record = create_instance(
            "t",
            "Task",
            Some(&class),
            [("title".to_string(), Value::string(""))],
        );
        assert_eq!(record.property("title"), Some(&Value::string("")));
        assert_eq!(record.property("isDone"), Some(&Value::Bool(false)));
    }

    #[test]
    fn unknown_classes_build_bare_instances() {
        let record = create_instance("b", "ButtonMorph", None, []);
        assert_eq!(record.class_name, "ButtonMorph");
        assert!(record.properties.is_empty());
    }

    #[test]
    fn auto_names_skip_taken_names() {
        let mut store = InstanceStore::new();
        assert_eq!(store.next_auto_name("Person"), "person1");
        store.upsert(InstanceRecord::new("person1", "Person"));
        store.upsert(InstanceRecord::new("person2", "Robot"));
        assert_eq!(store.next_auto_name("Person"), "person3");
        assert_eq!(store.next_auto_name("TodoItem"), "todoItem1");
    }

    #[test]
    fn upsert_keeps_slot_order() {
        let mut store = InstanceStore::from_records([
            InstanceRecord::new("a", "A"),
            InstanceRecord::new("b", "B"),
        ]);
        store.upsert(InstanceRecord::new("a", "C"));
        assert_eq!(store.len(), 2);
        assert_eq!(store.records()[0].class_name, "C");
        assert_eq!(store.get("b").map(|r| r.class_name.as_str()), Some("B"));
    }
}
