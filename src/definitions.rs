//! Class catalog and the builder that accumulates class statements.

use rustc_hash::FxHashMap;

use crate::model::{ClassDefinition, FieldDefinition, MethodDefinition};

/// Slot of a class inside a [`ClassCatalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassRef(usize);

/// Name-keyed class storage that keeps declaration order.
#[derive(Debug, Clone, Default)]
pub struct ClassCatalog {
    classes: Vec<ClassDefinition>,
    slots: FxHashMap<String, usize>,
}

impl ClassCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_definitions(definitions: impl IntoIterator<Item = ClassDefinition>) -> Self {
        let mut catalog = Self::new();
        for definition in definitions {
            catalog.upsert(definition);
        }
        catalog
    }

    pub fn get(&self, name: &str) -> Option<&ClassDefinition> {
        self.slots.get(name).map(|&slot| &self.classes[slot])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    pub fn lookup(&self, name: &str) -> Option<ClassRef> {
        self.slots.get(name).copied().map(ClassRef)
    }

    /// Returns the existing slot for `name` or appends an empty class.
    pub fn ensure(&mut self, name: &str) -> ClassRef {
        if let Some(class_ref) = self.lookup(name) {
            return class_ref;
        }
        let slot = self.classes.len();
        self.classes.push(ClassDefinition::new(name));
        self.slots.insert(name.to_string(), slot);
        ClassRef(slot)
    }

    /// Replaces a class with the same name in place, or appends it.
    pub fn upsert(&mut self, definition: ClassDefinition) {
        match self.slots.get(&definition.name) {
            Some(&slot) => self.classes[slot] = definition,
            None => {
                self.slots.insert(definition.name.clone(), self.classes.len());
                self.classes.push(definition);
            }
        }
    }

    pub fn definition_mut(&mut self, class_ref: ClassRef) -> &mut ClassDefinition {
        &mut self.classes[class_ref.0]
    }

    pub fn classes(&self) -> &[ClassDefinition] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn into_definitions(self) -> Vec<ClassDefinition> {
        self.classes
    }
}

/// Accumulates class members across statements on top of a borrowed base
/// catalog.
///
/// A class stays open while consecutive statements extend it. Any other
/// statement closes it; extending a closed or pre-existing class re-opens it
/// and appends to its lists. Base classes are copied in only when a statement
/// extends them, so [`finish`](Self::finish) yields just the classes this
/// builder declared or changed.
#[derive(Debug)]
pub struct DefinitionBuilder<'a> {
    base: &'a ClassCatalog,
    catalog: ClassCatalog,
    open: Option<ClassRef>,
}

impl<'a> DefinitionBuilder<'a> {
    pub fn new(base: &'a ClassCatalog) -> Self {
        Self {
            base,
            catalog: ClassCatalog::new(),
            open: None,
        }
    }

    /// Opens `name`, creating it on first use. Re-opening keeps its members.
    pub fn open_class(&mut self, name: &str) -> ClassRef {
        if let Some(open) = self.open
            && self.catalog.classes[open.0].name == name
        {
            return open;
        }
        self.close_class();
        if self.catalog.lookup(name).is_none()
            && let Some(existing) = self.base.get(name)
        {
            self.catalog.upsert(existing.clone());
        }
        let class_ref = self.catalog.ensure(name);
        self.open = Some(class_ref);
        class_ref
    }

    pub fn add_field(&mut self, class_ref: ClassRef, field: FieldDefinition) {
        self.catalog.definition_mut(class_ref).fields.push(field);
    }

    pub fn add_method(&mut self, class_ref: ClassRef, method: MethodDefinition) {
        self.catalog.definition_mut(class_ref).methods.push(method);
    }

    pub fn close_class(&mut self) {
        self.open = None;
    }

    pub fn open_class_name(&self) -> Option<&str> {
        self.open
            .map(|class_ref| self.catalog.classes[class_ref.0].name.as_str())
    }

    /// Looks up `name` among touched classes first, then the base.
    pub fn get(&self, name: &str) -> Option<&ClassDefinition> {
        self.catalog.get(name).or_else(|| self.base.get(name))
    }

    /// Classes declared or extended through this builder.
    pub fn finish(mut self) -> ClassCatalog {
        self.close_class();
        self.catalog
    }
}
