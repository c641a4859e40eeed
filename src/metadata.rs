//! The class-metadata store and its flattened-field-layout memoization.
//!
//! Populated exclusively from `GC_CLASS_DUMP` sub-records (pass 1 scans
//! every record, but only class dumps touch this store). HPROF writes
//! instance field values in `super-class fields ∘ own fields` order; the
//! flattener resolves that without any runtime polymorphism, just a
//! depth-first walk of the stored superclass chain.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::id::Id;
use crate::primitive::PrimitiveType;

#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name_id: Id,
    pub field_type: PrimitiveType,
}

#[derive(Debug, Clone)]
pub struct ClassInfo {
    pub super_class_id: Option<Id>,
    pub instance_fields: Vec<FieldDef>,
}

/// Depth-first concatenation of a class's inherited and own instance
/// field types. `None` ("unresolved") is distinct from `Some(vec![])`
/// (a class with a known, empty layout) -- a well-formed hprof never
/// needs a resolved class whose ancestor is unknown, but a truncated or
/// reordered dump might, and callers must treat the two cases
/// differently (verbatim copy vs. field-by-field transform).
pub struct ClassMetadataStore {
    classes: HashMap<u64, ClassInfo>,
    flattened_cache: RefCell<HashMap<u64, Option<Vec<PrimitiveType>>>>,
}

impl ClassMetadataStore {
    pub fn new() -> Self {
        ClassMetadataStore {
            classes: HashMap::new(),
            flattened_cache: RefCell::new(HashMap::new()),
        }
    }

    /// Records or overwrites a class's metadata. Per the source's "rare,
    /// but honored" note, a class dump re-encountered later invalidates
    /// the memoized layout for that class (and, transitively, anything
    /// cached for a subclass would be stale -- we invalidate the whole
    /// cache rather than try to track the subclass graph, since
    /// re-dumps are rare enough that this costs nothing in practice).
    pub fn update_class(&mut self, class_id: Id, info: ClassInfo) {
        self.classes.insert(class_id.id(), info);
        self.flattened_cache.borrow_mut().clear();
    }

    pub fn get(&self, class_id: Id) -> Option<&ClassInfo> {
        self.classes.get(&class_id.id())
    }

    /// Inherited-first sequence of instance field types for `class_id`,
    /// or `None` if any ancestor in the chain is unknown.
    pub fn flatten(&self, class_id: Id) -> Option<Vec<PrimitiveType>> {
        if let Some(cached) = self.flattened_cache.borrow().get(&class_id.id()) {
            return cached.clone();
        }

        let result = self.flatten_uncached(class_id);
        self.flattened_cache
            .borrow_mut()
            .insert(class_id.id(), result.clone());
        result
    }

    fn flatten_uncached(&self, class_id: Id) -> Option<Vec<PrimitiveType>> {
        let info = self.classes.get(&class_id.id())?;

        let mut types = match info.super_class_id {
            Some(super_id) => self.flatten(super_id)?,
            None => Vec::new(),
        };
        types.extend(info.instance_fields.iter().map(|f| f.field_type));
        Some(types)
    }
}

impl Default for ClassMetadataStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u64) -> Id {
        Id::from(n)
    }

    fn field(name: u64, t: PrimitiveType) -> FieldDef {
        FieldDef {
            name_id: id(name),
            field_type: t,
        }
    }

    #[test]
    fn flattens_inherited_first() {
        let mut store = ClassMetadataStore::new();
        store.update_class(
            id(1),
            ClassInfo {
                super_class_id: None,
                instance_fields: vec![field(10, PrimitiveType::Int)],
            },
        );
        store.update_class(
            id(2),
            ClassInfo {
                super_class_id: Some(id(1)),
                instance_fields: vec![field(11, PrimitiveType::Boolean)],
            },
        );

        let flattened = store.flatten(id(2)).unwrap();
        assert_eq!(flattened, vec![PrimitiveType::Int, PrimitiveType::Boolean]);
    }

    #[test]
    fn unresolved_ancestor_yields_none() {
        let mut store = ClassMetadataStore::new();
        store.update_class(
            id(2),
            ClassInfo {
                super_class_id: Some(id(999)), // never dumped
                instance_fields: vec![field(11, PrimitiveType::Boolean)],
            },
        );
        assert!(store.flatten(id(2)).is_none());
    }

    #[test]
    fn re_dump_invalidates_memoized_layout() {
        let mut store = ClassMetadataStore::new();
        store.update_class(
            id(1),
            ClassInfo {
                super_class_id: None,
                instance_fields: vec![field(10, PrimitiveType::Int)],
            },
        );
        assert_eq!(store.flatten(id(1)).unwrap(), vec![PrimitiveType::Int]);

        store.update_class(
            id(1),
            ClassInfo {
                super_class_id: None,
                instance_fields: vec![field(10, PrimitiveType::Long)],
            },
        );
        assert_eq!(store.flatten(id(1)).unwrap(), vec![PrimitiveType::Long]);
    }

    #[test]
    fn empty_layout_is_some_empty_not_none() {
        let mut store = ClassMetadataStore::new();
        store.update_class(
            id(1),
            ClassInfo {
                super_class_id: None,
                instance_fields: vec![],
            },
        );
        assert_eq!(store.flatten(id(1)), Some(vec![]));
    }
}
