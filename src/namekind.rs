//! The name-kind classifier: tracks the semantic role under which each
//! UTF-8 symbol id was first referenced, so pass 2 can route its value
//! through the right transformer hook. A symbol's kind is never
//! downgraded once set; an unreferenced symbol has no kind and falls
//! through to the generic string hook.

use std::collections::HashMap;

use crate::id::Id;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum NameKind {
    ClassName,
    FieldName,
    SourceFileName,
    ThreadName,
    ThreadGroupName,
    ThreadGroupParentName,
    /// A `FRAME` record's method name or method signature id. Hprof
    /// does not always allow the two to be told apart at the point of
    /// transformation, so both are recorded under this one kind and
    /// routed through the generic string hook -- but the kind still
    /// exists (rather than leaving the id unclassified) so that a
    /// later, unrelated reference to the same id can't reclassify it.
    MethodNameOrSignature,
}

#[derive(Default)]
pub struct NameKindTable {
    kinds: HashMap<u64, NameKind>,
}

impl NameKindTable {
    pub fn new() -> Self {
        NameKindTable::default()
    }

    /// Classifies `id` as `kind`, unless it already has a kind -- first
    /// appearance wins, matching the "not specified... left as observed"
    /// handling of duplicate UTF-8 records for the same symbol id.
    pub fn classify(&mut self, id: Id, kind: NameKind) {
        self.kinds.entry(id.id()).or_insert(kind);
    }

    pub fn kind_of(&self, id: Id) -> Option<NameKind> {
        self.kinds.get(&id.id()).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_classification_wins() {
        let mut table = NameKindTable::new();
        let id = Id::from(1);
        table.classify(id, NameKind::ClassName);
        table.classify(id, NameKind::FieldName);
        assert_eq!(table.kind_of(id), Some(NameKind::ClassName));
    }

    #[test]
    fn unclassified_symbol_has_no_kind() {
        let table = NameKindTable::new();
        assert_eq!(table.kind_of(Id::from(42)), None);
    }
}
