use std::collections::HashMap;

use indexmap::IndexMap;

use super::schema::{ClassId, SchemaClass};

/// Arena holding every class of a parsed schema set.
///
/// Parents own their inner classes only for traversal purposes: all classes
/// live here for the whole run and are addressed by [`ClassId`].
#[derive(Debug, Clone, Default)]
pub struct ClassForest {
    classes: Vec<SchemaClass>,
    by_qname: HashMap<String, ClassId>,
    roots: Vec<ClassId>,
}

impl ClassForest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a class, returning its id. Returns `None` if the qualified name
    /// is already taken.
    pub(crate) fn insert(&mut self, mut class: SchemaClass) -> Option<ClassId> {
        if self.by_qname.contains_key(&class.qname) {
            return None;
        }
        let id = ClassId(self.classes.len());
        class.id = id;
        self.by_qname.insert(class.qname.clone(), id);
        if class.parent.is_none() {
            self.roots.push(id);
        }
        self.classes.push(class);
        Some(id)
    }

    pub fn get(&self, id: ClassId) -> &SchemaClass {
        &self.classes[id.0]
    }

    pub fn get_mut(&mut self, id: ClassId) -> &mut SchemaClass {
        &mut self.classes[id.0]
    }

    pub fn lookup(&self, qname: &str) -> Option<ClassId> {
        self.by_qname.get(qname).copied()
    }

    pub fn resolve(&self, qname: &str) -> Option<&SchemaClass> {
        self.lookup(qname).map(|id| self.get(id))
    }

    /// Top-level classes in declaration order.
    pub fn roots(&self) -> &[ClassId] {
        &self.roots
    }

    pub fn iter(&self) -> impl Iterator<Item = &SchemaClass> {
        self.classes.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = ClassId> + '_ {
        (0..self.classes.len()).map(ClassId)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Ancestor chain of a class, root first, the class itself last.
    pub fn lineage(&self, id: ClassId) -> Vec<ClassId> {
        let mut chain = vec![id];
        let mut current = self.get(id).parent;
        while let Some(parent) = current {
            chain.push(parent);
            current = self.get(parent).parent;
        }
        chain.reverse();
        chain
    }

    /// Depth-first pre-order walk following inner-class edges, children in
    /// declaration order. Each class is yielded once.
    pub fn walk(&self, roots: &[ClassId]) -> Vec<ClassId> {
        let mut seen = vec![false; self.classes.len()];
        let mut order = Vec::new();
        let mut stack: Vec<ClassId> = roots.iter().rev().copied().collect();

        while let Some(id) = stack.pop() {
            if std::mem::replace(&mut seen[id.0], true) {
                continue;
            }
            order.push(id);
            stack.extend(self.get(id).inner.iter().rev().copied());
        }

        order
    }
}

/// A class forest together with the external module grouping.
#[derive(Debug, Clone, Default)]
pub struct SchemaModel {
    pub forest: ClassForest,
    /// Output module path → top-level classes rendered in it.
    pub modules: IndexMap<String, Vec<ClassId>>,
    /// Package path → top-level classes of the package.
    pub packages: IndexMap<String, Vec<ClassId>>,
}
