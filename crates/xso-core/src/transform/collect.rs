use std::collections::HashSet;

use crate::ir::{ClassForest, ClassId};

/// Classes reached during collection, split by kind.
///
/// Both lists keep first-seen order and hold each class once, whatever the
/// number of packages or modules it was reached from.
#[derive(Debug, Clone, Default)]
pub struct CollectedTypes {
    simple: Vec<ClassId>,
    complex: Vec<ClassId>,
    simple_set: HashSet<ClassId>,
    complex_set: HashSet<ClassId>,
}

impl CollectedTypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every class reachable from `roots` through inner classes.
    pub fn add_reachable(&mut self, forest: &ClassForest, roots: &[ClassId]) {
        for id in forest.walk(roots) {
            if forest.get(id).is_enumeration() {
                if self.simple_set.insert(id) {
                    self.simple.push(id);
                }
            } else if self.complex_set.insert(id) {
                self.complex.push(id);
            }
        }
    }

    /// Enumerations, first-seen order.
    pub fn simple_types(&self) -> &[ClassId] {
        &self.simple
    }

    /// Complex classes, first-seen order.
    pub fn complex_types(&self) -> &[ClassId] {
        &self.complex
    }

    pub fn is_simple(&self, id: ClassId) -> bool {
        self.simple_set.contains(&id)
    }

    pub fn is_complex(&self, id: ClassId) -> bool {
        self.complex_set.contains(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    #[test]
    fn collects_each_class_once_in_first_seen_order() {
        let yaml = r#"
classes:
  - qname: A
    name: A
    inner:
      - { qname: A.B, name: B }
      - { qname: A.E, name: E, kind: enumeration }
  - { qname: C, name: C }
  - { qname: F, name: F, kind: enumeration }
modules:
  one: [A, F]
  two: [C, A]
"#;
        let model = parse::from_yaml(yaml).unwrap();
        let mut collected = CollectedTypes::new();
        for roots in model.modules.values() {
            collected.add_reachable(&model.forest, roots);
        }
        let names = |ids: &[ClassId]| -> Vec<String> {
            ids.iter().map(|id| model.forest.get(*id).name.clone()).collect()
        };
        assert_eq!(names(collected.complex_types()), vec!["A", "B", "C"]);
        assert_eq!(names(collected.simple_types()), vec!["E", "F"]);

        let e = model.forest.lookup("A.E").unwrap();
        assert!(collected.is_simple(e));
        assert!(!collected.is_complex(e));
        let c = model.forest.lookup("C").unwrap();
        assert!(collected.is_complex(c));
        assert!(!collected.is_simple(c));
    }
}
