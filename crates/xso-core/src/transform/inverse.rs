//! Many-to-one keys required by one-to-many fields.
//!
//! A list of a nested complex type becomes `fields.One2many(child, key)` on
//! the parent, and Odoo wants `key` to exist as a Many2one on the child. The
//! child class never mentions its parent, so the keys are collected over the
//! whole forest before anything is rendered.

use indexmap::IndexMap;
use log::debug;
use serde::Serialize;

use crate::ir::{ClassForest, ClassId, SchemaAttribute};

use super::collect::CollectedTypes;
use super::name_resolver::{ClassOccurrence, RegistryNames};
use super::naming::FieldNaming;
use super::skip::SkipPatterns;

/// A key field to inject on a child model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImplicitInverse {
    /// Registry name of the model holding the one-to-many field.
    pub parent: String,
    pub field_name: String,
}

/// Child registry name → keys to inject, in collection order.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ImplicitInverseTable {
    entries: IndexMap<String, Vec<ImplicitInverse>>,
}

impl ImplicitInverseTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a key on `child`. Returns `false` if it was already there.
    pub fn register(&mut self, child: &str, inverse: ImplicitInverse) -> bool {
        let keys = self.entries.entry(child.to_string()).or_default();
        if keys.contains(&inverse) {
            return false;
        }
        keys.push(inverse);
        true
    }

    pub fn get(&self, child: &str) -> &[ImplicitInverse] {
        self.entries.get(child).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn contains(&self, child: &str, parent: &str, field_name: &str) -> bool {
        self.get(child)
            .iter()
            .any(|i| i.parent == parent && i.field_name == field_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<ImplicitInverse>)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Local names of the classes of a lineage, outermost first.
pub fn lineage_names<'a>(forest: &'a ClassForest, lineage: &[ClassId]) -> Vec<&'a str> {
    lineage
        .iter()
        .map(|id| forest.get(*id).name.as_str())
        .collect()
}

/// Whether a class, or any class enclosing it, matches a skip pattern.
/// `parents` are the lineage names, the class itself last.
pub fn is_skipped_lineage(skip: &SkipPatterns, parents: &[&str]) -> bool {
    (0..parents.len()).any(|i| skip.matches(parents[i], &parents[..i]))
}

/// The complex class a list attribute maps to as a one-to-many, if any.
///
/// `parents` are the local names of the owning class lineage, the owner
/// last. Skipped attributes and skipped or unknown targets yield `None`.
pub fn one2many_target(
    forest: &ClassForest,
    types: &CollectedTypes,
    skip: &SkipPatterns,
    parents: &[&str],
    attr: &SchemaAttribute,
) -> Option<ClassId> {
    if !attr.is_list() || skip.matches(&attr.name, parents) {
        return None;
    }
    let target = forest.lookup(attr.primary_type()?.class_qname()?)?;
    if !types.is_complex(target) || skip.matches(&forest.get(target).name, parents) {
        return None;
    }
    Some(target)
}

/// Collects [`ImplicitInverse`] keys for class occurrences.
#[derive(Debug, Clone, Copy)]
pub struct InverseCollector<'a> {
    pub forest: &'a ClassForest,
    pub names: &'a RegistryNames,
    pub types: &'a CollectedTypes,
    pub skip: &'a SkipPatterns,
    pub naming: &'a FieldNaming,
}

impl InverseCollector<'_> {
    /// Register the keys required by every one-to-many of `occurrences`.
    pub fn collect(&self, occurrences: &[ClassOccurrence], table: &mut ImplicitInverseTable) {
        for occurrence in occurrences {
            let class = self.forest.get(occurrence.id);
            if !class.is_complex() {
                continue;
            }
            let parents = lineage_names(self.forest, &occurrence.lineage);
            if is_skipped_lineage(self.skip, &parents) {
                continue;
            }
            let Some(parent) = self.names.get(occurrence) else {
                continue;
            };

            for attr in &class.attributes {
                let Some(target) =
                    one2many_target(self.forest, self.types, self.skip, &parents, attr)
                else {
                    continue;
                };
                let Some(child) = self.names.for_reference(target, &occurrence.lineage) else {
                    continue;
                };

                let inverse = ImplicitInverse {
                    parent: parent.registry_name.clone(),
                    field_name: self.naming.inverse_field_name(&attr.name, &class.name),
                };
                if table.register(&child.registry_name, inverse) {
                    debug!(
                        "implicit inverse {}.{} on {}",
                        class.name, attr.name, child.registry_name
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldNamingStrategy;
    use crate::parse;
    use crate::transform::name_resolver::{class_occurrences, resolve_registry_names};

    const BUNDLE: &str = r#"
classes:
  - qname: A
    name: A
    attributes:
      - name: x
        types: [{class: B}]
  - qname: B
    name: B
    attributes:
      - name: items
        max_occurs: unbounded
        types: [{class: C}]
      - name: lines
        max_occurs: unbounded
        types: [{class: D}]
      - name: codes
        max_occurs: unbounded
        types: [{datatype: string}]
  - { qname: C, name: C }
  - { qname: D, name: D }
"#;

    fn collect(skip: &[String]) -> ImplicitInverseTable {
        let model = parse::from_yaml(BUNDLE).unwrap();
        let roots = model.forest.roots().to_vec();
        let mut names = RegistryNames::new("nfe", "40");
        resolve_registry_names(&model.forest, &roots, &mut names);
        let mut types = CollectedTypes::new();
        types.add_reachable(&model.forest, &roots);
        let skip = SkipPatterns::new(skip).unwrap();
        let naming = FieldNaming::new(FieldNamingStrategy::PrefixRawName, "nfe40_");

        let collector = InverseCollector {
            forest: &model.forest,
            names: &names,
            types: &types,
            skip: &skip,
            naming: &naming,
        };
        let mut table = ImplicitInverseTable::new();
        let occurrences = class_occurrences(&model.forest, &roots);
        collector.collect(&occurrences, &mut table);
        collector.collect(&occurrences, &mut table);
        table
    }

    #[test]
    fn registers_keys_on_list_children() {
        let table = collect(&[]);
        assert_eq!(
            table.get("nfe.40.c"),
            &[ImplicitInverse {
                parent: "nfe.40.b".to_string(),
                field_name: "nfe40_items_B_id".to_string(),
            }]
        );
        assert!(table.contains("nfe.40.d", "nfe.40.b", "nfe40_lines_B_id"));
        assert!(table.get("nfe.40.b").is_empty());
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn skipped_targets_get_no_key() {
        let table = collect(&["^C$".to_string()]);
        assert!(table.get("nfe.40.c").is_empty());
        assert_eq!(table.get("nfe.40.d").len(), 1);
    }

    #[test]
    fn skipping_covers_inner_classes() {
        let skip = SkipPatterns::new(&[]).unwrap();
        assert!(is_skipped_lineage(&skip, &["Signature", "SignedInfo"]));
        assert!(!is_skipped_lineage(&skip, &["TNFe", "infNFe"]));
    }

    #[test]
    fn skipped_fields_get_no_key() {
        let table = collect(&["B.lines".to_string()]);
        assert!(table.get("nfe.40.d").is_empty());
        assert_eq!(table.get("nfe.40.c").len(), 1);
    }
}
