//! Registry names for every class of a forest.
//!
//! Nested anonymous types reuse short names all over fiscal schemas
//! (`infNFe.ide`, `infEvento.ide`, `det.prod`...). Every class occurrence
//! gets the shortest ancestor-qualified path that no other occurrence with
//! the same trailing name could also be shortened to, and from it a
//! registry name `{schema}.{version}.{slug}`.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use log::debug;
use serde::Serialize;

use crate::ir::{ClassForest, ClassId};

/// Name of a class as used in paths and generated class names.
///
/// Words start at every upper-case letter that follows a non upper-case
/// one, separators are dropped and each word is title-cased:
/// `TNFe` gives `Tnfe`, `infNFe` gives `InfNfe`.
pub fn class_name(name: &str) -> String {
    split_words(name).iter().map(|w| title_case(w)).collect()
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Upper,
    Lower,
    Numeric,
    Other,
}

fn char_class(c: char) -> CharClass {
    if c.is_uppercase() {
        CharClass::Upper
    } else if c.is_lowercase() {
        CharClass::Lower
    } else if c.is_numeric() {
        CharClass::Numeric
    } else {
        CharClass::Other
    }
}

fn split_words(name: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut buffer = String::new();
    let mut previous: Option<CharClass> = None;

    for c in name.chars() {
        let class = char_class(c);
        match class {
            CharClass::Other => {
                if !buffer.is_empty() {
                    words.push(std::mem::take(&mut buffer));
                }
            }
            CharClass::Upper if previous.is_some_and(|p| p != CharClass::Upper) => {
                if !buffer.is_empty() {
                    words.push(std::mem::take(&mut buffer));
                }
                buffer.push(c);
            }
            _ => buffer.push(c),
        }
        previous = Some(class);
    }
    if !buffer.is_empty() {
        words.push(buffer);
    }
    words
}

/// Upper-case letters that follow a non-letter, lower-case the others.
fn title_case(word: &str) -> String {
    let mut result = String::with_capacity(word.len());
    let mut after_letter = false;
    for c in word.chars() {
        if after_letter {
            result.extend(c.to_lowercase());
        } else {
            result.extend(c.to_uppercase());
        }
        after_letter = c.is_alphabetic();
    }
    result
}

/// One way of reaching a class from a root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassOccurrence {
    pub id: ClassId,
    /// Class ids from the root down to the class itself.
    pub lineage: Vec<ClassId>,
    /// Class names along `lineage`.
    pub path: Vec<String>,
}

impl ClassOccurrence {
    /// Dotted path, the binding class the occurrence maps to.
    pub fn key(&self) -> String {
        self.path.join(".")
    }

    pub fn leaf(&self) -> &str {
        self.path.last().map(String::as_str).unwrap_or_default()
    }

    /// Same class reached through the same path. Distinct classes may share
    /// a path when their local names are equal.
    pub fn same_as(&self, other: &ClassOccurrence) -> bool {
        self.id == other.id && self.path == other.path
    }
}

/// Every occurrence reachable from `roots` following inner classes, in
/// depth-first pre-order with children in declaration order.
pub fn class_occurrences(forest: &ClassForest, roots: &[ClassId]) -> Vec<ClassOccurrence> {
    let mut result = Vec::new();
    let mut seen: HashSet<(ClassId, String)> = HashSet::new();
    let mut stack: Vec<ClassOccurrence> = roots
        .iter()
        .rev()
        .map(|id| ClassOccurrence {
            id: *id,
            lineage: vec![*id],
            path: vec![class_name(&forest.get(*id).name)],
        })
        .collect();

    while let Some(occurrence) = stack.pop() {
        if !seen.insert((occurrence.id, occurrence.key())) {
            continue;
        }
        for child in forest.get(occurrence.id).inner.iter().rev() {
            if occurrence.lineage.contains(child) {
                continue;
            }
            let mut lineage = occurrence.lineage.clone();
            lineage.push(*child);
            let mut path = occurrence.path.clone();
            path.push(class_name(&forest.get(*child).name));
            stack.push(ClassOccurrence {
                id: *child,
                lineage,
                path,
            });
        }
        result.push(occurrence);
    }

    result
}

/// Registry data of one class occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryEntry {
    pub class: ClassId,
    #[serde(skip)]
    pub lineage: Vec<ClassId>,
    /// Dotted occurrence path.
    pub path: String,
    /// Minimal unique dotted path.
    pub unique_path: String,
    /// `{schema}.{version}.{slug}`.
    pub registry_name: String,
}

impl RegistryEntry {
    /// Generated Python class name: the unique path without dots.
    pub fn python_class_name(&self) -> String {
        self.unique_path.replace('.', "")
    }
}

/// Registry names of class occurrences, keyed by class and path.
#[derive(Debug, Clone, Default)]
pub struct RegistryNames {
    schema: String,
    version: String,
    entries: IndexMap<(ClassId, String), RegistryEntry>,
    taken: HashSet<String>,
    by_class: HashMap<ClassId, Vec<usize>>,
}

impl RegistryNames {
    pub fn new(schema: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    pub fn get(&self, occurrence: &ClassOccurrence) -> Option<&RegistryEntry> {
        self.entries.get(&(occurrence.id, occurrence.key()))
    }

    /// First registered entry with the given dotted path.
    pub fn find(&self, path: &str) -> Option<&RegistryEntry> {
        self.entries.values().find(|e| e.path == path)
    }

    pub fn registry_name(&self, path: &str) -> Option<&str> {
        self.find(path).map(|e| e.registry_name.as_str())
    }

    /// The occurrence of `target` to use when referenced from a class with
    /// the given lineage: the one sharing the longest ancestor prefix, first
    /// registered on ties.
    pub fn for_reference(&self, target: ClassId, from: &[ClassId]) -> Option<&RegistryEntry> {
        let indices = self.by_class.get(&target)?;
        let mut best: Option<(&RegistryEntry, usize)> = None;
        for index in indices {
            let Some((_, entry)) = self.entries.get_index(*index) else {
                continue;
            };
            let shared = entry
                .lineage
                .iter()
                .zip(from)
                .take_while(|(a, b)| a == b)
                .count();
            if best.is_none_or(|(_, n)| shared > n) {
                best = Some((entry, shared));
            }
        }
        best.map(|(entry, _)| entry)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn format_name(&self, slug: &str) -> String {
        format!("{}.{}.{}", self.schema, self.version, slug)
    }

    fn insert(&mut self, occurrence: &ClassOccurrence, unique_path: String, registry_name: String) {
        let path = occurrence.key();
        self.taken.insert(registry_name.clone());
        let (index, _) = self.entries.insert_full(
            (occurrence.id, path.clone()),
            RegistryEntry {
                class: occurrence.id,
                lineage: occurrence.lineage.clone(),
                path,
                unique_path,
                registry_name,
            },
        );
        self.by_class.entry(occurrence.id).or_default().push(index);
    }
}

/// Lower-case a dotted path and turn separators into underscores.
pub fn slugify(path: &str) -> String {
    path.chars()
        .map(|c| match c {
            '.' | '-' | ' ' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

/// Resolve the registry names of every occurrence reachable from `roots`
/// into `names`. Occurrences already named by an earlier call are kept.
pub fn resolve_registry_names(forest: &ClassForest, roots: &[ClassId], names: &mut RegistryNames) {
    let occurrences = class_occurrences(forest, roots);

    let mut by_leaf: HashMap<&str, Vec<&ClassOccurrence>> = HashMap::new();
    for occurrence in &occurrences {
        by_leaf.entry(occurrence.leaf()).or_default().push(occurrence);
    }

    for occurrence in &occurrences {
        if names.get(occurrence).is_some() {
            continue;
        }

        let others: Vec<&[String]> = by_leaf
            .get(occurrence.leaf())
            .into_iter()
            .flatten()
            .filter(|other| !other.same_as(occurrence))
            .map(|other| other.path.as_slice())
            .collect();
        let unique = if others.is_empty() {
            vec![occurrence.leaf().to_string()]
        } else {
            minimal_unique_path(&occurrence.path, &others)
        };

        let key = occurrence.key();
        let (unique_path, registry_name) = claim_name(names, &unique.join("."), &key);
        debug!("{key} ({}) -> {registry_name}", forest.get(occurrence.id).qname);
        names.insert(occurrence, unique_path, registry_name);
    }
}

/// Pick a registry name that is not taken yet: the minimal path, then the
/// full path, then the full path with a numeric suffix.
fn claim_name(names: &RegistryNames, unique: &str, full: &str) -> (String, String) {
    for candidate in [unique, full] {
        let name = names.format_name(&slugify(candidate));
        if !names.taken.contains(&name) {
            return (candidate.to_string(), name);
        }
    }
    let mut n = 2;
    loop {
        let candidate = format!("{full}{n}");
        let name = names.format_name(&slugify(&candidate));
        if !names.taken.contains(&name) {
            return (candidate, name);
        }
        n += 1;
    }
}

/// Drop path segments, innermost ancestors first, as long as the shortened
/// path could not also be obtained from one of the `others` paths sharing
/// its trailing name.
pub fn minimal_unique_path(path: &[String], others: &[&[String]]) -> Vec<String> {
    let mut current = path.to_vec();

    loop {
        let mut dropped = false;
        for i in (0..current.len().saturating_sub(1)).rev() {
            let mut candidate = current.clone();
            candidate.remove(i);
            let collides = others
                .iter()
                .any(|other| is_anchored_subsequence(&candidate, other));
            if !collides {
                current = candidate;
                dropped = true;
                break;
            }
        }
        if !dropped {
            break;
        }
    }

    current
}

/// Whether `short` can be obtained from `long` by removing segments other
/// than the last one.
fn is_anchored_subsequence(short: &[String], long: &[String]) -> bool {
    let (Some((short_last, short_init)), Some((long_last, long_init))) =
        (short.split_last(), long.split_last())
    else {
        return false;
    };
    if short_last != long_last {
        return false;
    }
    let mut remaining = long_init.iter();
    short_init
        .iter()
        .all(|segment| remaining.any(|candidate| candidate == segment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    fn path(p: &str) -> Vec<String> {
        p.split('.').map(str::to_string).collect()
    }

    const NESTED: &str = r#"
classes:
  - qname: "{ns}TNFe"
    name: TNFe
    inner:
      - qname: "{ns}TNFe.infNFe"
        name: infNFe
        inner:
          - qname: "{ns}TNFe.infNFe.ide"
            name: ide
          - qname: "{ns}TNFe.infNFe.emit"
            name: emit
  - qname: "{ns}TEvento"
    name: TEvento
    inner:
      - qname: "{ns}TEvento.infEvento"
        name: infEvento
        inner:
          - qname: "{ns}TEvento.infEvento.ide"
            name: ide
  - qname: "{ns}TRetEvento"
    name: TRetEvento
    inner:
      - qname: "{ns}TRetEvento.infEvento"
        name: infEvento
"#;

    fn resolved() -> (crate::ir::SchemaModel, RegistryNames) {
        let model = parse::from_yaml(NESTED).unwrap();
        let mut names = RegistryNames::new("nfe", "40");
        let roots = model.forest.roots().to_vec();
        resolve_registry_names(&model.forest, &roots, &mut names);
        (model, names)
    }

    #[test]
    fn unique_leaves_keep_their_own_name() {
        let (_, names) = resolved();
        assert_eq!(names.registry_name("Tnfe"), Some("nfe.40.tnfe"));
        assert_eq!(
            names.registry_name("Tnfe.InfNfe.Emit"),
            Some("nfe.40.emit")
        );
        assert_eq!(
            names.find("Tnfe.InfNfe.Emit").map(RegistryEntry::python_class_name).as_deref(),
            Some("Emit")
        );
    }

    #[test]
    fn duplicated_leaves_are_qualified() {
        let (_, names) = resolved();
        assert_eq!(
            names.find("Tnfe.InfNfe.Ide").map(|e| e.unique_path.as_str()),
            Some("Tnfe.Ide")
        );
        assert_eq!(
            names.find("Tevento.InfEvento.Ide").map(|e| e.unique_path.as_str()),
            Some("Tevento.Ide")
        );
        assert_eq!(
            names.registry_name("Tevento.InfEvento"),
            Some("nfe.40.tevento_infevento")
        );
        assert_eq!(
            names.registry_name("TretEvento.InfEvento"),
            Some("nfe.40.tretevento_infevento")
        );
    }

    #[test]
    fn registry_names_are_unique() {
        let (model, names) = resolved();
        assert_eq!(names.len(), model.forest.len());
        let distinct: HashSet<&str> = names.iter().map(|e| e.registry_name.as_str()).collect();
        assert_eq!(distinct.len(), names.len());
    }

    #[test]
    fn minimal_path_does_not_shadow_a_shorter_path() {
        let a = path("A.Leaf");
        let b = path("A.B.Leaf");
        assert_eq!(minimal_unique_path(&a, &[&b]), path("A.Leaf"));
        assert_eq!(minimal_unique_path(&b, &[&a]), path("B.Leaf"));
    }

    #[test]
    fn minimal_path_drops_inner_segments_first() {
        let a = path("A.X.Leaf");
        let b = path("B.X.Leaf");
        assert_eq!(minimal_unique_path(&a, &[&b]), path("A.Leaf"));
        assert_eq!(minimal_unique_path(&b, &[&a]), path("B.Leaf"));
    }

    #[test]
    fn identical_paths_keep_the_full_path() {
        let a = path("A.X.Leaf");
        let twin = path("A.X.Leaf");
        assert_eq!(minimal_unique_path(&a, &[&twin]), path("A.X.Leaf"));
    }

    #[test]
    fn slug_clashes_fall_back_to_suffixes() {
        let yaml = r#"
classes:
  - qname: "{ns}A"
    name: A
    inner:
      - { qname: "{ns}A.Leaf", name: Leaf }
  - qname: "{ns}B"
    name: B
    inner:
      - { qname: "{ns}B.Leaf", name: Leaf }
  - { qname: "{ns}A_Leaf", name: A_leaf }
"#;
        let model = parse::from_yaml(yaml).unwrap();
        let mut names = RegistryNames::new("s", "1");
        let roots = model.forest.roots().to_vec();
        resolve_registry_names(&model.forest, &roots, &mut names);
        let distinct: HashSet<&str> = names.iter().map(|e| e.registry_name.as_str()).collect();
        assert_eq!(distinct.len(), names.len());
        assert_eq!(names.registry_name("A.Leaf"), Some("s.1.a_leaf"));
    }

    #[test]
    fn resolution_is_deterministic() {
        let (_, first) = resolved();
        let (_, second) = resolved();
        let a: Vec<_> = first.iter().map(|e| (e.path.clone(), e.registry_name.clone())).collect();
        let b: Vec<_> = second.iter().map(|e| (e.path.clone(), e.registry_name.clone())).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn references_prefer_the_closest_occurrence() {
        let (model, names) = resolved();
        let emit = model.forest.lookup("{ns}TNFe.infNFe.emit").unwrap();
        let inf = model.forest.lookup("{ns}TNFe.infNFe").unwrap();
        let tnfe = model.forest.lookup("{ns}TNFe").unwrap();
        let entry = names.for_reference(emit, &[tnfe, inf]).unwrap();
        assert_eq!(entry.registry_name, "nfe.40.emit");
    }

    #[test]
    fn class_names_title_case_each_word() {
        assert_eq!(class_name("TNFe"), "Tnfe");
        assert_eq!(class_name("infNFe"), "InfNfe");
        assert_eq!(class_name("TRetEvento"), "TretEvento");
        assert_eq!(class_name("det"), "Det");
        assert_eq!(class_name("TipoDoc_situacao"), "TipoDocSituacao");
        assert_eq!(class_name("ICMS00"), "Icms00");
        assert_eq!(class_name("det2x"), "Det2X");
    }

    #[test]
    fn classes_sharing_a_name_get_distinct_entries() {
        let json = r#"{
            "classes": [
                {"qname": "{urn:a}Ender", "name": "Ender"},
                {"qname": "{urn:b}Ender", "name": "Ender"},
                {"qname": "{urn:a}Emit", "name": "Emit", "attributes": [
                    {"name": "enderB", "types": [{"class": "{urn:b}Ender"}]}
                ]}
            ]
        }"#;
        let model = parse::from_json(json).unwrap();
        let mut names = RegistryNames::new("spec", "10");
        let roots = model.forest.roots().to_vec();
        resolve_registry_names(&model.forest, &roots, &mut names);
        assert_eq!(names.len(), model.forest.len());

        let a = model.forest.lookup("{urn:a}Ender").unwrap();
        let b = model.forest.lookup("{urn:b}Ender").unwrap();
        let emit = model.forest.lookup("{urn:a}Emit").unwrap();
        let entry_a = names.for_reference(a, &[emit]).unwrap();
        let entry_b = names.for_reference(b, &[emit]).unwrap();
        assert_eq!(entry_a.registry_name, "spec.10.ender");
        assert_eq!(entry_b.registry_name, "spec.10.ender2");
        assert_eq!(entry_b.python_class_name(), "Ender2");
        assert_eq!(entry_b.path, "Ender");
    }
}
