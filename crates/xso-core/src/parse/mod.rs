pub mod bundle;

use indexmap::IndexMap;

use crate::error::LoadError;
use crate::ir::{ClassForest, ClassId, SchemaClass, SchemaModel};
use bundle::{BundleClass, ClassBundle};

/// Module used when a bundle carries no module grouping.
pub const DEFAULT_MODULE: &str = "models";

/// Parse a class-model bundle from YAML.
pub fn from_yaml(input: &str) -> Result<SchemaModel, LoadError> {
    let bundle: ClassBundle = serde_yaml_ng::from_str(input)?;
    build_model(bundle)
}

/// Parse a class-model bundle from JSON.
pub fn from_json(input: &str) -> Result<SchemaModel, LoadError> {
    let bundle: ClassBundle = serde_json::from_str(input)?;
    build_model(bundle)
}

/// Flatten a nested bundle into a [`SchemaModel`] arena.
pub fn build_model(bundle: ClassBundle) -> Result<SchemaModel, LoadError> {
    let mut forest = ClassForest::new();
    let mut stack: Vec<(BundleClass, Option<ClassId>)> =
        bundle.classes.into_iter().rev().map(|c| (c, None)).collect();

    while let Some((class, parent)) = stack.pop() {
        let BundleClass {
            qname,
            name,
            kind,
            location,
            documentation,
            attributes,
            values,
            inner,
        } = class;

        let id = forest
            .insert(SchemaClass {
                id: ClassId(0),
                qname: qname.clone(),
                name,
                kind,
                location,
                documentation,
                attributes,
                values,
                inner: Vec::new(),
                parent,
            })
            .ok_or(LoadError::DuplicateClass(qname))?;

        if let Some(parent) = parent {
            forest.get_mut(parent).inner.push(id);
        }
        stack.extend(inner.into_iter().rev().map(|c| (c, Some(id))));
    }

    let modules = if bundle.modules.is_empty() {
        let mut modules = IndexMap::new();
        modules.insert(DEFAULT_MODULE.to_string(), forest.roots().to_vec());
        modules
    } else {
        resolve_groups(&forest, bundle.modules)?
    };

    let packages = if bundle.packages.is_empty() {
        derive_packages(&modules)
    } else {
        resolve_groups(&forest, bundle.packages)?
    };

    Ok(SchemaModel {
        forest,
        modules,
        packages,
    })
}

fn resolve_groups(
    forest: &ClassForest,
    groups: IndexMap<String, Vec<String>>,
) -> Result<IndexMap<String, Vec<ClassId>>, LoadError> {
    groups
        .into_iter()
        .map(|(path, qnames)| {
            let ids = qnames
                .iter()
                .map(|qname| {
                    forest.lookup(qname).ok_or_else(|| LoadError::UnknownClass {
                        group: path.clone(),
                        qname: qname.clone(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok((path, ids))
        })
        .collect()
}

/// A module's package is its dotted path without the last segment.
fn derive_packages(modules: &IndexMap<String, Vec<ClassId>>) -> IndexMap<String, Vec<ClassId>> {
    let mut packages: IndexMap<String, Vec<ClassId>> = IndexMap::new();
    for (module, ids) in modules {
        let package = module.rsplit_once('.').map(|(p, _)| p).unwrap_or("");
        let entry = packages.entry(package.to_string()).or_default();
        for id in ids {
            if !entry.contains(id) {
                entry.push(*id);
            }
        }
    }
    packages
}

#[cfg(test)]
mod tests {
    use super::*;

    const NESTED: &str = r#"
classes:
  - qname: "{ns}TNFe"
    name: TNFe
    inner:
      - qname: "{ns}infNFe"
        name: infNFe
        inner:
          - qname: "{ns}ide"
            name: ide
      - qname: "{ns}Signature"
        name: Signature
  - qname: "{ns}TUf"
    name: TUf
    kind: enumeration
    values:
      - value: SP
modules:
  nfe.bindings.leiaute: ["{ns}TNFe", "{ns}TUf"]
"#;

    #[test]
    fn flattens_inner_classes_in_declaration_order() {
        let model = from_yaml(NESTED).unwrap();
        let forest = &model.forest;
        assert_eq!(forest.len(), 5);
        assert_eq!(forest.roots().len(), 2);

        let tnfe = forest.resolve("{ns}TNFe").unwrap();
        let inner: Vec<&str> = tnfe
            .inner
            .iter()
            .map(|id| forest.get(*id).name.as_str())
            .collect();
        assert_eq!(inner, vec!["infNFe", "Signature"]);

        let ide = forest.lookup("{ns}ide").unwrap();
        let lineage: Vec<&str> = forest
            .lineage(ide)
            .iter()
            .map(|id| forest.get(*id).name.as_str())
            .collect();
        assert_eq!(lineage, vec!["TNFe", "infNFe", "ide"]);
    }

    #[test]
    fn derives_packages_from_modules() {
        let model = from_yaml(NESTED).unwrap();
        assert_eq!(model.packages.len(), 1);
        assert_eq!(model.packages["nfe.bindings"].len(), 2);
    }

    #[test]
    fn rejects_duplicate_qnames() {
        let yaml = r#"
classes:
  - { qname: "{ns}A", name: A }
  - { qname: "{ns}A", name: A }
"#;
        assert!(matches!(from_yaml(yaml), Err(LoadError::DuplicateClass(q)) if q == "{ns}A"));
    }

    #[test]
    fn rejects_unknown_module_members() {
        let yaml = r#"
classes:
  - { qname: "{ns}A", name: A }
modules:
  foo: ["{ns}B"]
"#;
        assert!(matches!(from_yaml(yaml), Err(LoadError::UnknownClass { .. })));
    }

    #[test]
    fn defaults_to_a_single_module() {
        let yaml = r#"{"classes": [{"qname": "A", "name": "A"}]}"#;
        let model = from_json(yaml).unwrap();
        assert_eq!(model.modules.len(), 1);
        assert_eq!(model.modules[DEFAULT_MODULE].len(), 1);
    }
}
