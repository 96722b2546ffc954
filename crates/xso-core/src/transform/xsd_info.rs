//! Facts read back from the original XSD files.
//!
//! The class model loses a few things Odoo fields care about: the raw xsd
//! type of an element (`TDec_1302`), whether it sits in a `<choice>` and
//! whether that choice is mandatory. They are mined from the schema file a
//! class was declared in.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::debug;
use roxmltree::{Document, ParsingOptions};
use serde::Serialize;

use crate::ir::{ClassForest, ClassId, SchemaClass};

/// Extra facts about one element of a class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct XsdExtraInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xsd_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choice: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub xsd_choice_required: bool,
}

/// Mined facts keyed by `{class qname}#{attribute}`, plus documentation
/// recovered for classes that carry none.
#[derive(Debug, Clone, Default)]
pub struct XsdInfoTable {
    facts: HashMap<String, XsdExtraInfo>,
    docs: HashMap<ClassId, String>,
    mined: HashSet<ClassId>,
}

fn info_key(class_qname: &str, attr_name: &str) -> String {
    format!("{class_qname}#{attr_name}")
}

impl XsdInfoTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, class: &SchemaClass, attr_name: &str) -> Option<&XsdExtraInfo> {
        self.facts.get(&info_key(&class.qname, attr_name))
    }

    pub fn insert(&mut self, class: &SchemaClass, attr_name: &str, info: XsdExtraInfo) {
        self.facts.insert(info_key(&class.qname, attr_name), info);
    }

    /// The class documentation, or the one recovered from its declaration.
    pub fn documentation<'a>(&'a self, class: &'a SchemaClass) -> Option<&'a str> {
        class
            .documentation
            .as_deref()
            .or_else(|| self.docs.get(&class.id).map(String::as_str))
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}

#[derive(Debug, Clone)]
struct XsdNode {
    tag: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<usize>,
}

/// Owned copy of the element structure of a schema file.
#[derive(Debug, Clone)]
pub struct XsdTree {
    nodes: Vec<XsdNode>,
}

impl XsdTree {
    pub fn parse(text: &str) -> Result<Self, roxmltree::Error> {
        let options = ParsingOptions {
            allow_dtd: true,
            ..Default::default()
        };
        let doc = Document::parse_with_options(text, options)?;

        let mut nodes: Vec<XsdNode> = Vec::new();
        let mut stack = vec![(doc.root_element(), None::<usize>)];
        while let Some((node, parent)) = stack.pop() {
            let index = nodes.len();
            nodes.push(XsdNode {
                tag: node.tag_name().name().to_string(),
                attributes: node
                    .attributes()
                    .map(|a| (a.name().to_string(), a.value().to_string()))
                    .collect(),
                text: node
                    .children()
                    .filter(|n| n.is_text())
                    .filter_map(|n| n.text())
                    .collect(),
                children: Vec::new(),
            });
            if let Some(parent) = parent {
                nodes[parent].children.push(index);
            }
            let children: Vec<_> = node.children().filter(|n| n.is_element()).collect();
            stack.extend(children.into_iter().rev().map(|c| (c, Some(index))));
        }

        Ok(Self { nodes })
    }

    const ROOT: usize = 0;

    fn tag(&self, node: usize) -> &str {
        &self.nodes[node].tag
    }

    fn attr(&self, node: usize, name: &str) -> Option<&str> {
        self.nodes[node]
            .attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    fn children(&self, node: usize) -> &[usize] {
        &self.nodes[node].children
    }

    fn child(&self, node: usize, tag: &str) -> Option<usize> {
        self.children(node)
            .iter()
            .copied()
            .find(|c| self.tag(*c) == tag)
    }

    /// Text of `annotation/documentation` under `node`.
    fn documentation(&self, node: usize) -> Option<String> {
        let annotation = self.child(node, "annotation")?;
        let text = self
            .children(annotation)
            .iter()
            .filter(|c| self.tag(**c) == "documentation")
            .map(|c| self.nodes[*c].text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        (!text.is_empty()).then_some(text)
    }

    /// Top-level declaration of a named class: `(complexType, element)`.
    fn top_level(&self, name: &str) -> Option<(usize, Option<usize>)> {
        for child in self.children(Self::ROOT) {
            if self.attr(*child, "name") != Some(name) {
                continue;
            }
            match self.tag(*child) {
                "complexType" => return Some((*child, None)),
                "element" => {
                    if let Some(ct) = self.child(*child, "complexType") {
                        return Some((ct, Some(*child)));
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// Element named `name` with an anonymous complex type, under `scope`
    /// without entering other complex types.
    fn nested(&self, scope: usize, name: &str) -> Option<(usize, Option<usize>)> {
        let mut stack: Vec<usize> = self.children(scope).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            match self.tag(node) {
                "complexType" => continue,
                "element" => {
                    if self.attr(node, "name") == Some(name)
                        && let Some(ct) = self.child(node, "complexType")
                    {
                        return Some((ct, Some(node)));
                    }
                    continue;
                }
                _ => stack.extend(self.children(node).iter().rev().copied()),
            }
        }
        None
    }
}

fn strip_prefix(qname: &str) -> &str {
    qname.rsplit_once(':').map(|(_, local)| local).unwrap_or(qname)
}

fn is_optional(tree: &XsdTree, node: usize) -> bool {
    tree.attr(node, "minOccurs") == Some("0")
}

/// Mines [`XsdExtraInfo`] from schema files, parsing each file once.
#[derive(Debug, Default)]
pub struct XsdInfoMiner {
    base_dir: Option<PathBuf>,
    cache: HashMap<PathBuf, Option<Rc<XsdTree>>>,
}

impl XsdInfoMiner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Relative class locations are looked up under `dir`.
    pub fn with_base_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(dir.into()),
            ..Self::default()
        }
    }

    fn tree(&mut self, location: &Path) -> Option<Rc<XsdTree>> {
        let path = match &self.base_dir {
            Some(base) if location.is_relative() => base.join(location),
            _ => location.to_path_buf(),
        };
        self.cache
            .entry(path)
            .or_insert_with_key(|path| {
                let text = match std::fs::read_to_string(path) {
                    Ok(text) => text,
                    Err(e) => {
                        debug!("no schema file {}: {e}", path.display());
                        return None;
                    }
                };
                match XsdTree::parse(&text) {
                    Ok(tree) => Some(Rc::new(tree)),
                    Err(e) => {
                        debug!("cannot parse {}: {e}", path.display());
                        None
                    }
                }
            })
            .clone()
    }

    /// Mine the class at the end of `lineage` into `table`. Classes are mined
    /// once; missing or unreadable schema files are skipped.
    pub fn mine(&mut self, forest: &ClassForest, lineage: &[ClassId], table: &mut XsdInfoTable) {
        let Some(&id) = lineage.last() else {
            return;
        };
        let class = forest.get(id);
        if !class.is_complex() || !table.mined.insert(id) {
            return;
        }

        let location = lineage
            .iter()
            .rev()
            .find_map(|id| forest.get(*id).location.as_deref());
        let Some(tree) = location.and_then(|l| self.tree(l)) else {
            return;
        };

        let Some((complex_type, element)) = locate(&tree, forest, lineage) else {
            debug!("no declaration found for {}", class.name);
            return;
        };

        if class.documentation.is_none()
            && let Some(doc) = element
                .and_then(|e| tree.documentation(e))
                .or_else(|| tree.documentation(complex_type))
        {
            table.docs.insert(id, doc);
        }

        for (name, info) in element_facts(&tree, complex_type, &class.name) {
            table.insert(class, &name, info);
        }
    }
}

/// Follow the lineage from the top-level declaration down to the class.
fn locate(
    tree: &XsdTree,
    forest: &ClassForest,
    lineage: &[ClassId],
) -> Option<(usize, Option<usize>)> {
    let (root, rest) = lineage.split_first()?;
    let mut found = tree.top_level(&forest.get(*root).name)?;
    for id in rest {
        found = tree.nested(found.0, &forest.get(*id).name)?;
    }
    Some(found)
}

/// Facts for every element and attribute declared directly by a complex type.
fn element_facts(
    tree: &XsdTree,
    complex_type: usize,
    class_name: &str,
) -> Vec<(String, XsdExtraInfo)> {
    let mut facts = Vec::new();
    let mut choices: Vec<usize> = Vec::new();

    // (node, enclosing compositors innermost last)
    let mut stack: Vec<(usize, Rc<Vec<usize>>)> = tree
        .children(complex_type)
        .iter()
        .rev()
        .map(|c| (*c, Rc::new(Vec::new())))
        .collect();

    while let Some((node, compositors)) = stack.pop() {
        match tree.tag(node) {
            "complexType" | "annotation" => {}
            "element" | "attribute" => {
                let Some(name) = tree.attr(node, "name").or_else(|| tree.attr(node, "ref")) else {
                    continue;
                };
                let xsd_type = tree
                    .attr(node, "type")
                    .map(|t| strip_prefix(t).to_string())
                    .or_else(|| inline_base(tree, node));

                let mut info = XsdExtraInfo {
                    xsd_type,
                    ..XsdExtraInfo::default()
                };
                if let Some(choice) = compositors.iter().rev().find(|c| tree.tag(**c) == "choice") {
                    let index = match choices.iter().position(|c| c == choice) {
                        Some(pos) => pos + 1,
                        None => {
                            choices.push(*choice);
                            choices.len()
                        }
                    };
                    info.choice = Some(choice_name(class_name, index));
                    info.xsd_choice_required = compositors.iter().all(|c| !is_optional(tree, *c));
                }
                facts.push((strip_prefix(name).to_string(), info));
            }
            tag => {
                let inner = if matches!(tag, "sequence" | "choice" | "all") {
                    let mut chain = compositors.as_ref().clone();
                    chain.push(node);
                    Rc::new(chain)
                } else {
                    compositors
                };
                for child in tree.children(node).iter().rev() {
                    stack.push((*child, inner.clone()));
                }
            }
        }
    }

    facts
}

/// Base type of an inline `simpleType/restriction`.
fn inline_base(tree: &XsdTree, element: usize) -> Option<String> {
    let simple = tree.child(element, "simpleType")?;
    let restriction = tree.child(simple, "restriction")?;
    tree.attr(restriction, "base").map(|b| strip_prefix(b).to_string())
}

/// Choice groups are named after the class, numbered from the second one.
pub fn choice_name(class_name: &str, index: usize) -> String {
    let base = class_name.to_lowercase();
    if index > 1 {
        format!("{base}{index}")
    } else {
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use std::io::Write;

    const XSD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:complexType name="TEnderEmi">
    <xs:sequence>
      <xs:element name="xLgr" type="TString"/>
      <xs:element name="UF" type="TUfEmi"/>
    </xs:sequence>
  </xs:complexType>
  <xs:element name="TNFe">
    <xs:annotation>
      <xs:documentation>Tipo Nota Fiscal Eletrônica</xs:documentation>
    </xs:annotation>
    <xs:complexType>
      <xs:sequence>
        <xs:element name="infNFe">
          <xs:annotation>
            <xs:documentation>Informações da Nota Fiscal eletrônica</xs:documentation>
          </xs:annotation>
          <xs:complexType>
            <xs:sequence>
              <xs:choice>
                <xs:element name="CNPJ" type="TCnpj"/>
                <xs:element name="CPF" type="TCpf"/>
              </xs:choice>
              <xs:element name="vProd" type="TDec_1302"/>
              <xs:choice minOccurs="0">
                <xs:element name="refNFe" type="TChNFe"/>
                <xs:element name="refECF">
                  <xs:simpleType>
                    <xs:restriction base="xs:string"/>
                  </xs:simpleType>
                </xs:element>
              </xs:choice>
            </xs:sequence>
            <xs:attribute name="versao" type="TVerNFe" use="required"/>
          </xs:complexType>
        </xs:element>
      </xs:sequence>
    </xs:complexType>
  </xs:element>
</xs:schema>
"#;

    fn bundle(location: &Path) -> String {
        format!(
            r#"
classes:
  - qname: TEnderEmi
    name: TEnderEmi
    location: "{loc}"
  - qname: TNFe
    name: TNFe
    location: "{loc}"
    inner:
      - qname: TNFe.infNFe
        name: infNFe
"#,
            loc = location.display()
        )
    }

    fn mined() -> (crate::ir::SchemaModel, XsdInfoTable) {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(XSD.as_bytes()).unwrap();
        let model = parse::from_yaml(&bundle(file.path())).unwrap();

        let mut miner = XsdInfoMiner::new();
        let mut table = XsdInfoTable::new();
        for id in model.forest.ids() {
            let lineage = model.forest.lineage(id);
            miner.mine(&model.forest, &lineage, &mut table);
        }
        (model, table)
    }

    #[test]
    fn reads_xsd_types() {
        let (model, table) = mined();
        let ender = model.forest.resolve("TEnderEmi").unwrap();
        assert_eq!(
            table.get(ender, "UF").and_then(|i| i.xsd_type.as_deref()),
            Some("TUfEmi")
        );
        let inf = model.forest.resolve("TNFe.infNFe").unwrap();
        assert_eq!(
            table.get(inf, "vProd"),
            Some(&XsdExtraInfo {
                xsd_type: Some("TDec_1302".to_string()),
                ..XsdExtraInfo::default()
            })
        );
        assert_eq!(
            table.get(inf, "versao").and_then(|i| i.xsd_type.as_deref()),
            Some("TVerNFe")
        );
        assert_eq!(
            table.get(inf, "refECF").and_then(|i| i.xsd_type.as_deref()),
            Some("string")
        );
    }

    #[test]
    fn records_choice_groups() {
        let (model, table) = mined();
        let inf = model.forest.resolve("TNFe.infNFe").unwrap();

        let cnpj = table.get(inf, "CNPJ").unwrap();
        assert_eq!(cnpj.choice.as_deref(), Some("infnfe"));
        assert!(cnpj.xsd_choice_required);

        let ref_nfe = table.get(inf, "refNFe").unwrap();
        assert_eq!(ref_nfe.choice.as_deref(), Some("infnfe2"));
        assert!(!ref_nfe.xsd_choice_required);
    }

    #[test]
    fn backfills_class_documentation() {
        let (model, table) = mined();
        let inf = model.forest.resolve("TNFe.infNFe").unwrap();
        assert_eq!(
            table.documentation(inf),
            Some("Informações da Nota Fiscal eletrônica")
        );
        let tnfe = model.forest.resolve("TNFe").unwrap();
        assert_eq!(table.documentation(tnfe), Some("Tipo Nota Fiscal Eletrônica"));
    }

    #[test]
    fn missing_schema_files_are_skipped() {
        let model = parse::from_yaml(&bundle(Path::new("/nonexistent/leiaute.xsd"))).unwrap();
        let mut miner = XsdInfoMiner::new();
        let mut table = XsdInfoTable::new();
        for id in model.forest.ids() {
            miner.mine(&model.forest, &model.forest.lineage(id), &mut table);
        }
        assert!(table.is_empty());
    }

    #[test]
    fn choice_names() {
        assert_eq!(choice_name("infNFe", 1), "infnfe");
        assert_eq!(choice_name("infNFe", 3), "infnfe3");
    }
}
