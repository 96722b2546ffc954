use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Index of a class inside a [`ClassForest`](super::ClassForest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ClassId(pub usize);

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Whether a class is a model-like complex type or a value enumeration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassKind {
    #[default]
    Complex,
    Enumeration,
}

/// A schema class (complex type, anonymous element type or enumeration).
#[derive(Debug, Clone)]
pub struct SchemaClass {
    pub id: ClassId,
    pub qname: String,
    pub name: String,
    pub kind: ClassKind,
    /// Schema file the class was declared in.
    pub location: Option<PathBuf>,
    pub documentation: Option<String>,
    pub attributes: Vec<SchemaAttribute>,
    /// Enumeration values, empty for complex classes.
    pub values: Vec<EnumValue>,
    pub inner: Vec<ClassId>,
    pub parent: Option<ClassId>,
}

impl SchemaClass {
    pub fn is_enumeration(&self) -> bool {
        self.kind == ClassKind::Enumeration
    }

    pub fn is_complex(&self) -> bool {
        self.kind == ClassKind::Complex
    }
}

/// A single enumeration value.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EnumValue {
    pub value: String,
    #[serde(default)]
    pub documentation: Option<String>,
}

/// How an attribute is declared in the schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    #[default]
    Element,
    Attribute,
    Text,
    Enumeration,
}

/// Upper bound of an attribute's cardinality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawOccurs")]
pub enum MaxOccurs {
    Bounded(u32),
    Unbounded,
}

impl MaxOccurs {
    pub fn is_many(self) -> bool {
        match self {
            MaxOccurs::Bounded(n) => n > 1,
            MaxOccurs::Unbounded => true,
        }
    }
}

impl Default for MaxOccurs {
    fn default() -> Self {
        MaxOccurs::Bounded(1)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawOccurs {
    Number(u32),
    Text(String),
    Null(()),
}

impl TryFrom<RawOccurs> for MaxOccurs {
    type Error = String;

    fn try_from(raw: RawOccurs) -> Result<Self, Self::Error> {
        match raw {
            RawOccurs::Number(n) => Ok(MaxOccurs::Bounded(n)),
            RawOccurs::Null(()) => Ok(MaxOccurs::Unbounded),
            RawOccurs::Text(s) if s == "unbounded" => Ok(MaxOccurs::Unbounded),
            RawOccurs::Text(s) => s
                .parse()
                .map(MaxOccurs::Bounded)
                .map_err(|_| format!("invalid max_occurs: {s}")),
        }
    }
}

/// A reference from an attribute to its type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "RawTypeReference")]
pub enum TypeReference {
    /// A builtin datatype, carried by its XSD code (`string`, `decimal`, ...).
    Datatype(String),
    /// Another schema class, by qualified name.
    Class(String),
}

/// Bundle form of a type reference: a map with exactly one of `datatype`
/// or `class`.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTypeReference {
    #[serde(default)]
    datatype: Option<String>,
    #[serde(default)]
    class: Option<String>,
}

impl TryFrom<RawTypeReference> for TypeReference {
    type Error = String;

    fn try_from(raw: RawTypeReference) -> Result<Self, Self::Error> {
        match (raw.datatype, raw.class) {
            (Some(code), None) => Ok(TypeReference::Datatype(code)),
            (None, Some(qname)) => Ok(TypeReference::Class(qname)),
            (Some(code), Some(qname)) => Err(format!(
                "type reference names both datatype {code} and class {qname}"
            )),
            (None, None) => Err("type reference needs a datatype or a class".to_string()),
        }
    }
}

impl TypeReference {
    pub fn datatype(&self) -> Option<&str> {
        match self {
            TypeReference::Datatype(code) => Some(code),
            TypeReference::Class(_) => None,
        }
    }

    pub fn class_qname(&self) -> Option<&str> {
        match self {
            TypeReference::Class(qname) => Some(qname),
            TypeReference::Datatype(_) => None,
        }
    }
}

fn one() -> u32 {
    1
}

/// An attribute (element, XML attribute or text node) of a schema class.
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaAttribute {
    pub name: String,
    #[serde(default)]
    pub documentation: Option<String>,
    #[serde(default)]
    pub kind: AttributeKind,
    #[serde(default = "one")]
    pub min_occurs: u32,
    #[serde(default)]
    pub max_occurs: MaxOccurs,
    pub types: Vec<TypeReference>,
    /// Whitespace separated token list (`xs:list`).
    #[serde(default)]
    pub tokens: bool,
    /// Wildcard attribute mapped to a dictionary.
    #[serde(default)]
    pub map_like: bool,
}

impl SchemaAttribute {
    pub fn is_list(&self) -> bool {
        self.max_occurs.is_many()
    }

    pub fn is_required(&self) -> bool {
        self.min_occurs > 0 && !self.is_list()
    }

    /// The type used for mapping; unions degrade to their first member.
    pub fn primary_type(&self) -> Option<&TypeReference> {
        self.types.first()
    }
}

/// Strip the `{namespace}` part of a qualified name.
pub fn local_name(qname: &str) -> &str {
    match qname.rfind('}') {
        Some(pos) => &qname[pos + 1..],
        None => qname,
    }
}
