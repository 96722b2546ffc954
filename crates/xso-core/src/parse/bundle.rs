use std::path::PathBuf;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::ir::{ClassKind, EnumValue, SchemaAttribute};

/// Class-model bundle produced by the external XSD parser and module grouper.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClassBundle {
    pub classes: Vec<BundleClass>,

    /// Output module path → ordered top-level class qualified names.
    #[serde(default)]
    pub modules: IndexMap<String, Vec<String>>,

    /// Package path → ordered top-level class qualified names.
    #[serde(default)]
    pub packages: IndexMap<String, Vec<String>>,
}

/// A class as it appears in the bundle, with inner classes nested inline.
#[derive(Debug, Clone, Deserialize)]
pub struct BundleClass {
    pub qname: String,

    pub name: String,

    #[serde(default)]
    pub kind: ClassKind,

    #[serde(default)]
    pub location: Option<PathBuf>,

    #[serde(default)]
    pub documentation: Option<String>,

    #[serde(default)]
    pub attributes: Vec<SchemaAttribute>,

    #[serde(default)]
    pub values: Vec<EnumValue>,

    #[serde(default)]
    pub inner: Vec<BundleClass>,
}
