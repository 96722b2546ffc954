use crate::config::{FieldNamingStrategy, XsoConfig};

const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

/// Turns attribute names into generated field names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldNaming {
    pub strategy: FieldNamingStrategy,
    pub prefix: String,
}

impl FieldNaming {
    pub fn new(strategy: FieldNamingStrategy, prefix: impl Into<String>) -> Self {
        Self {
            strategy,
            prefix: prefix.into(),
        }
    }

    pub fn from_config(config: &XsoConfig) -> Self {
        Self::new(config.field_naming.strategy, config.field_prefix())
    }

    pub fn field_name(&self, name: &str) -> String {
        match self.strategy {
            FieldNamingStrategy::NoPrefixNoSafeName => name.to_string(),
            FieldNamingStrategy::PrefixSafeName => safe_name(&format!("{}{name}", self.prefix)),
            FieldNamingStrategy::PrefixRawName => format!("{}{name}", self.prefix),
        }
    }

    /// Name of the many-to-one key a one-to-many field `attr_name` declared
    /// on class `owner_name` points back through.
    pub fn inverse_field_name(&self, attr_name: &str, owner_name: &str) -> String {
        self.field_name(&format!("{attr_name}_{owner_name}_id"))
    }
}

/// Make `name` a valid, non-reserved Python identifier.
pub fn safe_name(name: &str) -> String {
    let mut result: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    if result.is_empty() {
        return "value".to_string();
    }
    if result.starts_with(|c: char| c.is_ascii_digit()) {
        result.insert_str(0, "value_");
    }
    if PYTHON_KEYWORDS.contains(&result.as_str()) {
        result.push_str("_value");
    }
    result
}
