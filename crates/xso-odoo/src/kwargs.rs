//! Python literals and keyword argument lists for field constructors.

use std::fmt;

use indexmap::IndexMap;

/// A Python expression used as a constructor argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PyValue {
    Str(String),
    Bool(bool),
    Int(i64),
    Tuple(Vec<PyValue>),
    /// A bare name, e.g. a selection constant.
    Name(String),
}

impl PyValue {
    pub fn str(value: impl Into<String>) -> Self {
        PyValue::Str(value.into())
    }
}

impl fmt::Display for PyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PyValue::Str(s) => write!(f, "\"{}\"", escape_str(s)),
            PyValue::Bool(true) => f.write_str("True"),
            PyValue::Bool(false) => f.write_str("False"),
            PyValue::Int(n) => write!(f, "{n}"),
            PyValue::Tuple(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
            PyValue::Name(name) => f.write_str(name),
        }
    }
}

/// Escape a string for a double-quoted Python literal.
pub fn escape_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

/// Ordered keyword arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Kwargs(IndexMap<String, PyValue>);

impl Kwargs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, value: PyValue) {
        self.0.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<&PyValue> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Move `key` to the first position.
    pub fn move_to_front(&mut self, key: &str) {
        if let Some(index) = self.0.get_index_of(key) {
            self.0.move_index(index, 0);
        }
    }

    /// Move `key` to the last position.
    pub fn move_to_end(&mut self, key: &str) {
        if let Some(index) = self.0.get_index_of(key) {
            let last = self.0.len() - 1;
            self.0.move_index(index, last);
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Kwargs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}
